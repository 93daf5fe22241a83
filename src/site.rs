//! Site Identity Classifier
//!
//! Pure predicates that explain a disconnect on a site that has never passed
//! a health check: either it still runs on a provisional placeholder domain,
//! or it is a tenant that was registered moments ago.

use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::types::TenantMetadata;

/// Staging-domain suffixes assigned before a custom domain is configured
pub const DEFAULT_PLACEHOLDER_SUFFIXES: &[&str] = &[".go-vip.co", ".go-vip.net"];

/// Default age under which a tenant counts as newly provisioned.
///
/// Must comfortably exceed one scheduling interval (hourly by default).
pub const DEFAULT_NEW_TENANT_GRACE: Duration = Duration::hours(2);

/// Check if `site_url` is on a placeholder domain.
///
/// Compares the URL's host against `suffixes`, case-insensitively. URLs that
/// do not parse or have no host are never placeholders.
pub fn is_placeholder_domain<S: AsRef<str>>(site_url: &str, suffixes: &[S]) -> bool {
    let Some(host) = Url::parse(site_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
    else {
        return false;
    };

    suffixes
        .iter()
        .any(|suffix| host.ends_with(&suffix.as_ref().to_ascii_lowercase()))
}

/// Check if the current site is a tenant of a multi-tenant install that was
/// registered within `grace` of `now`.
///
/// Registration times in the future count as recent.
pub fn is_recently_provisioned_tenant(
    tenant: &TenantMetadata,
    now: DateTime<Utc>,
    grace: Duration,
) -> bool {
    if !tenant.is_multi_tenant_install {
        return false;
    }

    match tenant.registered_at {
        Some(registered_at) => now - registered_at <= grace,
        None => false,
    }
}
