//! Host collaborator contracts
//!
//! The pilot runs embedded in a larger host application and reads the site
//! identity from it through `HostEnvironment`.

use chrono::{DateTime, Utc};

use crate::types::TenantMetadata;

/// Site identity as seen by the host application
pub trait HostEnvironment: Send + Sync {
    /// Canonical URL of the current site
    fn site_url(&self) -> String;

    /// Multi-tenant registration info for the current site
    fn tenant_metadata(&self) -> TenantMetadata;
}

/// Host whose identity is fixed at startup (from configuration)
#[derive(Debug, Clone)]
pub struct StaticHost {
    site_url: String,
    tenant: TenantMetadata,
}

impl StaticHost {
    pub fn new(site_url: impl Into<String>, tenant: TenantMetadata) -> Self {
        Self {
            site_url: site_url.into(),
            tenant,
        }
    }

    pub fn single_tenant(site_url: impl Into<String>) -> Self {
        Self::new(site_url, TenantMetadata::single_tenant())
    }

    pub fn multi_tenant(site_url: impl Into<String>, registered_at: Option<DateTime<Utc>>) -> Self {
        Self::new(site_url, TenantMetadata::multi_tenant(registered_at))
    }
}

impl HostEnvironment for StaticHost {
    fn site_url(&self) -> String {
        self.site_url.clone()
    }

    fn tenant_metadata(&self) -> TenantMetadata {
        self.tenant.clone()
    }
}
