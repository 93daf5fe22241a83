//! Status Evaluator: decides what one pilot run does
//!
//! `decide()` is a pure decision table over the probe result, the prior
//! snapshot and the site identity. `evaluate()` acts on the decision: it
//! returns the store write and notifications as data and performs the only
//! side effect (a reconnect) through the injected `ConnectionProber`.
//!
//! Priority order:
//! 1. Probe succeeded → record a new snapshot
//! 2. Environment/development-mode failure → notify
//! 3. Wrong account → notify
//! 4. Prior snapshot, same URL → reconnect; different URL → notify
//! 5. No prior snapshot → placeholder domain / new tenant / plain disconnect

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::notify::NotificationAccumulator;
use crate::probe::{ConnectionProber, ReconnectOptions};
use crate::site::{
    is_placeholder_domain, is_recently_provisioned_tenant, DEFAULT_NEW_TENANT_GRACE,
    DEFAULT_PLACEHOLDER_SUFFIXES,
};
use crate::types::{
    CheckResult, ConnectionErrorKind, HealthSnapshot, Notification, NotificationKind,
    TenantMetadata,
};

/// Tunables for the site identity heuristics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationPolicy {
    /// Host suffixes of provisional placeholder domains
    pub placeholder_suffixes: Vec<String>,
    /// How long after registration a tenant counts as new
    pub new_tenant_grace: Duration,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            placeholder_suffixes: DEFAULT_PLACEHOLDER_SUFFIXES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            new_tenant_grace: DEFAULT_NEW_TENANT_GRACE,
        }
    }
}

/// Explicit inputs to one evaluation
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    /// Site URL as reported by the host right now
    pub site_url: &'a str,
    /// Last-known-good snapshot, `None` if never checked successfully
    pub prior: Option<&'a HealthSnapshot>,
    pub tenant: &'a TenantMetadata,
    pub now: DateTime<Utc>,
    pub policy: &'a EvaluationPolicy,
}

/// Which branch of the decision table a run took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Probe succeeded; snapshot updated
    Healthy,
    /// Missing prerequisites or development mode; nothing to retry
    EnvironmentBlocked,
    /// Connected to a non-authorized account
    UnauthorizedAccount,
    /// Same site as the last healthy probe; attempt reconnect
    Reconnect,
    /// Site URL changed since the last healthy probe
    DomainChanged,
    /// Never checked and on a placeholder domain
    NewSite,
    /// Never checked and a freshly registered tenant
    NewTenant,
    /// Never checked, no explanation
    Disconnected,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Decision::Healthy => "healthy",
            Decision::EnvironmentBlocked => "environment-blocked",
            Decision::UnauthorizedAccount => "unauthorized-account",
            Decision::Reconnect => "reconnect",
            Decision::DomainChanged => "domain-changed",
            Decision::NewSite => "new-site",
            Decision::NewTenant => "new-tenant",
            Decision::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Result of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    /// Snapshot to persist; only ever set for `Decision::Healthy`
    pub store_write: Option<HealthSnapshot>,
    /// Notifications in emission order
    pub notifications: Vec<Notification>,
}

/// Pick the branch for this run. Pure.
pub fn decide(ctx: &RunContext<'_>, check: &CheckResult) -> Decision {
    let error = match check {
        Ok(_) => return Decision::Healthy,
        Err(error) => error,
    };

    match error.kind {
        kind if kind.is_environmental() => return Decision::EnvironmentBlocked,
        ConnectionErrorKind::WrongAccount => return Decision::UnauthorizedAccount,
        _ => {}
    }

    if let Some(prior) = ctx.prior {
        return if prior.site_url == ctx.site_url {
            Decision::Reconnect
        } else {
            Decision::DomainChanged
        };
    }

    if is_placeholder_domain(ctx.site_url, ctx.policy.placeholder_suffixes.as_slice()) {
        Decision::NewSite
    } else if is_recently_provisioned_tenant(ctx.tenant, ctx.now, ctx.policy.new_tenant_grace) {
        Decision::NewTenant
    } else {
        Decision::Disconnected
    }
}

/// Run the decision table and act on it.
///
/// Never writes the store itself: a successful reconnect is only recorded
/// once a later probe confirms it.
pub async fn evaluate(
    ctx: &RunContext<'_>,
    check: CheckResult,
    prober: &dyn ConnectionProber,
) -> Evaluation {
    let decision = decide(ctx, &check);
    let mut acc = NotificationAccumulator::new();
    let mut store_write = None;

    debug!(site = %ctx.site_url, decision = %decision, "Connection status evaluated");

    match (decision, check) {
        (Decision::Healthy, Ok(live)) => {
            store_write = Some(HealthSnapshot::new(
                ctx.site_url,
                live.backing_account_id,
                ctx.now,
            ));
        }
        (Decision::EnvironmentBlocked, Err(error)) => {
            acc.push(notification(ctx, NotificationKind::EnvironmentBlocked).with_error(error));
        }
        (Decision::UnauthorizedAccount, Err(error)) => {
            acc.push(notification(ctx, NotificationKind::UnauthorizedAccount).with_error(error));
        }
        (Decision::Reconnect, _) => reconnect(ctx, prober, &mut acc).await,
        (Decision::DomainChanged, _) => acc.push(notification(ctx, NotificationKind::DomainChanged)),
        (Decision::NewSite, _) => acc.push(notification(ctx, NotificationKind::NewSite)),
        (Decision::NewTenant, _) => acc.push(notification(ctx, NotificationKind::NewTenant)),
        (Decision::Disconnected, _) => acc.push(notification(ctx, NotificationKind::Disconnected)),
        // decide() only yields Healthy for Ok and the error branches for Err
        (Decision::Healthy, Err(_))
        | (Decision::EnvironmentBlocked | Decision::UnauthorizedAccount, Ok(_)) => {}
    }

    Evaluation {
        decision,
        store_write,
        notifications: acc.into_vec(),
    }
}

/// Reconnect sub-procedure. Emits exactly one notification.
async fn reconnect(
    ctx: &RunContext<'_>,
    prober: &dyn ConnectionProber,
    acc: &mut NotificationAccumulator,
) {
    let options = ReconnectOptions {
        skip_connection_tests: true,
    };

    match prober.reconnect(options).await {
        Ok(live) => {
            let account_changed = ctx.prior.is_some_and(|prior| {
                prior.has_backing_account() && prior.backing_account_id != live.backing_account_id
            });

            if account_changed {
                warn!(
                    site = %ctx.site_url,
                    account = live.backing_account_id,
                    previous_account = ctx.prior.map(|p| p.backing_account_id),
                    "Reconnected to a different backing account"
                );
                acc.push(notification(ctx, NotificationKind::ReconnectedAccountChanged));
            } else {
                info!(site = %ctx.site_url, account = live.backing_account_id, "Reconnected");
                acc.push(notification(ctx, NotificationKind::Reconnected));
            }
        }
        Err(error) => {
            warn!(site = %ctx.site_url, error = %error, "Reconnect attempt failed");
            acc.push(notification(ctx, NotificationKind::ReconnectFailed).with_error(error));
        }
    }
}

fn notification(ctx: &RunContext<'_>, kind: NotificationKind) -> Notification {
    Notification::new(kind, ctx.site_url, ctx.now).with_snapshot(ctx.prior.cloned())
}
