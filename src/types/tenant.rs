//! Tenant metadata supplied by the host installation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registration info for the current site within its installation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMetadata {
    /// Whether the host runs several tenants (sites) in one installation
    pub is_multi_tenant_install: bool,
    /// When the current tenant was registered, if the host knows
    pub registered_at: Option<DateTime<Utc>>,
}

impl TenantMetadata {
    /// Metadata for a standalone (single-tenant) installation
    pub fn single_tenant() -> Self {
        Self::default()
    }

    pub fn multi_tenant(registered_at: Option<DateTime<Utc>>) -> Self {
        Self {
            is_multi_tenant_install: true,
            registered_at,
        }
    }
}
