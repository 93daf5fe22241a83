//! HealthSnapshot: the last-known-good connection state

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Record of the last confirmed successful connection probe.
///
/// Only ever written after a probe succeeds. The absence of a snapshot means
/// "never successfully checked", which is not the same as an empty one.
///
/// Persisted shape:
/// `{"site_url": "https://example.go-vip.co", "backing_account_id": 1234, "last_checked_at": 1555124370}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Canonical site URL at the time of the successful probe
    pub site_url: String,
    /// External account the connection was bound to (0 = none recorded)
    pub backing_account_id: u64,
    /// When the probe succeeded (stored as Unix seconds)
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_checked_at: DateTime<Utc>,
}

impl HealthSnapshot {
    /// Build a snapshot. `last_checked_at` is truncated to whole seconds,
    /// the precision it is persisted with.
    pub fn new(site_url: impl Into<String>, backing_account_id: u64, last_checked_at: DateTime<Utc>) -> Self {
        Self {
            site_url: site_url.into(),
            backing_account_id,
            last_checked_at: last_checked_at.trunc_subsecs(0),
        }
    }

    /// Whether a backing account was recorded with this snapshot
    pub fn has_backing_account(&self) -> bool {
        self.backing_account_id != 0
    }
}
