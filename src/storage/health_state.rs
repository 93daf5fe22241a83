//! Health State Store: the persisted last-known-good snapshot
//!
//! One option entry, keyed by `HEALTHCHECK_OPTION_NAME`, holding a
//! JSON-serialized `HealthSnapshot`. Written only after a successful probe;
//! never deleted by the pilot.

use std::sync::Arc;

use tracing::warn;

use super::options::{OptionStore, StorageError};
use crate::types::HealthSnapshot;

/// Option name used for keeping track of successful connection checks
pub const HEALTHCHECK_OPTION_NAME: &str = "connection_pilot_healthcheck";

/// Typed access to the health-check option
#[derive(Clone)]
pub struct HealthStateStore {
    options: Arc<dyn OptionStore>,
}

impl HealthStateStore {
    pub fn new(options: Arc<dyn OptionStore>) -> Self {
        Self { options }
    }

    /// Read the last-known-good snapshot.
    ///
    /// Entries that are not valid JSON, no longer match the snapshot shape,
    /// or carry an empty `site_url` read as absent. Backend failures propagate.
    pub fn get(&self) -> Result<Option<HealthSnapshot>, StorageError> {
        let value = match self.options.get_option(HEALTHCHECK_OPTION_NAME) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(None),
            Err(StorageError::Serialization(e)) => {
                warn!(error = %e, "Stored health snapshot is not valid JSON, ignoring it");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_value::<HealthSnapshot>(value) {
            Ok(snapshot) if snapshot.site_url.is_empty() => {
                warn!("Stored health snapshot has an empty site_url, ignoring it");
                Ok(None)
            }
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(error = %e, "Stored health snapshot is malformed, ignoring it");
                Ok(None)
            }
        }
    }

    /// Replace the snapshot. The write is a single atomic option update.
    pub fn put(&self, snapshot: &HealthSnapshot) -> Result<(), StorageError> {
        let value = serde_json::to_value(snapshot)?;
        let changed = self
            .options
            .set_option(HEALTHCHECK_OPTION_NAME, &value, false)?;

        tracing::debug!(
            site = %snapshot.site_url,
            account = snapshot.backing_account_id,
            changed,
            backend = self.options.backend_name(),
            "Health snapshot stored"
        );

        Ok(())
    }
}
