//! Persistent storage for the connection pilot
//!
//! The host's key-value option table is abstracted behind `OptionStore`:
//! - `SledOptionStore`: durable store on a local sled database
//! - `InMemoryOptionStore`: for tests and minimal deployments
//!
//! `HealthStateStore` sits on top and owns the single health-check entry.

pub mod health_state;
pub mod options;

pub use health_state::{HealthStateStore, HEALTHCHECK_OPTION_NAME};
pub use options::{InMemoryOptionStore, OptionStore, SledOptionStore, StorageError};
