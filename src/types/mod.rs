//! Shared data structures for the connection pilot
//!
//! - `HealthSnapshot`: last confirmed successful probe (persisted)
//! - `ConnectionError` / `ConnectionErrorKind`: closed failure taxonomy
//! - `LiveConnection`: what a successful probe or reconnect reports
//! - `Notification`: output record handed to delivery sinks
//! - `TenantMetadata`: host-provided multi-tenant registration info

mod connection;
mod notification;
mod snapshot;
mod tenant;

pub use connection::*;
pub use notification::*;
pub use snapshot::*;
pub use tenant::*;
