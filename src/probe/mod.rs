//! Connection Prober: adapter over the external connection subsystem
//!
//! The pilot never talks to the connection subsystem directly; it goes
//! through `ConnectionProber`, which reports either a `LiveConnection` or a
//! `ConnectionError` already mapped onto the closed taxonomy.

pub mod http;

use async_trait::async_trait;

use crate::types::{CheckResult, ConnectionError, LiveConnection};

pub use http::HttpConnectionProber;

/// Options passed to a reconnect attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconnectOptions {
    /// Skip the subsystem's own connection tests (the pilot already probed)
    pub skip_connection_tests: bool,
}

/// Trait for the external connection subsystem
///
/// Each call is a single network-bound operation with no retry loop;
/// retries happen on the next scheduled run.
#[async_trait]
pub trait ConnectionProber: Send + Sync {
    /// Check whether the connection is alive
    async fn check_connection(&self) -> CheckResult;

    /// Re-establish the connection
    async fn reconnect(&self, options: ReconnectOptions) -> Result<LiveConnection, ConnectionError>;
}
