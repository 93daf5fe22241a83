//! Connection Pilot: self-healing health monitor for a mandatory service connection
//!
//! On each scheduled run the pilot probes the connection. Success is recorded
//! as the last-known-good snapshot; failure is classified and either healed
//! with an automatic reconnect or reported through structured notifications.
//!
//! ## Architecture
//!
//! - **Health State Store** (`storage`): persisted last-known-good snapshot
//! - **Site Identity Classifier** (`site`): placeholder domain / new tenant heuristics
//! - **Connection Prober** (`probe`): adapter over the connection subsystem
//! - **Notification Accumulator** (`notify`): per-run notifications and delivery sinks
//! - **Status Evaluator** (`pilot`): the decision procedure and scheduled runner

pub mod config;
pub mod host;
pub mod notify;
pub mod pilot;
pub mod probe;
pub mod site;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, PilotConfig};

// Re-export commonly used types
pub use types::{
    CheckResult, ConnectionError, ConnectionErrorKind, HealthSnapshot, LiveConnection,
    Notification, NotificationKind, NotificationSeverity, TenantMetadata,
};

// Re-export pilot components
pub use pilot::{
    decide, evaluate, ConnectionPilot, Decision, Evaluation, EvaluationPolicy, PilotError,
    PilotStatus, RunContext, RunReport,
};

// Re-export collaborators
pub use host::{HostEnvironment, StaticHost};
pub use notify::{LogSink, NotificationAccumulator, NotificationSink, WebhookSink};
pub use probe::{ConnectionProber, HttpConnectionProber, ReconnectOptions};
pub use storage::{
    HealthStateStore, InMemoryOptionStore, OptionStore, SledOptionStore, StorageError,
};
