//! Connection probe results: LiveConnection, ConnectionError, ConnectionErrorKind

use serde::{Deserialize, Serialize};

/// Closed taxonomy of connection failures.
///
/// Every failure reported by the connection subsystem is coerced into one of
/// these variants; unknown codes become `GenericDisconnect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionErrorKind {
    /// Environment lacks what the connection needs (credentials, constants)
    MissingPrerequisites,
    /// The service is running in development/offline mode
    DevelopmentMode,
    /// Connected, but to an account that is not authorized
    WrongAccount,
    /// Not connected, for no more specific reason
    GenericDisconnect,
    /// A reconnect attempt did not succeed
    ReconnectFailed,
}

impl ConnectionErrorKind {
    /// Map a wire error code onto the taxonomy.
    ///
    /// Accepts the short codes as well as the legacy `jp-cxn-pilot-*` codes.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_ascii_lowercase();
        let code = code.strip_prefix("jp-cxn-pilot-").unwrap_or(&code);

        match code {
            "missing-prerequisites" | "missing-constants" => Self::MissingPrerequisites,
            "development-mode" => Self::DevelopmentMode,
            "wrong-account" | "not-vip-owned" => Self::WrongAccount,
            "reconnect-failed" => Self::ReconnectFailed,
            _ => Self::GenericDisconnect,
        }
    }

    /// Failures that no amount of reconnecting will fix
    pub fn is_environmental(self) -> bool {
        matches!(self, Self::MissingPrerequisites | Self::DevelopmentMode)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingPrerequisites => "missing-prerequisites",
            Self::DevelopmentMode => "development-mode",
            Self::WrongAccount => "wrong-account",
            Self::GenericDisconnect => "generic-disconnect",
            Self::ReconnectFailed => "reconnect-failed",
        }
    }
}

impl std::fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed probe or reconnect attempt.
///
/// `detail` is carried through to notifications untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    /// Human-readable diagnostic from the connection subsystem
    pub message: String,
    /// Opaque diagnostic payload
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ConnectionError {
    pub fn new(kind: ConnectionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: serde_json::Value::Null,
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }

    /// Build from a raw subsystem error code, coercing unknown codes
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        Self::new(ConnectionErrorKind::from_code(code), message)
    }
}

/// What the connection subsystem reports when a probe or reconnect succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveConnection {
    /// Account the connection is currently bound to (0 = unknown)
    pub backing_account_id: u64,
}

impl LiveConnection {
    pub fn new(backing_account_id: u64) -> Self {
        Self { backing_account_id }
    }
}

/// Outcome of a single connection probe
pub type CheckResult = Result<LiveConnection, ConnectionError>;
