//! Notification records produced by a pilot run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConnectionError, HealthSnapshot};

/// Notification severity, used by sinks to pick a channel or log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSeverity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for NotificationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationSeverity::Info => write!(f, "INFO"),
            NotificationSeverity::Warning => write!(f, "WARNING"),
            NotificationSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Why a notification was raised. One variant per terminal decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Environment or development mode prevents connecting at all
    EnvironmentBlocked,
    /// Connected to an account that is not authorized
    UnauthorizedAccount,
    /// Disconnected and the site URL differs from the last healthy one
    DomainChanged,
    /// Disconnected, never checked, and on a placeholder domain
    NewSite,
    /// Disconnected, never checked, and a freshly registered tenant
    NewTenant,
    /// Disconnected with nothing else to go on
    Disconnected,
    /// Automatic reconnect succeeded
    Reconnected,
    /// Automatic reconnect succeeded but landed on a different account
    ReconnectedAccountChanged,
    /// Automatic reconnect failed
    ReconnectFailed,
}

impl NotificationKind {
    /// Human-readable summary line
    pub fn message(self) -> &'static str {
        match self {
            Self::EnvironmentBlocked => {
                "Connection cannot currently be established on this site due to the environment. \
                 The service may be in development mode."
            }
            Self::UnauthorizedAccount => "Connection is bound to a non-authorized account.",
            Self::DomainChanged => "Connection is down, and it appears the site domain has changed.",
            Self::NewSite => "Connection is down, though it appears this is a new site.",
            Self::NewTenant => {
                "Connection is down, though it appears this is a new site on a multi-tenant network."
            }
            Self::Disconnected => "Connection is down.",
            Self::Reconnected => "Connection was successfully (re)established!",
            Self::ReconnectedAccountChanged => {
                "Alert: connection was automatically re-established, but the backing account \
                 may have changed. Needs manual inspection."
            }
            Self::ReconnectFailed => "Connection (re)establishment attempt failed.",
        }
    }

    pub fn severity(self) -> NotificationSeverity {
        match self {
            Self::Reconnected => NotificationSeverity::Info,
            Self::ReconnectedAccountChanged => NotificationSeverity::Critical,
            _ => NotificationSeverity::Warning,
        }
    }
}

/// A structured notification for a human or downstream alerting pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub severity: NotificationSeverity,
    /// Summary line, derived from `kind`
    pub message: String,
    /// The probe or reconnect error behind this notification, if any
    pub error: Option<ConnectionError>,
    /// Last known-good snapshot at the start of the run
    pub snapshot_context: Option<HealthSnapshot>,
    /// Site URL observed during the run
    pub site_url: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, site_url: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: kind.message().to_string(),
            error: None,
            snapshot_context: None,
            site_url: site_url.into(),
            created_at,
        }
    }

    pub fn with_error(mut self, error: ConnectionError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_snapshot(mut self, snapshot: Option<HealthSnapshot>) -> Self {
        self.snapshot_context = snapshot;
        self
    }

    /// Multi-line plain-text rendering for chat/email style transports
    pub fn render(&self) -> String {
        let mut out = format!("[{}] {}\nSite: {}", self.severity, self.message, self.site_url);

        if let Some(err) = &self.error {
            out.push_str(&format!("\nError: {err}"));
        }

        match &self.snapshot_context {
            Some(snapshot) => out.push_str(&format!(
                "\nLast healthy: {} (account {}) at {}",
                snapshot.site_url,
                snapshot.backing_account_id,
                snapshot.last_checked_at.to_rfc3339()
            )),
            None => out.push_str("\nLast healthy: never"),
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConnectionErrorKind;

    #[test]
    fn test_severity_follows_kind() {
        assert_eq!(NotificationKind::Reconnected.severity(), NotificationSeverity::Info);
        assert_eq!(
            NotificationKind::ReconnectedAccountChanged.severity(),
            NotificationSeverity::Critical
        );
        assert_eq!(NotificationKind::DomainChanged.severity(), NotificationSeverity::Warning);
    }

    #[test]
    fn test_render_includes_error_and_context() {
        let now = Utc::now();
        let snapshot = HealthSnapshot::new("https://a.example.com", 10, now);
        let n = Notification::new(NotificationKind::ReconnectFailed, "https://a.example.com", now)
            .with_error(ConnectionError::new(ConnectionErrorKind::ReconnectFailed, "timeout"))
            .with_snapshot(Some(snapshot));

        let text = n.render();
        assert!(text.starts_with("[WARNING] Connection (re)establishment attempt failed."));
        assert!(text.contains("Error: reconnect-failed: timeout"));
        assert!(text.contains("(account 10)"));
    }

    #[test]
    fn test_render_without_snapshot() {
        let n = Notification::new(NotificationKind::Disconnected, "https://b.example.com", Utc::now());
        assert!(n.render().ends_with("Last healthy: never"));
    }
}
