//! Notification sinks: delivery transports for pilot notifications
//!
//! - `LogSink`: writes each notification through `tracing`
//! - `WebhookSink`: POSTs each notification as JSON to an alerting endpoint

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::types::{Notification, NotificationSeverity};

/// Delivery errors
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Webhook returned status {0}")]
    ServerError(reqwest::StatusCode),
}

/// Trait for notification delivery transports
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Name of the sink, for logging
    fn name(&self) -> &str;

    /// Deliver a single notification
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Logs notifications at a level matching their severity
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        let error_kind = notification.error.as_ref().map(|e| e.kind.as_str());

        match notification.severity {
            NotificationSeverity::Info => info!(
                site = %notification.site_url,
                kind = ?notification.kind,
                "{}",
                notification.message
            ),
            NotificationSeverity::Warning => warn!(
                site = %notification.site_url,
                kind = ?notification.kind,
                error = ?error_kind,
                "{}",
                notification.message
            ),
            NotificationSeverity::Critical => error!(
                site = %notification.site_url,
                kind = ?notification.kind,
                error = ?error_kind,
                "{}",
                notification.message
            ),
        }

        Ok(())
    }
}

/// POSTs notifications to a webhook as JSON
///
/// Body: the serialized `Notification` plus a pre-rendered `text` field for
/// chat-style receivers.
#[derive(Clone)]
pub struct WebhookSink {
    http: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        let body = serde_json::json!({
            "text": notification.render(),
            "notification": notification,
        });

        let resp = self.http.post(&self.url).json(&body).send().await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(SinkError::ServerError(resp.status()))
        }
    }
}
