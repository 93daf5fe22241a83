//! HTTP Prober: talks to the connection subsystem's control endpoint
//!
//! - `GET  {base}/connection/status`
//! - `POST {base}/connection/reconnect` with `{"skip_connection_tests": bool}`
//!
//! Both return `{"connected": bool, "account_id": u64?, "error": {...}?}`.
//! Transport failures, non-2xx statuses and undecodable bodies are folded
//! into the error taxonomy rather than surfaced as faults.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ConnectionProber, ReconnectOptions};
use crate::types::{CheckResult, ConnectionError, ConnectionErrorKind, LiveConnection};

/// Control endpoint transport errors
#[derive(Debug, thiserror::Error)]
enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {0}")]
    ServerError(reqwest::StatusCode),
}

/// Error object in a status/reconnect response
#[derive(Debug, Deserialize)]
struct WireError {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

/// Status/reconnect response body
#[derive(Debug, Deserialize)]
struct StatusResponse {
    connected: bool,
    #[serde(default)]
    account_id: Option<u64>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Debug, Serialize)]
struct ReconnectRequest {
    skip_connection_tests: bool,
}

/// HTTP client for the connection control endpoint
#[derive(Clone)]
pub struct HttpConnectionProber {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpConnectionProber {
    /// Create a new prober against `base_url`
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    /// Get base URL for logging
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<StatusResponse, TransportError> {
        let resp = self.authorize(req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::ServerError(status));
        }

        Ok(resp.json::<StatusResponse>().await?)
    }
}

/// Interpret a decoded response. `fallback` is used when the subsystem says
/// "not connected" without giving a reason.
fn interpret(response: StatusResponse, fallback: ConnectionErrorKind) -> Result<LiveConnection, ConnectionError> {
    if response.connected {
        return Ok(LiveConnection::new(response.account_id.unwrap_or(0)));
    }

    match response.error {
        Some(wire) => {
            let message = wire.message.unwrap_or_else(|| wire.code.clone());
            Err(ConnectionError::from_code(&wire.code, message).with_detail(serde_json::json!({
                "code": wire.code,
                "data": wire.data,
            })))
        }
        None => Err(ConnectionError::new(fallback, "connection subsystem reported not connected")),
    }
}

fn transport_failure(kind: ConnectionErrorKind, err: &TransportError) -> ConnectionError {
    ConnectionError::new(kind, err.to_string())
}

#[async_trait]
impl ConnectionProber for HttpConnectionProber {
    async fn check_connection(&self) -> CheckResult {
        let url = format!("{}/connection/status", self.base_url);
        debug!(%url, "Probing connection");

        match self.send(self.http.get(url)).await {
            Ok(response) => interpret(response, ConnectionErrorKind::GenericDisconnect),
            Err(e) => Err(transport_failure(ConnectionErrorKind::GenericDisconnect, &e)),
        }
    }

    async fn reconnect(&self, options: ReconnectOptions) -> Result<LiveConnection, ConnectionError> {
        let url = format!("{}/connection/reconnect", self.base_url);
        debug!(%url, skip_tests = options.skip_connection_tests, "Requesting reconnect");

        let body = ReconnectRequest {
            skip_connection_tests: options.skip_connection_tests,
        };

        match self.send(self.http.post(url).json(&body)).await {
            Ok(response) => interpret(response, ConnectionErrorKind::ReconnectFailed),
            Err(e) => Err(transport_failure(ConnectionErrorKind::ReconnectFailed, &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> StatusResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_connected_response() {
        let live = interpret(
            response(r#"{"connected": true, "account_id": 42}"#),
            ConnectionErrorKind::GenericDisconnect,
        )
        .unwrap();
        assert_eq!(live.backing_account_id, 42);
    }

    #[test]
    fn test_connected_without_account_id() {
        let live = interpret(response(r#"{"connected": true}"#), ConnectionErrorKind::GenericDisconnect).unwrap();
        assert_eq!(live.backing_account_id, 0);
    }

    #[test]
    fn test_error_code_is_mapped() {
        let err = interpret(
            response(r#"{"connected": false, "error": {"code": "jp-cxn-pilot-development-mode", "message": "offline"}}"#),
            ConnectionErrorKind::GenericDisconnect,
        )
        .unwrap_err();
        assert_eq!(err.kind, ConnectionErrorKind::DevelopmentMode);
        assert_eq!(err.message, "offline");
        assert_eq!(err.detail["code"], "jp-cxn-pilot-development-mode");
    }

    #[test]
    fn test_unknown_code_is_generic_disconnect() {
        let err = interpret(
            response(r#"{"connected": false, "error": {"code": "token-revoked"}}"#),
            ConnectionErrorKind::ReconnectFailed,
        )
        .unwrap_err();
        assert_eq!(err.kind, ConnectionErrorKind::GenericDisconnect);
        assert_eq!(err.message, "token-revoked");
    }

    #[test]
    fn test_missing_error_uses_fallback() {
        let err = interpret(response(r#"{"connected": false}"#), ConnectionErrorKind::ReconnectFailed).unwrap_err();
        assert_eq!(err.kind, ConnectionErrorKind::ReconnectFailed);
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let prober = HttpConnectionProber::new("http://localhost:9000/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(prober.base_url(), "http://localhost:9000");
    }
}
