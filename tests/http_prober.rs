//! HTTP Prober Integration Tests
//!
//! Stands up a local control endpoint with Axum on an ephemeral port and
//! drives `HttpConnectionProber` against it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use connection_pilot::{ConnectionErrorKind, ConnectionProber, HttpConnectionProber, ReconnectOptions};

/// Canned responses and captured requests for the fake endpoint
#[derive(Clone)]
struct Endpoint {
    status_body: Value,
    status_code: StatusCode,
    reconnect_body: Value,
    reconnect_requests: Arc<Mutex<Vec<Value>>>,
    auth_headers: Arc<Mutex<Vec<String>>>,
}

impl Endpoint {
    fn new(status_body: Value, reconnect_body: Value) -> Self {
        Self {
            status_body,
            status_code: StatusCode::OK,
            reconnect_body,
            reconnect_requests: Arc::new(Mutex::new(Vec::new())),
            auth_headers: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

async fn status(State(endpoint): State<Endpoint>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        endpoint.auth_headers.lock().unwrap().push(auth.to_string());
    }
    (endpoint.status_code, Json(endpoint.status_body.clone()))
}

async fn reconnect(State(endpoint): State<Endpoint>, Json(body): Json<Value>) -> Json<Value> {
    endpoint.reconnect_requests.lock().unwrap().push(body);
    Json(endpoint.reconnect_body.clone())
}

/// Serve `endpoint` on 127.0.0.1 and return its base URL
async fn serve(endpoint: Endpoint) -> String {
    let app = Router::new()
        .route("/connection/status", get(status))
        .route("/connection/reconnect", post(reconnect))
        .with_state(endpoint);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn prober(base_url: &str, token: Option<&str>) -> HttpConnectionProber {
    HttpConnectionProber::new(base_url, token.map(str::to_string), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn connected_status_reports_account() {
    let endpoint = Endpoint::new(json!({ "connected": true, "account_id": 1234 }), json!({}));
    let auth = endpoint.auth_headers.clone();
    let base = serve(endpoint).await;

    let live = prober(&base, Some("secret")).check_connection().await.unwrap();

    assert_eq!(live.backing_account_id, 1234);
    assert_eq!(auth.lock().unwrap().as_slice(), ["Bearer secret".to_string()]);
}

#[tokio::test]
async fn error_codes_are_classified() {
    let endpoint = Endpoint::new(
        json!({
            "connected": false,
            "error": { "code": "jp-cxn-pilot-not-vip-owned", "message": "owned by someone else", "data": { "owner": 5 } }
        }),
        json!({}),
    );
    let base = serve(endpoint).await;

    let err = prober(&base, None).check_connection().await.unwrap_err();

    assert_eq!(err.kind, ConnectionErrorKind::WrongAccount);
    assert_eq!(err.message, "owned by someone else");
    assert_eq!(err.detail["data"]["owner"], 5);
}

#[tokio::test]
async fn server_error_is_generic_disconnect() {
    let mut endpoint = Endpoint::new(json!({ "connected": true }), json!({}));
    endpoint.status_code = StatusCode::INTERNAL_SERVER_ERROR;
    let base = serve(endpoint).await;

    let err = prober(&base, None).check_connection().await.unwrap_err();

    assert_eq!(err.kind, ConnectionErrorKind::GenericDisconnect);
    assert!(err.message.contains("500"));
}

#[tokio::test]
async fn unreachable_endpoint_is_generic_disconnect() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = prober(&format!("http://{addr}"), None)
        .check_connection()
        .await
        .unwrap_err();

    assert_eq!(err.kind, ConnectionErrorKind::GenericDisconnect);
}

#[tokio::test]
async fn reconnect_sends_skip_flag_and_reports_account() {
    let endpoint = Endpoint::new(json!({}), json!({ "connected": true, "account_id": 99 }));
    let requests = endpoint.reconnect_requests.clone();
    let base = serve(endpoint).await;

    let live = prober(&base, None)
        .reconnect(ReconnectOptions {
            skip_connection_tests: true,
        })
        .await
        .unwrap();

    assert_eq!(live.backing_account_id, 99);
    assert_eq!(
        requests.lock().unwrap().as_slice(),
        [json!({ "skip_connection_tests": true })]
    );
}

#[tokio::test]
async fn failed_reconnect_without_reason_is_reconnect_failed() {
    let endpoint = Endpoint::new(json!({}), json!({ "connected": false }));
    let base = serve(endpoint).await;

    let err = prober(&base, None)
        .reconnect(ReconnectOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ConnectionErrorKind::ReconnectFailed);
}
