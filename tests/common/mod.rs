//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// A request the stub backend received.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Value,
    pub authorization: Option<String>,
}

pub type Log = Arc<Mutex<Vec<Seen>>>;

pub type Reply = fn(&Seen) -> (StatusCode, String);

#[derive(Clone)]
struct Stub {
    log: Log,
    reply: Reply,
}

async fn handle(
    State(stub): State<Stub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let seen = Seen {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    stub.log.lock().push(seen.clone());
    let (status, text) = (stub.reply)(&seen);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        text,
    )
        .into_response()
}

/// Start a backend on an ephemeral loopback port that answers every request
/// with `reply` and records it.
pub async fn spawn_backend(reply: Reply) -> (SocketAddr, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(handle).with_state(Stub {
        log: log.clone(),
        reply,
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, log)
}

/// Reply with a JSON description of the request.
pub fn echo(seen: &Seen) -> (StatusCode, String) {
    let body = json!({
        "method": seen.method.as_str(),
        "path": seen.path,
        "query": seen.query,
        "body": seen.body,
        "authorization": seen.authorization,
    });
    (StatusCode::OK, body.to_string())
}
