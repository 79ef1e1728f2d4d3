//! Local forwarding proxy
//!
//! Serves `/api/{resource}` and `/api/{resource}/{*rest}` for the resources
//! that the browser UI reaches through same-origin routes, forwarding each
//! request to the REST backend and passing the backend's status and body
//! back unchanged.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{BackendConfig, ProxyConfig};
use crate::gateway::http::bearer;
use crate::resources::ResourceSpec;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("{0}")]
    Token(#[from] crate::gateway::GatewayError),
}

/// Shared proxy state
#[derive(Debug, Clone)]
pub struct ProxyState {
    client: reqwest::Client,
    base_url: Arc<str>,
    resources: Arc<HashMap<String, ResourceSpec>>,
    authorization: Option<HeaderValue>,
}

impl ProxyState {
    /// State forwarding to `base_url` for every `proxied` resource in
    /// `catalog`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        catalog: impl IntoIterator<Item = ResourceSpec>,
    ) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let resources = catalog
            .into_iter()
            .filter(|spec| spec.proxied)
            .map(|spec| (spec.name.clone(), spec))
            .collect();
        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            resources: Arc::new(resources),
            authorization: None,
        })
    }

    /// Send `token` as a bearer credential on requests that arrive without
    /// their own `Authorization` header.
    pub fn with_api_token(mut self, token: Option<&str>) -> Result<Self, ProxyError> {
        self.authorization = bearer(token)?;
        Ok(self)
    }

    pub fn from_config(
        backend: &BackendConfig,
        catalog: impl IntoIterator<Item = ResourceSpec>,
    ) -> Result<Self, ProxyError> {
        Self::new(
            &backend.base_url,
            Duration::from_secs(backend.timeout_seconds),
            catalog,
        )?
        .with_api_token(backend.api_token.as_deref())
    }

    /// Names of the forwarded resources, sorted.
    pub fn resource_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn target_url(&self, spec: &ResourceSpec, rest: Option<&str>, query: Option<&str>) -> String {
        let mut url = format!("{}{}", self.base_url, spec.path);
        if let Some(rest) = rest.map(|r| r.trim_matches('/')).filter(|r| !r.is_empty()) {
            url.push('/');
            url.push_str(rest);
        }
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// Build the proxy router.
pub fn create_proxy_router(state: ProxyState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/{resource}", any(forward_root))
        .route("/api/{resource}/{*rest}", any(forward_nested))
        .with_state(state)
}

async fn health_handler(State(state): State<ProxyState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "resources": state.resource_names(),
    }))
}

async fn forward_root(
    State(state): State<ProxyState>,
    Path(resource): Path<String>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, &resource, None, method, query, &headers, body).await
}

async fn forward_nested(
    State(state): State<ProxyState>,
    Path((resource, rest)): Path<(String, String)>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, &resource, Some(&rest), method, query, &headers, body).await
}

/// A POST carrying a persisted id is an update.
pub fn effective_method(method: &Method, body: &[u8]) -> Method {
    if *method != Method::POST || body.is_empty() {
        return method.clone();
    }
    let has_id = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("id").and_then(Value::as_i64))
        .is_some_and(|id| id != 0);
    if has_id {
        Method::PUT
    } else {
        Method::POST
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn forward(
    state: &ProxyState,
    resource: &str,
    rest: Option<&str>,
    method: Method,
    query: Option<String>,
    headers: &HeaderMap,
    body: Bytes,
) -> Response {
    let Some(spec) = state.resources.get(resource) else {
        debug!(resource, "proxy request for unknown resource");
        return message(StatusCode::NOT_FOUND, "unknown resource");
    };

    let method = effective_method(&method, &body);
    let url = state.target_url(spec, rest, query.as_deref());
    debug!(resource, method = %method, url = %url, "forwarding request");

    let mut request = state
        .client
        .request(method.clone(), &url)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(accept) = headers.get(header::ACCEPT) {
        request = request.header(header::ACCEPT, accept.clone());
    }
    if let Some(auth) = headers.get(header::AUTHORIZATION).or(state.authorization.as_ref()) {
        request = request.header(header::AUTHORIZATION, auth.clone());
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(resource, url = %url, error = %e, "backend unreachable");
            return message(StatusCode::BAD_GATEWAY, "failed to reach backend");
        }
    };

    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(resource, url = %url, error = %e, "backend response interrupted");
            return message(StatusCode::BAD_GATEWAY, "failed to reach backend");
        }
    };

    info!(resource, method = %method, status = status.as_u16(), "proxied request");
    (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ProxyConfig, state: ProxyState) -> Result<(), ProxyError> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|_| ProxyError::InvalidAddress(format!("{}:{}", config.bind, config.port)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ProxyError::Bind { addr, source })?;

    info!(
        address = %addr,
        backend = %state.base_url,
        resources = ?state.resource_names(),
        "starting proxy"
    );

    axum::serve(listener, create_proxy_router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutting down proxy");
            }
        })
        .await
        .map_err(ProxyError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ProxyState {
        ProxyState::new("http://backend/api/", Duration::from_secs(1), crate::resources::catalog())
            .unwrap()
    }

    #[test]
    fn test_only_proxied_resources_are_routed() {
        assert_eq!(
            state().resource_names(),
            vec!["default-avatars", "eye-catchers", "queued-messages"]
        );
    }

    #[test]
    fn test_target_url_keeps_rest_and_query() {
        let state = state();
        let spec = &state.resources["queued-messages"];
        assert_eq!(
            state.target_url(spec, Some("search"), Some("keyword=a&page=0&size=10")),
            format!("http://backend/api{}/search?keyword=a&page=0&size=10", spec.path)
        );
        assert_eq!(
            state.target_url(spec, None, None),
            format!("http://backend/api{}", spec.path)
        );
    }

    #[test]
    fn test_api_token_becomes_bearer_header() {
        let tokened = state().with_api_token(Some("s3cret")).unwrap();
        let auth = tokened.authorization.as_ref().unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer s3cret");
        assert!(!format!("{:?}", tokened).contains("s3cret"));

        assert!(state().with_api_token(None).unwrap().authorization.is_none());
        assert!(matches!(
            state().with_api_token(Some("a\rb")),
            Err(ProxyError::Token(_))
        ));
    }

    #[test]
    fn test_post_with_id_becomes_put() {
        assert_eq!(effective_method(&Method::POST, br#"{"id":7,"a":1}"#), Method::PUT);
        assert_eq!(effective_method(&Method::POST, br#"{"id":0}"#), Method::POST);
        assert_eq!(effective_method(&Method::POST, br#"{"a":1}"#), Method::POST);
        assert_eq!(effective_method(&Method::POST, b"not json"), Method::POST);
        assert_eq!(effective_method(&Method::DELETE, br#"{"id":7}"#), Method::DELETE);
    }
}
