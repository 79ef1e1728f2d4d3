//! REST implementation of the gateway.
//!
//! Uses `reqwest::Client` against a fixed backend base URL. Paths come from
//! each resource's `Endpoints`; update requests keep the id in the body for
//! resources that expect it there.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use super::{Gateway, GatewayError, Op, Result};
use crate::config::BackendConfig;
use crate::model::{Page, Record, RecordId, SearchQuery};
use crate::resources::ResourceSpec;

/// Gateway that talks to the REST backend.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_token(base_url, timeout, None)
    }

    /// Create a gateway that sends `token` as a bearer credential on every
    /// request. A blank token is ignored.
    pub fn with_token(
        base_url: impl Into<String>,
        timeout: Duration,
        token: Option<&str>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(value) = bearer(token)? {
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("http client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::with_token(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
            config.api_token.as_deref(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a resource path suffix.
    pub fn url(&self, spec: &ResourceSpec, suffix: &str) -> String {
        format!("{}{}{}", self.base_url, spec.path, suffix)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a request and return the decoded JSON body, `None` when empty.
    async fn send(
        &self,
        spec: &ResourceSpec,
        op: Op,
        request: RequestBuilder,
    ) -> Result<Option<Value>> {
        let action = op.action(spec);
        let response = request.send().await.map_err(|e| {
            warn!(resource = %spec.name, op = op.as_str(), error = %e, "backend unreachable");
            GatewayError::Network {
                action: action.clone(),
                source: Some(e),
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GatewayError::Network {
            action: action.clone(),
            source: Some(e),
        })?;

        debug!(
            resource = %spec.name,
            op = op.as_str(),
            status = status.as_u16(),
            bytes = text.len(),
            "backend response"
        );

        if !status.is_success() {
            let err = GatewayError::from_response(status.as_u16(), &text);
            warn!(
                resource = %spec.name,
                op = op.as_str(),
                status = status.as_u16(),
                error = %err,
                "backend rejected request"
            );
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| GatewayError::Decode {
                action,
                reason: e.to_string(),
            })
    }

    fn decode<T: serde::de::DeserializeOwned>(
        spec: &ResourceSpec,
        op: Op,
        value: Value,
    ) -> Result<T> {
        serde_json::from_value(value).map_err(|e| GatewayError::Decode {
            action: op.action(spec),
            reason: e.to_string(),
        })
    }
}

/// `Authorization` header value for a bearer token, marked sensitive so it
/// never shows up in debug output.
pub fn bearer(token: Option<&str>) -> Result<Option<HeaderValue>> {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
        GatewayError::InvalidRequest("API token contains characters not allowed in a header".to_string())
    })?;
    value.set_sensitive(true);
    Ok(Some(value))
}

/// Accept a bare array or an object wrapping one under `content` / `data`.
fn unwrap_list(value: Value) -> Option<Value> {
    match value {
        Value::Array(_) => Some(value),
        Value::Object(mut map) => ["content", "data", "items"]
            .iter()
            .find_map(|key| map.remove(*key).filter(|v| v.is_array())),
        _ => None,
    }
}

/// Accept a bare record or one wrapped under `data`.
fn unwrap_record(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list(&self, spec: &ResourceSpec) -> Result<Vec<Record>> {
        let url = self.url(spec, &spec.endpoints.list_suffix());
        debug!(resource = %spec.name, %url, "GET list");
        let body = self.send(spec, Op::List, self.request(Method::GET, &url)).await?;
        match body.map(unwrap_list) {
            None => Ok(Vec::new()),
            Some(Some(items)) => Self::decode(spec, Op::List, items),
            Some(None) => Err(GatewayError::Decode {
                action: Op::List.action(spec),
                reason: "expected a JSON array".to_string(),
            }),
        }
    }

    async fn search(&self, spec: &ResourceSpec, query: &SearchQuery) -> Result<Page<Record>> {
        let url = self.url(spec, &spec.endpoints.search_suffix());
        debug!(resource = %spec.name, %url, keyword = %query.keyword, page = query.page, size = query.size, "GET search");
        let request = self.request(Method::GET, &url).query(&query.pairs());
        let body = self.send(spec, Op::Search, request).await?;
        match body {
            None => Ok(Page::new(Vec::new(), 0, query.page, query.size)),
            // Some endpoints answer a search with a bare array.
            Some(Value::Array(items)) => {
                let content: Vec<Record> = Self::decode(spec, Op::Search, Value::Array(items))?;
                let total = content.len() as u64;
                Ok(Page::new(content, total, query.page, query.size))
            }
            Some(value) => {
                let mut page: Page<Record> = Self::decode(spec, Op::Search, value)?;
                if page.size == 0 {
                    page.size = query.size;
                }
                Ok(page)
            }
        }
    }

    async fn find(&self, spec: &ResourceSpec, id: RecordId) -> Result<Record> {
        let url = self.url(spec, &spec.endpoints.find_suffix(id));
        debug!(resource = %spec.name, %url, id, "GET one");
        match self.send(spec, Op::Find, self.request(Method::GET, &url)).await? {
            Some(value) => Self::decode(spec, Op::Find, unwrap_record(value)),
            None => Err(GatewayError::NotFound {
                resource: spec.name.clone(),
                id,
            }),
        }
    }

    async fn create(&self, spec: &ResourceSpec, record: &Record) -> Result<Record> {
        let url = self.url(spec, &spec.endpoints.create_suffix());
        debug!(resource = %spec.name, %url, "POST create");
        let request = self
            .request(Method::POST, &url)
            .header(CONTENT_TYPE, "application/json")
            .json(record);
        match self.send(spec, Op::Create, request).await? {
            Some(value) => Self::decode(spec, Op::Create, unwrap_record(value)),
            None => Ok(record.clone()),
        }
    }

    async fn update(&self, spec: &ResourceSpec, record: &Record) -> Result<Record> {
        let id = record.persisted_id().ok_or_else(|| {
            GatewayError::InvalidRequest(format!("cannot update {} without an id", spec.name))
        })?;
        let url = self.url(spec, &spec.endpoints.update_suffix(id));
        debug!(resource = %spec.name, %url, id, "PUT update");
        let request = self
            .request(Method::PUT, &url)
            .header(CONTENT_TYPE, "application/json")
            .json(record);
        match self.send(spec, Op::Update, request).await? {
            Some(value) => Self::decode(spec, Op::Update, unwrap_record(value)),
            None => Ok(record.clone()),
        }
    }

    async fn delete(&self, spec: &ResourceSpec, id: RecordId) -> Result<()> {
        let url = self.url(spec, &spec.endpoints.delete_suffix(id));
        debug!(resource = %spec.name, %url, id, "DELETE one");
        self.send(spec, Op::Delete, self.request(Method::DELETE, &url))
            .await?;
        Ok(())
    }

    async fn clear(&self, spec: &ResourceSpec) -> Result<()> {
        let url = self.url(spec, &spec.endpoints.clear_suffix());
        debug!(resource = %spec.name, %url, "DELETE all");
        self.send(spec, Op::Clear, self.request(Method::DELETE, &url))
            .await?;
        Ok(())
    }
}
