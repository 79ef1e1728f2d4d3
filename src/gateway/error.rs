//! Gateway error normalization.
//!
//! Every failed backend call ends up as a `GatewayError` whose `Display` is
//! the message shown to the operator. For non-2xx responses the message is
//! resolved in priority order: structured `{code, field, message}` body,
//! plain `message` field, HTTP status text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::RecordId;

static DUPLICATE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duplicate entry '([^']*)' for key '([^']*)'").expect("valid regex")
});

/// Errors that can occur when talking to the backend
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Backend answered with a non-2xx status.
    #[error("{message}")]
    Backend {
        status: u16,
        message: String,
        detail: Option<BackendError>,
    },

    /// Request never produced a response.
    #[error("failed to {action}")]
    Network {
        action: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Response arrived but could not be decoded.
    #[error("unexpected response while trying to {action}: {reason}")]
    Decode { action: String, reason: String },

    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: RecordId },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn network(action: impl Into<String>) -> Self {
        GatewayError::Network {
            action: action.into(),
            source: None,
        }
    }

    pub fn backend(status: u16, message: impl Into<String>, detail: Option<BackendError>) -> Self {
        GatewayError::Backend {
            status,
            message: message.into(),
            detail,
        }
    }

    /// Build the error for a non-2xx response from its status and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let detail = parsed
            .as_ref()
            .and_then(|v| serde_json::from_value::<BackendError>(v.clone()).ok())
            .filter(|d| d.code.is_some() || d.field.is_some());

        let body_message = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(|m| m.as_str())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        if let Some(message) = detail.as_ref().and_then(|d| d.message.clone()) {
            return Self::backend(status, message, detail);
        }

        // Older endpoints leak raw SQL constraint text; rewrite it.
        let scraped = body_message
            .as_deref()
            .and_then(DuplicateKey::parse)
            .or_else(|| DuplicateKey::parse(body));

        if let Some(dup) = scraped {
            let detail = detail.unwrap_or_else(|| BackendError {
                code: Some("duplicate".to_string()),
                field: Some(dup.field().to_string()),
                message: None,
            });
            return Self::backend(status, dup.user_message(), Some(detail));
        }

        let message = body_message.unwrap_or_else(|| status_text(status));

        Self::backend(status, message, detail)
    }

    /// HTTP status, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Backend { status, .. } => Some(*status),
            GatewayError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Field the backend blamed, if it said.
    pub fn field(&self) -> Option<&str> {
        match self {
            GatewayError::Backend {
                detail: Some(detail),
                ..
            } => detail.field.as_deref(),
            _ => None,
        }
    }

    /// Transport failures and 5xx responses may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network { .. } => true,
            GatewayError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Message to show the operator.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// Structured error body: `{ "code": ..., "field": ..., "message": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A `Duplicate entry 'value' for key 'key'` constraint violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub value: String,
    pub key: String,
}

impl DuplicateKey {
    /// Extract the violation from backend error text.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = DUPLICATE_ENTRY.captures(text)?;
        Some(Self {
            value: caps.get(1)?.as_str().to_string(),
            key: caps.get(2)?.as_str().to_string(),
        })
    }

    /// Column name without a `table.` prefix.
    pub fn field(&self) -> &str {
        self.key.rsplit('.').next().unwrap_or(&self.key)
    }

    pub fn user_message(&self) -> String {
        let field = self.field();
        let mut chars = field.chars();
        let label = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("{} '{}' already exists", label, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_wins_over_status_text() {
        let err = GatewayError::from_response(400, r#"{"message":"Tag name too long"}"#);
        assert_eq!(err.to_string(), "Tag name too long");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_falls_back_to_status_text() {
        let err = GatewayError::from_response(503, "<html>oops</html>");
        assert_eq!(err.to_string(), "Service Unavailable");
        assert!(err.is_retryable());

        let err = GatewayError::from_response(404, r#"{"message":"   "}"#);
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn test_structured_contract() {
        let body = r#"{"code":"invalid","field":"url","message":"URL is not reachable"}"#;
        let err = GatewayError::from_response(422, body);
        assert_eq!(err.to_string(), "URL is not reachable");
        assert_eq!(err.field(), Some("url"));
    }

    #[test]
    fn test_duplicate_entry_rewritten() {
        let body = r#"{"message":"could not execute statement; Duplicate entry 'Welcome' for key 'title'"}"#;
        let err = GatewayError::from_response(500, body);
        assert_eq!(err.to_string(), "Title 'Welcome' already exists");
        assert_eq!(err.field(), Some("title"));
    }

    #[test]
    fn test_duplicate_entry_in_plain_text_body() {
        let err = GatewayError::from_response(
            409,
            "Duplicate entry 'support' for key 'tags.tag'",
        );
        assert_eq!(err.to_string(), "Tag 'support' already exists");
    }

    #[test]
    fn test_structured_message_wins_over_scraping() {
        let body = r#"{"code":"duplicate","field":"tag","message":"Duplicate entry 'x' for key 'tags.tag'"}"#;
        let err = GatewayError::from_response(409, body);
        assert_eq!(err.to_string(), "Duplicate entry 'x' for key 'tags.tag'");
        assert_eq!(err.field(), Some("tag"));
    }

    #[test]
    fn test_duplicate_key_parse() {
        let dup = DuplicateKey::parse("Duplicate entry 'a@b.c' for key 'users.email'").unwrap();
        assert_eq!(dup.value, "a@b.c");
        assert_eq!(dup.field(), "email");
        assert!(DuplicateKey::parse("something else").is_none());
    }

    #[test]
    fn test_network_message() {
        let err = GatewayError::network("load tags");
        assert_eq!(err.user_message(), "failed to load tags");
        assert_eq!(err.status(), None);
    }
}
