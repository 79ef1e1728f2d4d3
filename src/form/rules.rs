//! Field validation rules.
//!
//! Rules are synchronous and client-only. Format rules skip empty values so a
//! field can be optional and still format-checked when filled in.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::model::{parse_datetime, Record};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

/// A single constraint on a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty string, non-null value, non-empty array.
    Required,
    /// Number strictly greater than zero.
    Positive,
    /// Required only when another field currently equals `equals`.
    RequiredWhen { field: String, equals: String },
    /// `#RGB` or `#RRGGBB`.
    HexColor,
    /// Absolute http(s) URL.
    Url,
    /// Dotted-quad IPv4 address.
    Ipv4,
    Email,
    /// ISO-8601 date or date-time.
    DateTime,
    /// Value must be one of the listed options.
    OneOf(Vec<String>),
    /// Maximum string length in characters.
    MaxLen(usize),
}

/// Machine-readable reason a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    NotPositive,
    InvalidColor,
    InvalidUrl,
    InvalidIp,
    InvalidEmail,
    InvalidDateTime,
    NotAllowed,
    TooLong,
    /// Reported by the backend rather than a local rule.
    Rejected,
}

/// A failed rule, ready to show next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: ErrorCode,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

/// Whether a value counts as "not filled in".
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

impl Rule {
    /// Check the rule for `field` against the whole draft record.
    pub fn check(&self, field: &str, label: &str, record: &Record) -> Option<FieldError> {
        let value = record.get(field);
        let blank = is_blank(value.as_ref());
        let fail = |code: ErrorCode, message: String| {
            Some(FieldError {
                field: field.to_string(),
                code,
                message,
            })
        };

        match self {
            Rule::Required => {
                if blank {
                    return fail(ErrorCode::Required, format!("{} is required", label));
                }
            }
            Rule::RequiredWhen {
                field: other,
                equals,
            } => {
                let triggered = record
                    .get(other)
                    .map(|v| as_text(&v) == *equals)
                    .unwrap_or(false);
                if triggered && blank {
                    return fail(
                        ErrorCode::Required,
                        format!("{} is required when {} is {}", label, other, equals),
                    );
                }
            }
            _ if blank => {}
            Rule::Positive => {
                let ok = value.as_ref().and_then(as_number).is_some_and(|n| n > 0.0);
                if !ok {
                    return fail(
                        ErrorCode::NotPositive,
                        format!("{} must be a positive number", label),
                    );
                }
            }
            Rule::HexColor => {
                let text = value.as_ref().map(as_text).unwrap_or_default();
                if !HEX_COLOR.is_match(&text) {
                    return fail(
                        ErrorCode::InvalidColor,
                        format!("{} must be a hex color like #1a2b3c", label),
                    );
                }
            }
            Rule::Url => {
                let text = value.as_ref().map(as_text).unwrap_or_default();
                let ok = url::Url::parse(&text)
                    .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
                    .unwrap_or(false);
                if !ok {
                    return fail(
                        ErrorCode::InvalidUrl,
                        format!("{} must be an http(s) URL", label),
                    );
                }
            }
            Rule::Ipv4 => {
                let text = value.as_ref().map(as_text).unwrap_or_default();
                if text.parse::<Ipv4Addr>().is_err() {
                    return fail(
                        ErrorCode::InvalidIp,
                        format!("{} must be an IPv4 address like 203.0.113.7", label),
                    );
                }
            }
            Rule::Email => {
                let text = value.as_ref().map(as_text).unwrap_or_default();
                if !EMAIL.is_match(&text) {
                    return fail(
                        ErrorCode::InvalidEmail,
                        format!("{} must be an email address", label),
                    );
                }
            }
            Rule::DateTime => {
                let text = value.as_ref().map(as_text).unwrap_or_default();
                if parse_datetime(&text).is_none() {
                    return fail(
                        ErrorCode::InvalidDateTime,
                        format!("{} must be a date-time like 2024-05-01T10:00:00", label),
                    );
                }
            }
            Rule::OneOf(options) => {
                let text = value.as_ref().map(as_text).unwrap_or_default();
                if !options.iter().any(|o| *o == text) {
                    return fail(
                        ErrorCode::NotAllowed,
                        format!("{} must be one of: {}", label, options.join(", ")),
                    );
                }
            }
            Rule::MaxLen(max) => {
                let text = value.as_ref().map(as_text).unwrap_or_default();
                if text.chars().count() > *max {
                    return fail(
                        ErrorCode::TooLong,
                        format!("{} must be at most {} characters", label, max),
                    );
                }
            }
        }
        None
    }
}
