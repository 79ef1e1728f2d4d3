//! Record and paging types shared by every resource.
//!
//! The backend speaks flat JSON objects. The handful of fields every resource
//! carries (id, owner scoping, timestamps) are typed; everything else is kept
//! in an ordered map so one `Record` type serves all resources.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Backend-assigned record identifier.
pub type RecordId = i64;

/// A single resource row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Backend-assigned id; absent or `0` until the record is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,

    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,

    /// Soft-delete marker. Carried through, never enforced.
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Resource-specific content fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create an empty, not-yet-persisted record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style id setter.
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// The id, treating `0` the same as absent.
    pub fn persisted_id(&self) -> Option<RecordId> {
        self.id.filter(|id| *id != 0)
    }

    /// Whether the backend has not assigned an id yet.
    pub fn is_new(&self) -> bool {
        self.persisted_id().is_none()
    }

    /// Set a field. Typed keys (`id`, `userId`, ...) are routed to their
    /// typed slot so the record never carries the same key twice.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "id" => self.id = value.as_i64(),
            "userId" => self.user_id = value.as_i64(),
            "companyId" => self.company_id = value.as_i64(),
            "createdAt" => self.created_at = parse_timestamp(&value),
            "updatedAt" => self.updated_at = parse_timestamp(&value),
            "deletedAt" => self.deleted_at = parse_timestamp(&value),
            _ => {
                self.fields.insert(key, value);
            }
        }
    }

    /// Read any field, typed or not, as a JSON value.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "id" => self.id.map(Value::from),
            "userId" => self.user_id.map(Value::from),
            "companyId" => self.company_id.map(Value::from),
            "createdAt" => self.created_at.map(|t| Value::String(t.to_rfc3339())),
            "updatedAt" => self.updated_at.map(|t| Value::String(t.to_rfc3339())),
            "deletedAt" => self.deleted_at.map(|t| Value::String(t.to_rfc3339())),
            _ => self.fields.get(key).cloned(),
        }
    }

    /// Borrow a content field as a string, if it is one.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    /// Render a field the way a table cell shows it.
    pub fn display(&self, key: &str) -> String {
        self.get(key).map(|v| display_value(&v)).unwrap_or_default()
    }

    /// Stamp client-side timestamps ahead of a write. `createdAt` is only
    /// stamped for new records; the backend response replaces both.
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        if self.is_new() && self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }

    /// Convert into a JSON object value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Render a JSON value as plain cell text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_datetime(text),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp. Values without an offset (as emitted for
/// local date-times) and bare dates are taken as UTC.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    const LOCAL_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|t| t.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_timestamp(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp {}", value))),
    }
}

/// One page of a server-side search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: Option<u64>,
    /// Zero-based page number.
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub size: u64,
}

impl<T> Page<T> {
    /// Build a page, deriving `totalPages` from the element count.
    pub fn new(content: Vec<T>, total_elements: u64, number: u64, size: u64) -> Self {
        let mut page = Self {
            content,
            total_elements,
            total_pages: None,
            number,
            size,
        };
        page.total_pages = Some(page.page_count());
        page
    }

    /// Number of pages, recomputed from `totalElements` when the backend
    /// omitted it.
    pub fn page_count(&self) -> u64 {
        if let Some(pages) = self.total_pages {
            return pages;
        }
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(self.size)
    }
}

/// Query for a backend `/search` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    /// Zero-based page number.
    pub page: u64,
    pub size: u64,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, page: u64, size: u64) -> Self {
        Self {
            keyword: keyword.into(),
            page,
            size,
        }
    }

    /// Query pairs in the order the backend expects.
    pub fn pairs(&self) -> [(&'static str, String); 3] {
        [
            ("keyword", self.keyword.clone()),
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
        ]
    }

    /// Encoded query string, e.g. `keyword=USD&page=0&size=5`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_roundtrips_flat_json() {
        let raw = json!({
            "id": 7,
            "userId": 3,
            "tag": "support",
            "isDefault": true,
            "createdAt": "2024-05-01T10:00:00Z"
        });
        let record: Record = serde_json::from_value(raw).unwrap();
        assert_eq!(record.id, Some(7));
        assert_eq!(record.user_id, Some(3));
        assert_eq!(record.str_field("tag"), Some("support"));
        assert_eq!(record.fields.get("isDefault"), Some(&json!(true)));
        assert!(record.created_at.is_some());
        assert!(!record.fields.contains_key("id"));
    }

    #[test]
    fn test_local_date_times_decode_as_utc() {
        let record: Record = serde_json::from_str(
            r#"{"id":1,"tag":"a","createdAt":"2024-05-01T10:00:00.123","updatedAt":"2024-05-02T08:30:00"}"#,
        )
        .unwrap();
        let created = record.created_at.unwrap();
        assert_eq!(created.to_rfc3339(), "2024-05-01T10:00:00.123+00:00");
        assert_eq!(record.display("updatedAt"), "2024-05-02T08:30:00+00:00");

        let offset: Record =
            serde_json::from_str(r#"{"createdAt":"2024-05-01T12:00:00+02:00"}"#).unwrap();
        assert_eq!(offset.created_at, Some(created - chrono::Duration::milliseconds(123)));

        let nulls: Record = serde_json::from_str(r#"{"deletedAt":null,"tag":"b"}"#).unwrap();
        assert!(nulls.deleted_at.is_none());
        assert!(serde_json::from_str::<Record>(r#"{"createdAt":"yesterday"}"#).is_err());
    }

    #[test]
    fn test_parse_datetime_variants() {
        assert!(parse_datetime("2024-05-01T10:00:00Z").is_some());
        assert!(parse_datetime("2024-05-01T10:00").is_some());
        assert!(parse_datetime("2024-05-01 10:00:00").is_some());
        assert_eq!(
            parse_datetime("2024-05-01").map(|t| t.to_rfc3339()),
            Some("2024-05-01T00:00:00+00:00".to_string())
        );
        assert!(parse_datetime("05/01/2024").is_none());
    }

    #[test]
    fn test_zero_id_is_new() {
        let record = Record::new().with_id(0);
        assert!(record.is_new());
        assert_eq!(record.persisted_id(), None);
        assert!(!Record::new().with_id(4).is_new());
    }

    #[test]
    fn test_set_routes_typed_keys() {
        let mut record = Record::new();
        record.set("id", 12);
        record.set("companyId", 9);
        record.set("title", "Hello");
        assert_eq!(record.id, Some(12));
        assert_eq!(record.company_id, Some(9));
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.display("id"), "12");
    }

    #[test]
    fn test_stamp_only_sets_created_on_new_records() {
        let now = Utc::now();
        let mut fresh = Record::new();
        fresh.stamp(now);
        assert_eq!(fresh.created_at, Some(now));
        assert_eq!(fresh.updated_at, Some(now));

        let mut existing = Record::new().with_id(5);
        existing.stamp(now);
        assert!(existing.created_at.is_none());
        assert_eq!(existing.updated_at, Some(now));
    }

    #[test]
    fn test_display_joins_arrays() {
        let record = Record::new().with("keywords", json!(["a", "b"]));
        assert_eq!(record.display("keywords"), "a, b");
        assert_eq!(record.display("missing"), "");
    }

    #[test]
    fn test_page_count_recomputed_from_total_elements() {
        let page: Page<Record> = serde_json::from_value(json!({
            "content": [],
            "totalElements": 11,
            "number": 0,
            "size": 5
        }))
        .unwrap();
        assert_eq!(page.page_count(), 3);
    }

    #[test]
    fn test_search_query_string_order() {
        let q = SearchQuery::new("USD", 0, 5);
        assert_eq!(q.to_query_string(), "keyword=USD&page=0&size=5");
    }
}
