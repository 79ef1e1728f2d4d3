//! Resource schemas
//!
//! Every admin screen is the same list/form pattern over a different backend
//! resource. A `ResourceSpec` captures what actually differs between them:
//! the URL conventions, the form fields and their rules, the table columns
//! and whether search runs client- or server-side.

mod catalog;

pub use catalog::{catalog, find_resource};

use crate::form::rules::Rule;
use crate::gateway::RetryPolicy;
use crate::model::RecordId;

/// How the list screen narrows results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStrategy {
    /// Fetch everything once, filter and slice locally.
    #[default]
    Client,
    /// Call `GET {path}/search?keyword=&page=&size=` per change.
    Server,
}

impl ListStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListStrategy::Client => "client",
            ListStrategy::Server => "server",
        }
    }
}

/// Path used to list every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListPath {
    #[default]
    Root,
    All,
    List,
}

/// Path used to fetch one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindPath {
    #[default]
    Id,
    Find,
    Get,
}

/// Path used to create a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreatePath {
    #[default]
    Root,
    Save,
}

/// How updates address the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStyle {
    /// `PUT {path}` with the id in the body.
    #[default]
    BodyId,
    /// `PUT {path}/update` with the id in the body.
    BodyIdUpdate,
    /// `PUT {path}/{id}`.
    PathId,
}

/// Path used to delete one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePath {
    #[default]
    Id,
    Delete,
}

/// Path used to delete every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearPath {
    #[default]
    Root,
    Clear,
    DeleteAll,
}

/// URL conventions of one resource, relative to its base path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Endpoints {
    pub list: ListPath,
    pub find: FindPath,
    pub create: CreatePath,
    pub update: UpdateStyle,
    pub delete: DeletePath,
    pub clear: ClearPath,
}

impl Endpoints {
    pub fn list_suffix(&self) -> String {
        match self.list {
            ListPath::Root => String::new(),
            ListPath::All => "/all".to_string(),
            ListPath::List => "/list".to_string(),
        }
    }

    pub fn search_suffix(&self) -> String {
        "/search".to_string()
    }

    pub fn find_suffix(&self, id: RecordId) -> String {
        match self.find {
            FindPath::Id => format!("/{}", id),
            FindPath::Find => format!("/find/{}", id),
            FindPath::Get => format!("/get/{}", id),
        }
    }

    pub fn create_suffix(&self) -> String {
        match self.create {
            CreatePath::Root => String::new(),
            CreatePath::Save => "/save".to_string(),
        }
    }

    pub fn update_suffix(&self, id: RecordId) -> String {
        match self.update {
            UpdateStyle::BodyId => String::new(),
            UpdateStyle::BodyIdUpdate => "/update".to_string(),
            UpdateStyle::PathId => format!("/{}", id),
        }
    }

    pub fn delete_suffix(&self, id: RecordId) -> String {
        match self.delete {
            DeletePath::Id => format!("/{}", id),
            DeletePath::Delete => format!("/delete/{}", id),
        }
    }

    pub fn clear_suffix(&self) -> String {
        match self.clear {
            ClearPath::Root => String::new(),
            ClearPath::Clear => "/clear".to_string(),
            ClearPath::DeleteAll => "/delete/all".to_string(),
        }
    }
}

/// Input widget / value type of a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Number,
    Bool,
    Enum(Vec<String>),
    /// Array of strings.
    Tags,
    Color,
    Url,
    Ip,
    Email,
    DateTime,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::LongText => "long_text",
            FieldKind::Number => "number",
            FieldKind::Bool => "bool",
            FieldKind::Enum(_) => "enum",
            FieldKind::Tags => "tags",
            FieldKind::Color => "color",
            FieldKind::Url => "url",
            FieldKind::Ip => "ip",
            FieldKind::Email => "email",
            FieldKind::DateTime => "datetime",
        }
    }
}

/// One editable field of a resource form.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
}

impl FieldSpec {
    /// Create a field. Format rules implied by the kind are attached
    /// automatically.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        let rules = match &kind {
            FieldKind::Color => vec![Rule::HexColor],
            FieldKind::Url => vec![Rule::Url],
            FieldKind::Ip => vec![Rule::Ipv4],
            FieldKind::Email => vec![Rule::Email],
            FieldKind::DateTime => vec![Rule::DateTime],
            FieldKind::Enum(values) => vec![Rule::OneOf(values.clone())],
            _ => Vec::new(),
        };
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            rules,
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn long_text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::LongText)
    }

    pub fn number(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Bool)
    }

    pub fn choice(name: impl Into<String>, label: impl Into<String>, values: &[&str]) -> Self {
        let values = values.iter().map(|v| v.to_string()).collect();
        Self::new(name, label, FieldKind::Enum(values))
    }

    pub fn tags(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Tags)
    }

    pub fn color(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Color)
    }

    pub fn url(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Url)
    }

    pub fn ip(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Ip)
    }

    pub fn email(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Email)
    }

    pub fn datetime(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::DateTime)
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.rules.insert(0, Rule::Required);
        self
    }

    /// Require a strictly positive number.
    pub fn positive(mut self) -> Self {
        self.rules.push(Rule::Positive);
        self
    }

    /// Require the field only when `field` equals `equals`.
    pub fn required_when(mut self, field: impl Into<String>, equals: impl Into<String>) -> Self {
        self.rules.push(Rule::RequiredWhen {
            field: field.into(),
            equals: equals.into(),
        });
        self
    }

    /// Cap the length of a string value.
    pub fn max_len(mut self, max: usize) -> Self {
        self.rules.push(Rule::MaxLen(max));
        self
    }
}

/// Everything needed to drive the list/form pattern for one resource.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    /// Identifier used on the command line and in proxy routes.
    pub name: String,
    /// Human-readable plural label.
    pub label: String,
    /// Base path relative to the backend base URL, e.g. `/tags`.
    pub path: String,
    pub endpoints: Endpoints,
    pub fields: Vec<FieldSpec>,
    /// Table columns, also the sortable keys.
    pub columns: Vec<String>,
    pub strategy: ListStrategy,
    pub page_size: usize,
    pub retry: RetryPolicy,
    /// Served through the local `/api/{name}` forwarding routes.
    pub proxied: bool,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: format!("/{}", name),
            name,
            label: label.into(),
            endpoints: Endpoints::default(),
            fields: Vec::new(),
            columns: vec!["id".to_string()],
            strategy: ListStrategy::Client,
            page_size: 10,
            retry: RetryPolicy::none(),
            proxied: false,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Add a form field; its name also becomes a table column.
    pub fn field(mut self, field: FieldSpec) -> Self {
        if !self.columns.contains(&field.name) && field.kind != FieldKind::LongText {
            self.columns.push(field.name.clone());
        }
        self.fields.push(field);
        self
    }

    /// Show an extra, non-editable column such as `createdAt`.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.columns.contains(&name) {
            self.columns.push(name);
        }
        self
    }

    pub fn server_search(mut self) -> Self {
        self.strategy = ListStrategy::Server;
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn proxied(mut self) -> Self {
        self.proxied = true;
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Label for a field name, falling back to the raw name.
    pub fn label_for(&self, name: &str) -> String {
        self.field_spec(name)
            .map(|f| f.label.clone())
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_suffixes() {
        let e = Endpoints {
            list: ListPath::All,
            find: FindPath::Find,
            create: CreatePath::Save,
            update: UpdateStyle::BodyIdUpdate,
            delete: DeletePath::Delete,
            clear: ClearPath::DeleteAll,
        };
        assert_eq!(e.list_suffix(), "/all");
        assert_eq!(e.find_suffix(4), "/find/4");
        assert_eq!(e.create_suffix(), "/save");
        assert_eq!(e.update_suffix(4), "/update");
        assert_eq!(e.delete_suffix(4), "/delete/4");
        assert_eq!(e.clear_suffix(), "/delete/all");
    }

    #[test]
    fn test_default_endpoints_are_rest_style() {
        let e = Endpoints::default();
        assert_eq!(e.list_suffix(), "");
        assert_eq!(e.find_suffix(1), "/1");
        assert_eq!(e.update_suffix(1), "");
        assert_eq!(e.delete_suffix(1), "/1");
        assert_eq!(e.clear_suffix(), "");
    }

    #[test]
    fn test_field_kind_attaches_format_rule() {
        let f = FieldSpec::color("color", "Color").required();
        assert_eq!(f.rules, vec![Rule::Required, Rule::HexColor]);
        let f = FieldSpec::ip("ip", "IP address");
        assert_eq!(f.rules, vec![Rule::Ipv4]);
        let f = FieldSpec::datetime("expiresAt", "Expires at");
        assert_eq!(f.rules, vec![Rule::DateTime]);
    }

    #[test]
    fn test_fields_become_columns_except_long_text() {
        let spec = ResourceSpec::new("greetings", "Greetings")
            .field(FieldSpec::text("title", "Title"))
            .field(FieldSpec::long_text("message", "Message"))
            .column("createdAt");
        assert_eq!(spec.columns, vec!["id", "title", "createdAt"]);
        assert_eq!(spec.label_for("message"), "Message");
        assert_eq!(spec.label_for("createdAt"), "createdAt");
    }
}
