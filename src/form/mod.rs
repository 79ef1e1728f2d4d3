//! Form controller
//!
//! Edits a draft record for one resource, validates it against the
//! resource's field rules, and submits it as exactly one create or update.

pub mod rules;

pub use rules::{ErrorCode, FieldError, Rule};

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::gateway::GatewayError;
use crate::model::{Record, RecordId};
use crate::repository::Repository;
use crate::resources::{FieldKind, FieldSpec, ResourceSpec};

/// Errors returned by [`FormController::submit`].
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("please fix {} invalid field(s)", .0.errors.len())]
    Invalid(Validation),

    #[error("{0}")]
    Gateway(#[from] GatewayError),
}

/// Whether the form creates a new record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(RecordId),
}

/// Outcome of validating a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: Vec<FieldError>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error for a field, if any.
    pub fn error_for(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

/// Draft state for an add or edit form.
#[derive(Debug, Clone)]
pub struct FormController {
    mode: FormMode,
    draft: Record,
    fields: Vec<FieldSpec>,
    errors: Vec<FieldError>,
}

impl FormController {
    /// Blank form for a new record.
    pub fn add(spec: &ResourceSpec) -> Self {
        Self {
            mode: FormMode::Add,
            draft: Record::new(),
            fields: spec.fields.clone(),
            errors: Vec::new(),
        }
    }

    /// Form pre-filled with an existing record.
    pub fn edit(spec: &ResourceSpec, record: Record) -> Self {
        let mode = match record.persisted_id() {
            Some(id) => FormMode::Edit(id),
            None => FormMode::Add,
        };
        Self {
            mode,
            draft: record,
            fields: spec.fields.clone(),
            errors: Vec::new(),
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &Record {
        &self.draft
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Errors from the last validation or rejected submit.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Set a field to a JSON value.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.draft.set(field, value);
        self.errors.retain(|e| e.field != field);
    }

    /// Set a field from raw text input, coerced to the field's kind.
    pub fn set_text(&mut self, field: &str, raw: &str) {
        let kind = self
            .fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| &f.kind);
        let value = coerce(kind, raw);
        self.set(field, value);
    }

    /// Run every field rule against the draft.
    pub fn validate(&self) -> Validation {
        let errors = self
            .fields
            .iter()
            .filter_map(|field| {
                field
                    .rules
                    .iter()
                    .find_map(|rule| rule.check(&field.name, &field.label, &self.draft))
            })
            .collect();
        Validation { errors }
    }

    /// Validate, then send exactly one create or update. Nothing is sent
    /// when validation fails.
    pub async fn submit(&mut self, repo: &Repository) -> Result<Record, FormError> {
        let validation = self.validate();
        if !validation.is_valid() {
            debug!(
                resource = repo.name(),
                invalid = validation.errors.len(),
                "form blocked by validation"
            );
            self.errors = validation.errors.clone();
            return Err(FormError::Invalid(validation));
        }
        self.errors.clear();

        let mut record = self.draft.clone();
        if let FormMode::Edit(id) = self.mode {
            record.id = Some(id);
        }
        record.stamp(Utc::now());

        let result = match self.mode {
            FormMode::Add => repo.create(&record).await,
            FormMode::Edit(_) => repo.update(&record).await,
        };

        match result {
            Ok(saved) => {
                self.draft = saved.clone();
                if let Some(id) = saved.persisted_id() {
                    self.mode = FormMode::Edit(id);
                }
                Ok(saved)
            }
            Err(e) => {
                if let Some(field) = e.field() {
                    self.errors.push(FieldError {
                        field: field.to_string(),
                        code: ErrorCode::Rejected,
                        message: e.user_message(),
                    });
                }
                Err(FormError::Gateway(e))
            }
        }
    }
}

/// Turn raw text into the JSON value a field of `kind` expects.
pub fn coerce(kind: Option<&FieldKind>, raw: &str) -> Value {
    let trimmed = raw.trim();
    match kind {
        Some(FieldKind::Number) => serde_json::from_str::<serde_json::Number>(trimmed)
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Some(FieldKind::Bool) => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Value::Bool(true),
            "false" | "no" | "0" | "off" | "" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        Some(FieldKind::Tags) => Value::Array(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        _ => Value::String(raw.to_string()),
    }
}
