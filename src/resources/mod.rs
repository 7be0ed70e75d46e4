//! Static description of every table the API exposes, and the payload
//! checks that run before a row is written.

mod registry;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::permission::EntityType;
use crate::query::{QuerySpec, SqlValue};
use crate::validation::{self, ValidationError};

pub use registry::RESOURCES;

/// Columns maintained by the database; payloads may not set them.
pub const SYSTEM_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Decimal,
    Boolean,
    Timestamp,
    Date,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct SlugSource {
    pub column: &'static str,
    pub from: &'static str,
}

#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub entity: EntityType,
    pub table: &'static str,
    /// Writable columns. Anything else in a payload is rejected.
    pub columns: &'static [(&'static str, ColumnKind)],
    pub required: &'static [&'static str],
    pub query: QuerySpec,
    pub slug: Option<SlugSource>,
    pub email_columns: &'static [&'static str],
    pub image_columns: &'static [&'static str],
    pub image_extensions: &'static [&'static str],
    /// (start, end) columns that must be strictly ordered when both are set.
    pub date_range: Option<(&'static str, &'static str)>,
}

pub fn lookup(name: &str) -> Option<&'static ResourceSpec> {
    RESOURCES.iter().find(|r| r.table == name)
}

/// Column/value pairs ready to bind, in payload order.
pub type WriteSet = Vec<(&'static str, SqlValue)>;

impl ResourceSpec {
    pub fn column_kind(&self, name: &str) -> Option<(&'static str, ColumnKind)> {
        self.columns.iter().find(|(c, _)| *c == name).copied()
    }

    /// Fill the slug, run every field check, and coerce the payload.
    pub fn prepare_create(&self, payload: &mut Map<String, Value>) -> Result<WriteSet, ValidationError> {
        validation::require_fields(self.required, payload)?;

        if let Some(slug) = self.slug {
            let explicit = match payload.get(slug.column) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => return Err(ValidationError::invalid(slug.column, "Expected text")),
            };
            let title = payload.get(slug.from).and_then(Value::as_str).unwrap_or_default();
            let resolved = validation::resolve_slug(explicit.as_deref(), title);
            if resolved.is_empty() {
                return Err(ValidationError::invalid(
                    slug.column,
                    format!("Cannot derive a slug from {}", slug.from),
                ));
            }
            payload.insert(slug.column.to_string(), Value::String(resolved));
        }

        self.check_formats(&*payload, &*payload)?;
        self.coerce(&*payload)
    }

    /// `patch` is what the client sent; `merged` is the stored row with the
    /// patch applied, used for cross-field checks.
    pub fn prepare_update(
        &self,
        patch: &Map<String, Value>,
        merged: &Map<String, Value>,
    ) -> Result<WriteSet, ValidationError> {
        if patch.is_empty() {
            return Err(ValidationError::invalid("body", "No fields to update"));
        }

        let present: Vec<&str> = self
            .required
            .iter()
            .copied()
            .filter(|f| patch.contains_key(*f))
            .collect();
        validation::require_fields(&present, patch)?;

        self.check_formats(patch, merged)?;
        self.coerce(patch)
    }

    fn check_formats(&self, fields: &Map<String, Value>, merged: &Map<String, Value>) -> Result<(), ValidationError> {
        let mut errors = BTreeMap::new();

        for column in self.email_columns {
            if let Some(email) = fields.get(*column).and_then(Value::as_str) {
                if !validation::validate_email(email) {
                    errors.insert(column.to_string(), "Invalid email address".to_string());
                }
            }
        }

        for column in self.image_columns {
            if let Some(name) = fields.get(*column).and_then(Value::as_str) {
                if !name.is_empty() && !validation::validate_file_extension(name, self.image_extensions) {
                    errors.insert(
                        column.to_string(),
                        format!("File type not allowed (expected {})", self.image_extensions.join(", ")),
                    );
                }
            }
        }

        if let Some(slug) = self.slug {
            if let Some(value) = fields.get(slug.column).and_then(Value::as_str) {
                if !validation::validate_slug(value) {
                    errors.insert(
                        slug.column.to_string(),
                        "Slug may only contain lowercase letters, digits and single hyphens".to_string(),
                    );
                }
            }
        }

        if let Some((start_col, end_col)) = self.date_range {
            let start = merged.get(start_col).and_then(parse_temporal);
            let end = merged.get(end_col).and_then(parse_temporal);
            if let (Some(start), Some(end)) = (start, end) {
                if validation::validate_date_range(&start, &end).is_err() {
                    errors.insert(end_col.to_string(), format!("Must be after {}", start_col));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(errors))
        }
    }

    fn coerce(&self, payload: &Map<String, Value>) -> Result<WriteSet, ValidationError> {
        let mut errors = BTreeMap::new();
        let mut out = Vec::with_capacity(payload.len());

        for (key, value) in payload {
            if SYSTEM_COLUMNS.contains(&key.as_str()) {
                errors.insert(key.clone(), "System field cannot be set via API".to_string());
                continue;
            }
            let Some((column, kind)) = self.column_kind(key) else {
                errors.insert(key.clone(), "Unknown field".to_string());
                continue;
            };
            match coerce_value(kind, value) {
                Some(v) => out.push((column, v)),
                None => {
                    errors.insert(key.clone(), format!("Expected {}", kind_name(kind)));
                }
            }
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(ValidationError::Fields(errors))
        }
    }
}

/// Convert a JSON payload value into the bind type of its column.
pub fn coerce_value(kind: ColumnKind, value: &Value) -> Option<SqlValue> {
    if value.is_null() {
        return Some(SqlValue::Null);
    }

    match kind {
        ColumnKind::Text => match value {
            Value::String(s) => Some(SqlValue::Text(s.clone())),
            Value::Number(n) => Some(SqlValue::Text(n.to_string())),
            Value::Bool(b) => Some(SqlValue::Text(b.to_string())),
            _ => None,
        },
        ColumnKind::Integer => match value {
            Value::Number(n) => n.as_i64().map(SqlValue::Int),
            Value::String(s) => s.trim().parse().ok().map(SqlValue::Int),
            _ => None,
        },
        ColumnKind::Decimal => match value {
            Value::Number(n) => n.as_f64().map(SqlValue::Float),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(SqlValue::Float),
            _ => None,
        },
        ColumnKind::Boolean => match value {
            Value::Bool(b) => Some(SqlValue::Bool(*b)),
            Value::String(s) => match s.trim() {
                "true" | "1" => Some(SqlValue::Bool(true)),
                "false" | "0" => Some(SqlValue::Bool(false)),
                _ => None,
            },
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(SqlValue::Bool(true)),
                Some(0) => Some(SqlValue::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        ColumnKind::Timestamp => parse_temporal(value).map(SqlValue::Timestamp),
        ColumnKind::Date => value.as_str().and_then(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.date_naive()))
                .map(SqlValue::Date)
        }),
        ColumnKind::Json => Some(SqlValue::Json(value.clone())),
    }
}

/// RFC 3339 timestamps, or bare dates read as midnight UTC.
fn parse_temporal(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    // `timestamp without time zone` as rendered by row_to_json
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
}

fn kind_name(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Text => "text",
        ColumnKind::Integer => "an integer",
        ColumnKind::Decimal => "a number",
        ColumnKind::Boolean => "a boolean",
        ColumnKind::Timestamp => "an RFC 3339 timestamp or YYYY-MM-DD date",
        ColumnKind::Date => "a YYYY-MM-DD date",
        ColumnKind::Json => "JSON",
    }
}
