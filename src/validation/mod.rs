//! Pure field checks shared by the write handlers. Nothing here performs I/O.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern")
});

static SLUG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug pattern")
});

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    /// Several independent problems collected from one payload.
    #[error("Invalid fields: {}", .0.keys().cloned().collect::<Vec<_>>().join(", "))]
    Fields(BTreeMap<String, String>),
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Per-field messages for the HTTP error body.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        match self {
            ValidationError::MissingFields(fields) => fields
                .iter()
                .map(|f| (f.clone(), "This field is required".to_string()))
                .collect(),
            ValidationError::InvalidField { field, message } => {
                BTreeMap::from([(field.clone(), message.clone())])
            }
            ValidationError::Fields(map) => map.clone(),
        }
    }
}

/// Every listed field that is absent, null, or a blank string. All offenders
/// are reported, in the order they were asked for.
pub fn require_fields(names: &[&str], data: &Map<String, Value>) -> Result<(), ValidationError> {
    let missing: Vec<String> = names
        .iter()
        .filter(|name| match data.get(**name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for c in kept.chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

/// An explicit slug wins untouched; otherwise derive one from the title.
pub fn resolve_slug(explicit: Option<&str>, title: &str) -> String {
    match explicit {
        Some(slug) if !slug.trim().is_empty() => slug.to_string(),
        _ => slugify(title),
    }
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// Case-insensitive match of the final extension against `allow_list`
/// (entries given without the dot).
pub fn validate_file_extension(name: &str, allow_list: &[&str]) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            allow_list.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext))
        }
        _ => false,
    }
}

/// Fails unless `start` is strictly before `end`.
pub fn validate_date_range<T: PartialOrd>(start: &T, end: &T) -> Result<(), ValidationError> {
    if start < end {
        Ok(())
    } else {
        Err(ValidationError::invalid("end_date", "End date must be after start date"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn require_fields_lists_only_the_missing_ones() {
        let data = object(json!({ "title": "x" }));
        let err = require_fields(&["title", "short_desc"], &data).unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(vec!["short_desc".into()]));
    }

    #[test]
    fn require_fields_treats_blank_and_null_as_missing() {
        let data = object(json!({ "name": "  ", "country": null, "summary": "ok", "votes": 0 }));
        let err = require_fields(&["name", "country", "summary", "votes", "cover_image"], &data).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["name".into(), "country".into(), "cover_image".into()])
        );
        assert_eq!(err.to_string(), "Missing required fields: name, country, cover_image");
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Best of Awards 2024!"), "best-of-awards-2024");
        assert_eq!(slugify("  Chef  --  of the Year "), "chef-of-the-year");
        assert_eq!(slugify("Café Déco"), "caf-dco");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn explicit_slug_passes_through() {
        assert_eq!(resolve_slug(Some("Keep_Me"), "Ignored Title"), "Keep_Me");
        assert_eq!(resolve_slug(Some(""), "Fallback Title"), "fallback-title");
        assert_eq!(resolve_slug(None, "Fallback Title"), "fallback-title");
    }

    #[test]
    fn email_format() {
        assert!(validate_email("chef@example.com"));
        assert!(!validate_email("chef@example"));
        assert!(!validate_email("chef example.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn slug_format() {
        assert!(validate_slug("best-of-awards-2024"));
        assert!(!validate_slug("Best-Of"));
        assert!(!validate_slug("double--hyphen"));
        assert!(!validate_slug("-leading"));
    }

    #[test]
    fn file_extension_allow_list() {
        let images = ["jpg", "jpeg", "png", "webp"];
        assert!(validate_file_extension("cover.JPG", &images));
        assert!(validate_file_extension("a.b.png", &images));
        assert!(!validate_file_extension("script.php", &images));
        assert!(!validate_file_extension("png", &images));
        assert!(!validate_file_extension(".png", &images));
    }

    #[test]
    fn date_range_requires_strict_order() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(validate_date_range(&a, &b).is_ok());
        assert!(validate_date_range(&a, &a).is_err());
        assert!(validate_date_range(&b, &a).is_err());
    }
}
