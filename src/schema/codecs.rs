//! Scalar datatype codecs
//!
//! Each [`DataType`](crate::models::DataType) resolves to one codec: a
//! constructor that receives the field definition and the optional id of
//! the document being validated, and returns the [`ScalarRule`] checking
//! values of that kind. The registry is swappable, so a deployment can
//! override how a given datatype is validated without touching the
//! compiler.
//!
//! Every rule is round-trip safe: it only ever accepts or rejects a
//! value, never rewrites it.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{DataType, Field};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?|ftp|file)://[^\s/$.?#].[^\s]*$").unwrap());

static DECIMAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

/// Compiled validation rule for one scalar datatype.
pub struct ScalarRule {
    check: Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>,
    collects_file: bool,
}

impl ScalarRule {
    pub fn new(check: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static) -> Self {
        ScalarRule {
            check: Box::new(check),
            collects_file: false,
        }
    }

    /// Mark values accepted by this rule for collection into the
    /// validation call's file list.
    pub fn collecting_files(mut self) -> Self {
        self.collects_file = true;
        self
    }

    pub fn check(&self, value: &Value) -> Result<(), String> {
        (self.check)(value)
    }

    pub fn collects_file(&self) -> bool {
        self.collects_file
    }
}

impl fmt::Debug for ScalarRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarRule")
            .field("collects_file", &self.collects_file)
            .finish_non_exhaustive()
    }
}

/// Constructor signature for a scalar codec.
pub type CodecFn = fn(&Field, Option<Uuid>) -> ScalarRule;

/// Registry mapping each datatype to its codec.
///
/// The standard registry is total over every datatype; `register`
/// replaces a single binding.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<DataType, CodecFn>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CodecRegistry {
    /// The standard binding of every datatype to its default codec.
    pub fn standard() -> Self {
        let mut codecs: HashMap<DataType, CodecFn> = HashMap::new();
        for datatype in DataType::ALL {
            codecs.insert(datatype, standard_codec(datatype));
        }
        CodecRegistry { codecs }
    }

    /// Replace the codec bound to one datatype.
    pub fn register(&mut self, datatype: DataType, codec: CodecFn) {
        self.codecs.insert(datatype, codec);
    }

    /// Build the rule for a field, falling back to the standard binding
    /// if the registry was constructed without one.
    pub fn rule(&self, field: &Field, id: Option<Uuid>) -> ScalarRule {
        let codec = self
            .codecs
            .get(&field.datatype())
            .copied()
            .unwrap_or_else(|| standard_codec(field.datatype()));
        codec(field, id)
    }
}

fn standard_codec(datatype: DataType) -> CodecFn {
    match datatype {
        DataType::Boolean => codec_boolean,
        DataType::Integer => codec_integer,
        DataType::Decimal | DataType::Money => codec_decimal,
        DataType::Text
        | DataType::TextArea
        | DataType::Html
        | DataType::Password
        | DataType::SelfEnumerated => codec_text,
        DataType::Email => codec_email,
        DataType::Url => codec_url,
        DataType::Date => codec_date,
        DataType::Time => codec_time,
        DataType::DateTime => codec_datetime,
        DataType::Json => codec_json,
        DataType::Document
        | DataType::File
        | DataType::Image
        | DataType::Sound
        | DataType::Video => codec_file,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn codec_boolean(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| {
        if value.is_boolean() {
            Ok(())
        } else {
            Err(format!("expected a boolean, got {}", value_kind(value)))
        }
    })
}

fn codec_integer(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| {
        if value.is_i64() || value.is_u64() {
            Ok(())
        } else {
            Err(format!("expected an integer, got {}", value_kind(value)))
        }
    })
}

fn codec_decimal(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| match value {
        Value::Number(_) => Ok(()),
        Value::String(text) if DECIMAL_REGEX.is_match(text) => Ok(()),
        Value::String(text) => Err(format!("'{text}' is not a decimal number")),
        other => Err(format!(
            "expected a number or decimal string, got {}",
            value_kind(other)
        )),
    })
}

fn codec_text(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| {
        if value.is_string() {
            Ok(())
        } else {
            Err(format!("expected a string, got {}", value_kind(value)))
        }
    })
}

fn codec_email(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| match value {
        Value::String(text) if EMAIL_REGEX.is_match(text) => Ok(()),
        Value::String(text) => Err(format!("'{text}' is not a valid email address")),
        other => Err(format!("expected an email string, got {}", value_kind(other))),
    })
}

fn codec_url(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| match value {
        Value::String(text) if URL_REGEX.is_match(text) => Ok(()),
        Value::String(text) => Err(format!("'{text}' is not a valid URL")),
        other => Err(format!("expected a URL string, got {}", value_kind(other))),
    })
}

fn codec_date(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| match value {
        Value::String(text) if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() => Ok(()),
        Value::String(text) => Err(format!("'{text}' is not a date (expected YYYY-MM-DD)")),
        other => Err(format!("expected a date string, got {}", value_kind(other))),
    })
}

fn codec_time(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| match value {
        Value::String(text) if NaiveTime::parse_from_str(text, "%H:%M:%S").is_ok() => Ok(()),
        Value::String(text) => Err(format!("'{text}' is not a time (expected HH:MM:SS)")),
        other => Err(format!("expected a time string, got {}", value_kind(other))),
    })
}

fn codec_datetime(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| match value {
        Value::String(text)
            if DateTime::parse_from_rfc3339(text).is_ok()
                || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok() =>
        {
            Ok(())
        }
        Value::String(text) => Err(format!("'{text}' is not an ISO 8601 date-time")),
        other => Err(format!(
            "expected a date-time string, got {}",
            value_kind(other)
        )),
    })
}

fn codec_json(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|_value| Ok(()))
}

/// File-like values are either a string reference (an id or a URL) or a
/// mapping carrying a `filename` plus inline base64 `content` or a
/// `url`. Accepted values are collected into the validation call's file
/// list.
fn codec_file(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
    ScalarRule::new(|value| match value {
        Value::String(text) if !text.is_empty() => Ok(()),
        Value::String(_) => Err("file reference must not be empty".to_string()),
        Value::Object(object) => {
            match object.get("filename") {
                Some(Value::String(name)) if !name.is_empty() => {}
                _ => return Err("file mapping requires a non-empty 'filename'".to_string()),
            }
            match (object.get("content"), object.get("url")) {
                (Some(Value::String(content)), _) => BASE64
                    .decode(content)
                    .map(|_| ())
                    .map_err(|_| "file 'content' is not valid base64".to_string()),
                (None, Some(Value::String(_))) => Ok(()),
                (Some(other), _) => Err(format!(
                    "file 'content' must be a base64 string, got {}",
                    value_kind(other)
                )),
                (None, _) => Err("file mapping requires 'content' or 'url'".to_string()),
            }
        }
        other => Err(format!(
            "expected a file reference or mapping, got {}",
            value_kind(other)
        )),
    })
    .collecting_files()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Index, Multivalued, Required};
    use serde_json::json;

    fn field(datatype: DataType) -> Field {
        Field::new(
            "value",
            "Value",
            "",
            datatype,
            vec![Index::None],
            Multivalued::new(false),
            Required::new(false),
        )
        .unwrap()
    }

    fn check(datatype: DataType, value: Value) -> Result<(), String> {
        CodecRegistry::standard()
            .rule(&field(datatype), None)
            .check(&value)
    }

    #[test]
    fn test_integer() {
        assert!(check(DataType::Integer, json!(30)).is_ok());
        assert!(check(DataType::Integer, json!("thirty")).is_err());
        assert!(check(DataType::Integer, json!(30.5)).is_err());
    }

    #[test]
    fn test_decimal_and_money() {
        assert!(check(DataType::Decimal, json!(12.5)).is_ok());
        assert!(check(DataType::Decimal, json!("12.50")).is_ok());
        assert!(check(DataType::Money, json!("-3.99")).is_ok());
        assert!(check(DataType::Money, json!("3,99")).is_err());
    }

    #[test]
    fn test_email() {
        assert!(check(DataType::Email, json!("user@example.com")).is_ok());
        assert!(check(DataType::Email, json!("not-an-email")).is_err());
    }

    #[test]
    fn test_url() {
        assert!(check(DataType::Url, json!("https://example.com/a")).is_ok());
        assert!(check(DataType::Url, json!("example.com")).is_err());
    }

    #[test]
    fn test_temporal() {
        assert!(check(DataType::Date, json!("2024-01-15")).is_ok());
        assert!(check(DataType::Date, json!("15/01/2024")).is_err());
        assert!(check(DataType::Time, json!("10:30:00")).is_ok());
        assert!(check(DataType::DateTime, json!("2024-01-15T10:30:00Z")).is_ok());
        assert!(check(DataType::DateTime, json!("2024-01-15T10:30:00")).is_ok());
        assert!(check(DataType::DateTime, json!("2024-01-15")).is_err());
    }

    #[test]
    fn test_json_accepts_anything() {
        assert!(check(DataType::Json, json!({"nested": [1, 2]})).is_ok());
        assert!(check(DataType::Json, json!(null)).is_ok());
    }

    #[test]
    fn test_file() {
        assert!(check(DataType::File, json!("6f1c7a")).is_ok());
        assert!(check(DataType::File, json!({"filename": "a.pdf", "url": "https://x/a.pdf"})).is_ok());
        assert!(check(DataType::File, json!({"filename": "a.pdf", "content": "aGVsbG8="})).is_ok());
        assert!(check(DataType::File, json!({"filename": "a.pdf", "content": "!!"})).is_err());
        assert!(check(DataType::File, json!({"url": "https://x/a.pdf"})).is_err());
        assert!(check(DataType::File, json!(7)).is_err());
    }

    #[test]
    fn test_file_rules_collect() {
        let registry = CodecRegistry::standard();
        assert!(registry.rule(&field(DataType::Image), None).collects_file());
        assert!(!registry.rule(&field(DataType::Text), None).collects_file());
    }

    #[test]
    fn test_register_overrides() {
        fn loose_integer(_field: &Field, _id: Option<Uuid>) -> ScalarRule {
            ScalarRule::new(|value| {
                if value.is_number() {
                    Ok(())
                } else {
                    Err("expected a number".to_string())
                }
            })
        }
        let mut registry = CodecRegistry::standard();
        registry.register(DataType::Integer, loose_integer);
        assert!(
            registry
                .rule(&field(DataType::Integer), None)
                .check(&json!(30.5))
                .is_ok()
        );
    }
}
