//! Validation run
//!
//! Runs a compiled schema against a serialized document. Failures are
//! aggregated: the walker accumulates `(path, reason)` pairs across the
//! whole tree and raises a single [`ValidationError`] listing all of
//! them, so a caller can surface every problem at once.
//!
//! A successful run returns a [`ValidatedDocument`]: the document (with
//! its `_metadata` reattached) together with the side data extracted
//! while walking — relational field values and file references. The side
//! data is scoped to the call; a failed validation returns only the
//! error and leaves no residual state anywhere.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::Base;
use crate::schema::{CodecRegistry, Validator};

/// Reserved key carrying document-level metadata; stripped before
/// validation and reattached after.
pub const METADATA_KEY: &str = "_metadata";

/// One failed check: where and why.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// `/`-separated path of the failing value, e.g. `dependents/0/age`
    pub path: String,
    pub reason: String,
}

/// Aggregated validation failure for one document.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("document failed validation with {} issue(s): {}", .issues.len(), summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| {
            if issue.path.is_empty() {
                issue.reason.clone()
            } else {
                format!("{}: {}", issue.path, issue.reason)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A file reference extracted from a file-like field during validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRef {
    /// Name of the field the reference came from
    pub field: String,
    /// Path of the value inside the document
    pub path: String,
    /// The reference value, verbatim
    pub value: Value,
}

/// Outcome of a successful validation: the document plus the side data
/// extracted for the storage layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDocument {
    /// The validated serialized document, `_metadata` included
    pub document: Value,
    /// Extracted relational values, keyed by field name
    pub relational: BTreeMap<String, Value>,
    /// Extracted file references, in document order
    pub files: Vec<FileRef>,
    /// Reserved for future per-document extensions; always empty
    pub extensions: Vec<Value>,
}

impl Base {
    /// Validate a serialized document against this base using the
    /// standard codec registry.
    pub fn validate(&self, document: Value) -> Result<ValidatedDocument, ValidationError> {
        self.validate_with(&CodecRegistry::standard(), document)
    }

    /// Validate a serialized document with an explicit codec registry.
    pub fn validate_with(
        &self,
        codecs: &CodecRegistry,
        mut document: Value,
    ) -> Result<ValidatedDocument, ValidationError> {
        let metadata = document
            .as_object_mut()
            .and_then(|object| object.remove(METADATA_KEY));
        let id = metadata
            .as_ref()
            .and_then(|meta| meta.get("id"))
            .and_then(|value| value.as_str())
            .and_then(|text| Uuid::parse_str(text).ok());

        let schema = self.schema(codecs, id);
        let mut walk = Walk::default();
        walk.run(&schema, &document, &mut Vec::new());

        if !walk.issues.is_empty() {
            debug!(
                base = %self.name(),
                issues = walk.issues.len(),
                "document rejected"
            );
            return Err(ValidationError {
                issues: walk.issues,
            });
        }

        if let Some(meta) = metadata
            && let Some(object) = document.as_object_mut()
        {
            object.insert(METADATA_KEY.to_string(), meta);
        }

        let relational = walk
            .relational
            .into_iter()
            .map(|(name, mut occurrences)| {
                let value = if occurrences.len() == 1 {
                    occurrences.remove(0)
                } else {
                    Value::Array(occurrences)
                };
                (name, value)
            })
            .collect();

        Ok(ValidatedDocument {
            document,
            relational,
            files: walk.files,
            extensions: Vec::new(),
        })
    }
}

#[derive(Default)]
struct Walk {
    issues: Vec<ValidationIssue>,
    relational: BTreeMap<String, Vec<Value>>,
    files: Vec<FileRef>,
}

impl Walk {
    fn run(&mut self, validator: &Validator, value: &Value, path: &mut Vec<String>) {
        match validator {
            Validator::Scalar(scalar) => match scalar.rule.check(value) {
                Ok(()) => {
                    if scalar.rule.collects_file() {
                        self.collect_file(&scalar.field_name, value, path);
                    }
                }
                Err(reason) => self.issue(path, reason),
            },
            Validator::Sequence(inner) => match value {
                Value::Array(elements) => {
                    for (i, element) in elements.iter().enumerate() {
                        path.push(i.to_string());
                        self.run(inner, element, path);
                        path.pop();
                    }
                }
                other => self.issue(
                    path,
                    format!("expected a sequence, got {}", kind_of(other)),
                ),
            },
            Validator::Object(object) => match value {
                Value::Object(map) => {
                    for member in &object.members {
                        match map.get(&member.name) {
                            Some(entry) => {
                                let before = self.issues.len();
                                path.push(member.name.clone());
                                self.run(&member.validator, entry, path);
                                path.pop();
                                if member.relational && self.issues.len() == before {
                                    self.relational
                                        .entry(member.name.clone())
                                        .or_default()
                                        .push(entry.clone());
                                }
                            }
                            None if member.required => {
                                path.push(member.name.clone());
                                self.issue(path, "required structure is missing".to_string());
                                path.pop();
                            }
                            None => {}
                        }
                    }
                    for key in map.keys() {
                        if !object.members.iter().any(|member| member.name == *key) {
                            path.push(key.clone());
                            self.issue(path, "unknown structure".to_string());
                            path.pop();
                        }
                    }
                }
                other => self.issue(
                    path,
                    format!("expected a mapping, got {}", kind_of(other)),
                ),
            },
        }
    }

    fn collect_file(&mut self, field: &str, value: &Value, path: &[String]) {
        self.files.push(FileRef {
            field: field.to_string(),
            path: path.join("/"),
            value: value.clone(),
        });
    }

    fn issue(&mut self, path: &[String], reason: String) {
        self.issues.push(ValidationIssue {
            path: path.join("/"),
            reason,
        });
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
