//! Path-based addressing into document instances
//!
//! A path is an ordered sequence of structure names, each optionally
//! paired with a sequence index (required when descending through a
//! multivalued group). The text form follows the REST convention of the
//! serialized documents: `/`-separated, with a purely numeric segment
//! acting as the index of the preceding name, e.g.
//! `dependents/0/dep_name`.
//!
//! All four operations treat the input document as copy-on-write: the
//! mutating ones return an updated clone and never touch the original.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::convert;
use crate::models::Base;

use super::{Document, Member, MemberDef, MemberKind};

/// One step of a path: a structure name, optionally indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub index: Option<usize>,
}

impl PathSegment {
    pub fn named(name: impl Into<String>) -> Self {
        PathSegment {
            name: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        PathSegment {
            name: name.into(),
            index: Some(index),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}/{}", self.name, index),
            None => f.write_str(&self.name),
        }
    }
}

/// A parsed structural path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Path { segments }
    }

    /// Parse the `/`-separated text form.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let mut segments: Vec<PathSegment> = Vec::new();
        for token in text.split('/').filter(|t| !t.is_empty()) {
            if token.chars().all(|c| c.is_ascii_digit()) {
                let index: usize = token.parse().map_err(|_| PathError::Malformed {
                    path: text.to_string(),
                    reason: format!("sequence index '{token}' is out of range"),
                })?;
                match segments.last_mut() {
                    Some(segment) if segment.index.is_none() => segment.index = Some(index),
                    _ => {
                        return Err(PathError::Malformed {
                            path: text.to_string(),
                            reason: format!(
                                "sequence index '{token}' has no preceding structure name"
                            ),
                        });
                    }
                }
            } else {
                segments.push(PathSegment::named(token));
            }
        }
        Ok(Path { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Path resolution failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    /// A segment names an unknown or unset structure, or indexes past the
    /// end of a sequence
    #[error("path '{path}' not found at segment '{segment}'")]
    NotFound { path: String, segment: String },
    /// The path or value shape disagrees with the node's multiplicity
    #[error("path '{path}': {reason}")]
    TypeMismatch { path: String, reason: String },
    /// The path text itself is invalid
    #[error("malformed path '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

/// A value read out of a document by path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathValue<'a> {
    /// A field value (or one element of a multivalued field)
    Value(&'a Value),
    /// A nested document
    Document(&'a Document),
    /// A whole multivalued-group sequence, when the path stops at its name
    Documents(&'a [Document]),
}

enum Op {
    Set(Value),
    Put(Value),
    Delete,
}

impl Base {
    /// Read the value at `path` inside `document`.
    pub fn get_path<'a>(
        &self,
        document: &'a Document,
        path: &Path,
    ) -> Result<PathValue<'a>, PathError> {
        if path.is_empty() {
            return Err(empty_path(path));
        }
        let mut doc = document;
        let last = path.segments.len() - 1;
        for (i, segment) in path.segments.iter().enumerate() {
            let def = self.member_def(doc, segment, path)?;
            let member = doc.get(&segment.name).ok_or_else(|| PathError::NotFound {
                path: path.to_string(),
                segment: segment.name.clone(),
            })?;
            match member {
                Member::Value(value) => {
                    if i != last {
                        // fields are leaves; anything below is unknown
                        return Err(PathError::NotFound {
                            path: path.to_string(),
                            segment: path.segments[i + 1].name.clone(),
                        });
                    }
                    let target = index_into_value(value, def, segment, path)?;
                    return Ok(PathValue::Value(target));
                }
                Member::Document(nested) => {
                    if segment.index.is_some() {
                        return Err(not_multivalued(&segment.name, path));
                    }
                    if i == last {
                        return Ok(PathValue::Document(nested));
                    }
                    doc = nested;
                }
                Member::Documents(sequence) => match segment.index {
                    Some(index) => {
                        let nested =
                            sequence
                                .get(index)
                                .ok_or_else(|| PathError::NotFound {
                                    path: path.to_string(),
                                    segment: segment.to_string(),
                                })?;
                        if i == last {
                            return Ok(PathValue::Document(nested));
                        }
                        doc = nested;
                    }
                    None => {
                        if i == last {
                            return Ok(PathValue::Documents(sequence));
                        }
                        return Err(PathError::TypeMismatch {
                            path: path.to_string(),
                            reason: format!(
                                "'{}' is multivalued; a sequence index is required to descend",
                                segment.name
                            ),
                        });
                    }
                },
            }
        }
        Err(empty_path(path))
    }

    /// Return a copy of `document` with the value at `path` replaced.
    pub fn set_path(
        &self,
        document: &Document,
        path: &Path,
        value: Value,
    ) -> Result<Document, PathError> {
        let mut updated = document.clone();
        self.apply(&mut updated, path.segments(), path, Op::Set(value))?;
        Ok(updated)
    }

    /// Like [`set_path`](Base::set_path), but when the terminal node is
    /// multivalued and the path carries no index, the value is appended
    /// as a new sequence element instead of replacing.
    pub fn put_path(
        &self,
        document: &Document,
        path: &Path,
        value: Value,
    ) -> Result<Document, PathError> {
        let mut updated = document.clone();
        self.apply(&mut updated, path.segments(), path, Op::Put(value))?;
        Ok(updated)
    }

    /// Return a copy of `document` with the value at `path` removed.
    /// Removing a sequence element shifts the elements after it down.
    pub fn delete_path(&self, document: &Document, path: &Path) -> Result<Document, PathError> {
        let mut updated = document.clone();
        self.apply(&mut updated, path.segments(), path, Op::Delete)?;
        Ok(updated)
    }

    fn apply(
        &self,
        doc: &mut Document,
        segments: &[PathSegment],
        path: &Path,
        op: Op,
    ) -> Result<(), PathError> {
        let (segment, rest) = segments.split_first().ok_or_else(|| empty_path(path))?;
        if rest.is_empty() {
            return self.apply_terminal(doc, segment, path, op);
        }

        let _ = self.member_def(doc, segment, path)?;
        let member = doc
            .get_mut(&segment.name)
            .ok_or_else(|| PathError::NotFound {
                path: path.to_string(),
                segment: segment.name.clone(),
            })?;
        let nested = match member {
            Member::Value(_) => {
                return Err(PathError::NotFound {
                    path: path.to_string(),
                    segment: rest[0].name.clone(),
                });
            }
            Member::Document(nested) => {
                if segment.index.is_some() {
                    return Err(not_multivalued(&segment.name, path));
                }
                nested
            }
            Member::Documents(sequence) => {
                let index = segment.index.ok_or_else(|| PathError::TypeMismatch {
                    path: path.to_string(),
                    reason: format!(
                        "'{}' is multivalued; a sequence index is required to descend",
                        segment.name
                    ),
                })?;
                sequence.get_mut(index).ok_or_else(|| PathError::NotFound {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?
            }
        };
        self.apply(nested, rest, path, op)
    }

    fn apply_terminal(
        &self,
        doc: &mut Document,
        segment: &PathSegment,
        path: &Path,
        op: Op,
    ) -> Result<(), PathError> {
        let def = self.member_def(doc, segment, path)?.clone();
        match op {
            Op::Set(value) => self.write_member(doc, &def, segment, path, value, false),
            Op::Put(value) => self.write_member(doc, &def, segment, path, value, true),
            Op::Delete => delete_member(doc, &def, segment, path),
        }
    }

    fn write_member(
        &self,
        doc: &mut Document,
        def: &MemberDef,
        segment: &PathSegment,
        path: &Path,
        value: Value,
        append: bool,
    ) -> Result<(), PathError> {
        match def.kind() {
            MemberKind::Field(_) => {
                match (def.multivalued(), segment.index) {
                    (true, Some(index)) => {
                        let member =
                            doc.get_mut(&segment.name)
                                .ok_or_else(|| PathError::NotFound {
                                    path: path.to_string(),
                                    segment: segment.name.clone(),
                                })?;
                        let elements = member_as_array(member, segment, path)?;
                        let slot =
                            elements
                                .get_mut(index)
                                .ok_or_else(|| PathError::NotFound {
                                    path: path.to_string(),
                                    segment: segment.to_string(),
                                })?;
                        *slot = value;
                    }
                    (true, None) if append => match doc.get_mut(&segment.name) {
                        Some(member) => {
                            member_as_array(member, segment, path)?.push(value);
                        }
                        None => {
                            doc.insert(
                                segment.name.clone(),
                                Member::Value(Value::Array(vec![value])),
                            );
                        }
                    },
                    (true, None) => {
                        if !value.is_array() {
                            return Err(PathError::TypeMismatch {
                                path: path.to_string(),
                                reason: format!(
                                    "'{}' is multivalued; replacing it takes a sequence",
                                    segment.name
                                ),
                            });
                        }
                        doc.insert(segment.name.clone(), Member::Value(value));
                    }
                    (false, Some(_)) => return Err(not_multivalued(&segment.name, path)),
                    (false, None) => {
                        doc.insert(segment.name.clone(), Member::Value(value));
                    }
                }
                Ok(())
            }
            MemberKind::Group(type_name) => {
                match (def.multivalued(), segment.index) {
                    (true, Some(index)) => {
                        let nested = self.lift(type_name, value, path)?;
                        let member =
                            doc.get_mut(&segment.name)
                                .ok_or_else(|| PathError::NotFound {
                                    path: path.to_string(),
                                    segment: segment.name.clone(),
                                })?;
                        let sequence = member_as_documents(member, segment, path)?;
                        let slot =
                            sequence
                                .get_mut(index)
                                .ok_or_else(|| PathError::NotFound {
                                    path: path.to_string(),
                                    segment: segment.to_string(),
                                })?;
                        *slot = nested;
                    }
                    (true, None) if append => {
                        let nested = self.lift(type_name, value, path)?;
                        match doc.get_mut(&segment.name) {
                            Some(member) => {
                                member_as_documents(member, segment, path)?.push(nested);
                            }
                            None => {
                                doc.insert(segment.name.clone(), Member::Documents(vec![nested]));
                            }
                        }
                    }
                    (true, None) => {
                        let elements = match value {
                            Value::Array(elements) => elements,
                            _ => {
                                return Err(PathError::TypeMismatch {
                                    path: path.to_string(),
                                    reason: format!(
                                        "'{}' is multivalued; replacing it takes a sequence",
                                        segment.name
                                    ),
                                });
                            }
                        };
                        let mut sequence = Vec::with_capacity(elements.len());
                        for element in elements {
                            sequence.push(self.lift(type_name, element, path)?);
                        }
                        doc.insert(segment.name.clone(), Member::Documents(sequence));
                    }
                    (false, Some(_)) => return Err(not_multivalued(&segment.name, path)),
                    (false, None) => {
                        let nested = self.lift(type_name, value, path)?;
                        doc.insert(segment.name.clone(), Member::Document(nested));
                    }
                }
                Ok(())
            }
        }
    }

    fn lift(&self, type_name: &str, value: Value, path: &Path) -> Result<Document, PathError> {
        convert::lift_into(self, type_name, &value).map_err(|err| PathError::TypeMismatch {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }

    fn member_def<'a>(
        &'a self,
        doc: &Document,
        segment: &PathSegment,
        path: &Path,
    ) -> Result<&'a MemberDef, PathError> {
        let ty = self
            .type_by_name(doc.type_name())
            .map_err(|err| PathError::NotFound {
                path: path.to_string(),
                segment: err.name,
            })?;
        ty.member(&segment.name).ok_or_else(|| PathError::NotFound {
            path: path.to_string(),
            segment: segment.name.clone(),
        })
    }
}

fn delete_member(
    doc: &mut Document,
    def: &MemberDef,
    segment: &PathSegment,
    path: &Path,
) -> Result<(), PathError> {
    match segment.index {
        Some(index) => {
            if !def.multivalued() {
                return Err(not_multivalued(&segment.name, path));
            }
            let member = doc
                .get_mut(&segment.name)
                .ok_or_else(|| PathError::NotFound {
                    path: path.to_string(),
                    segment: segment.name.clone(),
                })?;
            match member {
                Member::Value(value) => {
                    let elements = value.as_array_mut().ok_or_else(|| PathError::TypeMismatch {
                        path: path.to_string(),
                        reason: format!("'{}' does not hold a sequence", segment.name),
                    })?;
                    if index >= elements.len() {
                        return Err(PathError::NotFound {
                            path: path.to_string(),
                            segment: segment.to_string(),
                        });
                    }
                    elements.remove(index);
                }
                Member::Documents(sequence) => {
                    if index >= sequence.len() {
                        return Err(PathError::NotFound {
                            path: path.to_string(),
                            segment: segment.to_string(),
                        });
                    }
                    sequence.remove(index);
                }
                Member::Document(_) => return Err(not_multivalued(&segment.name, path)),
            }
        }
        None => {
            if doc.remove(&segment.name).is_none() {
                return Err(PathError::NotFound {
                    path: path.to_string(),
                    segment: segment.name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn index_into_value<'a>(
    value: &'a Value,
    def: &MemberDef,
    segment: &PathSegment,
    path: &Path,
) -> Result<&'a Value, PathError> {
    match (def.multivalued(), segment.index) {
        (true, Some(index)) => {
            let elements = value.as_array().ok_or_else(|| PathError::TypeMismatch {
                path: path.to_string(),
                reason: format!("'{}' does not hold a sequence", segment.name),
            })?;
            elements.get(index).ok_or_else(|| PathError::NotFound {
                path: path.to_string(),
                segment: segment.to_string(),
            })
        }
        (false, Some(_)) => Err(not_multivalued(&segment.name, path)),
        (_, None) => Ok(value),
    }
}

fn member_as_array<'a>(
    member: &'a mut Member,
    segment: &PathSegment,
    path: &Path,
) -> Result<&'a mut Vec<Value>, PathError> {
    match member {
        Member::Value(Value::Array(elements)) => Ok(elements),
        _ => Err(PathError::TypeMismatch {
            path: path.to_string(),
            reason: format!("'{}' does not hold a sequence", segment.name),
        }),
    }
}

fn member_as_documents<'a>(
    member: &'a mut Member,
    segment: &PathSegment,
    path: &Path,
) -> Result<&'a mut Vec<Document>, PathError> {
    match member {
        Member::Documents(sequence) => Ok(sequence),
        _ => Err(PathError::TypeMismatch {
            path: path.to_string(),
            reason: format!("'{}' does not hold a document sequence", segment.name),
        }),
    }
}

fn not_multivalued(name: &str, path: &Path) -> PathError {
    PathError::TypeMismatch {
        path: path.to_string(),
        reason: format!("'{name}' is not multivalued and takes no sequence index"),
    }
}

fn empty_path(path: &Path) -> PathError {
    PathError::Malformed {
        path: path.to_string(),
        reason: "path has no segments".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attaches_indices() {
        let path = Path::parse("dependents/0/dep_name").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::indexed("dependents", 0),
                PathSegment::named("dep_name"),
            ]
        );
        assert_eq!(path.to_string(), "dependents/0/dep_name");
    }

    #[test]
    fn test_parse_leading_index_rejected() {
        let err = Path::parse("0/dep_name").unwrap_err();
        assert!(matches!(err, PathError::Malformed { .. }));
    }

    #[test]
    fn test_parse_double_index_rejected() {
        let err = Path::parse("dependents/0/1").unwrap_err();
        assert!(matches!(err, PathError::Malformed { .. }));
    }
}
