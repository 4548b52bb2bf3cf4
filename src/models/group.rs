//! Group model
//!
//! A group is a named composite structure holding an ordered list of
//! fields and nested groups. Structure names must be unique across the
//! whole subtree rooted at the group.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::field::{Field, Multivalued};
use super::ConstructionError;

/// Metadata block of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    pub multivalued: Multivalued,
}

/// Composite structure of a base definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    metadata: GroupMetadata,
    content: Vec<Structure>,
}

impl Group {
    /// Build a group, validating that its content is non-empty and that
    /// every structure name in the nested tree is distinct.
    pub fn new(metadata: GroupMetadata, content: Vec<Structure>) -> Result<Self, ConstructionError> {
        if content.is_empty() {
            return Err(ConstructionError::EmptyContent {
                kind: "group",
                name: metadata.name,
            });
        }

        let mut names = Vec::new();
        for structure in &content {
            structure.collect_names(&mut names);
        }
        let repeated = repeated_names(&names);
        if !repeated.is_empty() {
            return Err(ConstructionError::DuplicateNames { names: repeated });
        }

        Ok(Group { metadata, content })
    }

    pub fn metadata(&self) -> &GroupMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn content(&self) -> &[Structure] {
        &self.content
    }

    pub fn multivalued(&self) -> bool {
        self.metadata.multivalued.value()
    }

    /// The relational fields of the nested tree, flattened by name.
    pub fn relational_fields(&self) -> Vec<&Field> {
        let mut fields = Vec::new();
        for structure in &self.content {
            match structure {
                Structure::Field(field) if field.is_rel() => fields.push(field),
                Structure::Field(_) => {}
                Structure::Group(group) => fields.extend(group.relational_fields()),
            }
        }
        fields
    }
}

/// A content entry of a base or group: either a leaf field or a nested
/// group. All call sites pattern-match on this, so adding a variant is a
/// compile-time-visible change.
#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    Field(Field),
    Group(Group),
}

impl Structure {
    pub fn name(&self) -> &str {
        match self {
            Structure::Field(field) => field.name(),
            Structure::Group(group) => group.name(),
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self, Structure::Field(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Structure::Group(_))
    }

    pub fn multivalued(&self) -> bool {
        match self {
            Structure::Field(field) => field.multivalued(),
            Structure::Group(group) => group.multivalued(),
        }
    }

    /// Required only ever applies to fields; groups are always optional
    /// containers.
    pub fn required(&self) -> bool {
        match self {
            Structure::Field(field) => field.required(),
            Structure::Group(_) => false,
        }
    }

    pub(crate) fn collect_names(&self, out: &mut Vec<String>) {
        out.push(self.name().to_string());
        if let Structure::Group(group) = self {
            for child in group.content() {
                child.collect_names(out);
            }
        }
    }
}

/// Every name that occurs more than once, in first-occurrence order.
pub(crate) fn repeated_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut repeated = Vec::new();
    for name in names {
        if !seen.insert(name.as_str()) && !repeated.contains(name) {
            repeated.push(name.clone());
        }
    }
    repeated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{DataType, Index};
    use crate::models::field::Required;

    fn sample_field(name: &str) -> Field {
        Field::new(
            name,
            name,
            "",
            DataType::Text,
            vec![Index::Textual],
            Multivalued::new(false),
            Required::new(false),
        )
        .unwrap()
    }

    fn metadata(name: &str) -> GroupMetadata {
        GroupMetadata {
            name: name.to_string(),
            alias: String::new(),
            description: String::new(),
            multivalued: Multivalued::new(false),
        }
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = Group::new(metadata("empty"), vec![]).unwrap_err();
        assert_eq!(
            err,
            ConstructionError::EmptyContent {
                kind: "group",
                name: "empty".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_names_reported_completely() {
        let inner = Group::new(
            metadata("inner"),
            vec![
                Structure::Field(sample_field("city")),
                Structure::Field(sample_field("country")),
            ],
        )
        .unwrap();
        let err = Group::new(
            metadata("outer"),
            vec![
                Structure::Field(sample_field("city")),
                Structure::Field(sample_field("country")),
                Structure::Group(inner),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::DuplicateNames {
                names: vec!["city".to_string(), "country".to_string()],
            }
        );
    }

    #[test]
    fn test_relational_fields_flattened() {
        let rel = Field::new(
            "id",
            "Id",
            "",
            DataType::Integer,
            vec![Index::Unique],
            Multivalued::new(false),
            Required::new(true),
        )
        .unwrap();
        let inner = Group::new(metadata("inner"), vec![Structure::Field(rel)]).unwrap();
        let outer = Group::new(
            metadata("outer"),
            vec![
                Structure::Field(sample_field("note")),
                Structure::Group(inner),
            ],
        )
        .unwrap();
        let names: Vec<&str> = outer.relational_fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id"]);
    }
}
