//! Field model
//!
//! A field is a leaf structure: a named attribute with a datatype, an
//! index set, a multiplicity and a required flag.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::enums::{DataType, Index};
use super::ConstructionError;

/// Whether a structure holds an ordered sequence of values rather than a
/// single one.
///
/// Kept as a wrapper type rather than a raw boolean so structural nodes
/// serialize and validate it uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Multivalued(bool);

impl Multivalued {
    pub fn new(value: bool) -> Self {
        Multivalued(value)
    }

    pub fn value(&self) -> bool {
        self.0
    }
}

impl From<bool> for Multivalued {
    fn from(value: bool) -> Self {
        Multivalued(value)
    }
}

/// Whether a field must be present in every conforming document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Required(bool);

impl Required {
    pub fn new(value: bool) -> Self {
        Required(value)
    }

    pub fn value(&self) -> bool {
        self.0
    }
}

impl From<bool> for Required {
    fn from(value: bool) -> Self {
        Required(value)
    }
}

/// Leaf structure of a base definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    alias: String,
    description: String,
    datatype: DataType,
    indices: Vec<Index>,
    multivalued: Multivalued,
    required: Required,
}

impl Field {
    /// Build a field, validating its index set.
    ///
    /// The index set must be non-empty and free of duplicates; the error
    /// lists every duplicated kind, not just the first.
    pub fn new(
        name: impl Into<String>,
        alias: impl Into<String>,
        description: impl Into<String>,
        datatype: DataType,
        indices: Vec<Index>,
        multivalued: Multivalued,
        required: Required,
    ) -> Result<Self, ConstructionError> {
        let name = name.into();

        if indices.is_empty() {
            return Err(ConstructionError::EmptyIndices { field: name });
        }
        let mut seen = HashSet::new();
        let mut duplicated: Vec<String> = Vec::new();
        for index in &indices {
            if !seen.insert(*index) && !duplicated.contains(&index.to_string()) {
                duplicated.push(index.to_string());
            }
        }
        if !duplicated.is_empty() {
            return Err(ConstructionError::DuplicateIndices {
                field: name,
                indices: duplicated,
            });
        }

        Ok(Field {
            name,
            alias: alias.into(),
            description: description.into(),
            datatype,
            indices,
            multivalued,
            required,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn indices(&self) -> &[Index] {
        &self.indices
    }

    pub fn multivalued(&self) -> bool {
        self.multivalued.value()
    }

    pub fn required(&self) -> bool {
        self.required.value()
    }

    /// Whether this field is relational: its index set intersects
    /// {Ordered, Unique, Empty}.
    pub fn is_rel(&self) -> bool {
        self.indices.iter().any(|i| i.is_relational())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with_indices(indices: Vec<Index>) -> Result<Field, ConstructionError> {
        Field::new(
            "year",
            "Year",
            "publication year",
            DataType::Integer,
            indices,
            Multivalued::new(false),
            Required::new(true),
        )
    }

    #[test]
    fn test_empty_indices_rejected() {
        let err = field_with_indices(vec![]).unwrap_err();
        assert_eq!(
            err,
            ConstructionError::EmptyIndices {
                field: "year".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_indices_rejected() {
        let err =
            field_with_indices(vec![Index::Textual, Index::Ordered, Index::Textual]).unwrap_err();
        assert_eq!(
            err,
            ConstructionError::DuplicateIndices {
                field: "year".to_string(),
                indices: vec!["Textual".to_string()],
            }
        );
    }

    #[test]
    fn test_wrappers_from_bool() {
        let multivalued: Multivalued = true.into();
        let required: Required = false.into();
        assert!(multivalued.value());
        assert!(!required.value());
    }

    #[test]
    fn test_is_rel_over_every_index_kind() {
        for index in Index::ALL {
            let field = field_with_indices(vec![index]).unwrap();
            assert_eq!(
                field.is_rel(),
                matches!(index, Index::Ordered | Index::Unique | Index::Empty),
                "index {index}"
            );
        }
    }
}
