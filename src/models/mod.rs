//! Structural model for document bases
//!
//! Defines the core building blocks of a base definition:
//! - Value kinds (`Index`, `DataType`) and their boolean wrappers
//!   (`Multivalued`, `Required`)
//! - Leaf structures (`Field`) and composite structures (`Group`)
//! - The schema root (`Base`) with its flattened structure registry
//!
//! All constructors validate their input and fail with a
//! [`ConstructionError`]; a partially built structure is never reachable.

pub mod base;
pub mod enums;
pub mod field;
pub mod group;

pub use base::{Base, BaseMetadata, UnknownStructure};
pub use enums::{DataType, Index};
pub use field::{Field, Multivalued, Required};
pub use group::{Group, GroupMetadata, Structure};

/// Error raised while building a structural model value.
///
/// Construction is all-or-nothing: when any of these is returned, no
/// partially initialized structure exists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstructionError {
    /// The supplied index name is not one of the seven valid kinds
    #[error("'{0}' is not a valid index kind")]
    InvalidIndex(String),
    /// The supplied datatype name is not one of the valid kinds
    #[error("'{0}' is not a valid datatype")]
    InvalidDataType(String),
    /// A field must declare at least one index
    #[error("field '{field}' must declare at least one index")]
    EmptyIndices { field: String },
    /// A field's index set contains the same kind more than once
    #[error("field '{field}' declares duplicate indices: {}", .indices.join(", "))]
    DuplicateIndices { field: String, indices: Vec<String> },
    /// A group or base must contain at least one structure
    #[error("{kind} '{name}' must contain at least one structure")]
    EmptyContent { kind: &'static str, name: String },
    /// Structure names must be unique across the whole nested tree
    #[error("base cannot have repeated structure names: {}", .names.join(", "))]
    DuplicateNames { names: Vec<String> },
}
