//! Docbase SDK - Shared library for document base operations
//!
//! Provides unified interfaces for:
//! - Structural modelling of document bases (fields, groups, bases)
//! - Validation schema compilation with swappable datatype codecs
//! - Generated document types and typed document instances
//! - Bidirectional conversion between serialized forms and the model
//! - Path-based addressing into documents
//! - Storage backend seam for validated documents

pub mod convert;
pub mod document;
pub mod models;
pub mod schema;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use convert::{
    ConversionError, base_from_value, base_to_json, base_to_value, base_to_yaml,
    document_from_map, document_to_json, document_to_map, json_to_base, json_to_document,
    yaml_to_base,
};
pub use document::{
    Document, DocumentType, Member, MemberDef, MemberKind, Path, PathError, PathSegment, PathValue,
};
pub use models::{
    Base, BaseMetadata, ConstructionError, DataType, Field, Group, GroupMetadata, Index,
    Multivalued, Required, Structure, UnknownStructure,
};
pub use schema::{CodecFn, CodecRegistry, ScalarRule, Validator};
pub use storage::{DocumentStore, DocumentSubmission, MemoryStore, StorageError};
pub use validation::{
    FileRef, METADATA_KEY, ValidatedDocument, ValidationError, ValidationIssue,
};
