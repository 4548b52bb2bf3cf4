//! Schema compiler
//!
//! Folds a base's structural tree into a [`Validator`] tree:
//! - a field compiles to the scalar rule its datatype's codec builds,
//!   wrapped in a sequence validator when the field is multivalued
//! - a group compiles to a mapping validator over its content, with
//!   required names marked mandatory, wrapped in a sequence validator
//!   when the group is multivalued
//!
//! The compiled tree is consumed by the validation run in
//! [`crate::validation`], which walks it against a serialized document
//! and aggregates every failure instead of stopping at the first.

pub mod codecs;

pub use codecs::{CodecFn, CodecRegistry, ScalarRule};

use tracing::debug;
use uuid::Uuid;

use crate::models::{Base, Field, Group, Structure};

/// Compiled validation schema node.
#[derive(Debug)]
pub enum Validator {
    /// A scalar rule built by a datatype codec
    Scalar(ScalarValidator),
    /// An ordered sequence whose every element satisfies the inner
    /// validator
    Sequence(Box<Validator>),
    /// A mapping from member names to their validators
    Object(ObjectValidator),
}

/// Scalar node: the codec rule plus the identity of the field it was
/// compiled from.
#[derive(Debug)]
pub struct ScalarValidator {
    pub(crate) field_name: String,
    pub(crate) rule: ScalarRule,
}

/// Mapping node over a group's (or the base root's) content.
#[derive(Debug)]
pub struct ObjectValidator {
    pub(crate) members: Vec<ObjectMember>,
}

#[derive(Debug)]
pub(crate) struct ObjectMember {
    pub(crate) name: String,
    pub(crate) required: bool,
    pub(crate) relational: bool,
    pub(crate) validator: Validator,
}

impl Field {
    /// Compile this field into its validator.
    pub(crate) fn validator(&self, codecs: &CodecRegistry, id: Option<Uuid>) -> Validator {
        let scalar = Validator::Scalar(ScalarValidator {
            field_name: self.name().to_string(),
            rule: codecs.rule(self, id),
        });
        if self.multivalued() {
            Validator::Sequence(Box::new(scalar))
        } else {
            scalar
        }
    }
}

impl Group {
    /// Compile this group into its validator.
    pub(crate) fn validator(&self, codecs: &CodecRegistry, id: Option<Uuid>) -> Validator {
        let object = Validator::Object(object_of(self.content(), codecs, id));
        if self.multivalued() {
            Validator::Sequence(Box::new(object))
        } else {
            object
        }
    }
}

impl Base {
    /// Compile the validation schema for this base, threading the id of
    /// the document under validation down to every field codec.
    pub fn schema(&self, codecs: &CodecRegistry, id: Option<Uuid>) -> Validator {
        debug!(base = %self.name(), "compiling validation schema");
        Validator::Object(object_of(self.content(), codecs, id))
    }
}

fn object_of(content: &[Structure], codecs: &CodecRegistry, id: Option<Uuid>) -> ObjectValidator {
    let members = content
        .iter()
        .map(|structure| ObjectMember {
            name: structure.name().to_string(),
            required: structure.required(),
            relational: matches!(structure, Structure::Field(field) if field.is_rel()),
            validator: match structure {
                Structure::Field(field) => field.validator(codecs, id),
                Structure::Group(group) => group.validator(codecs, id),
            },
        })
        .collect();
    ObjectValidator { members }
}
