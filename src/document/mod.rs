//! Document types and instances
//!
//! For every group in a base (plus the root) a [`DocumentType`] is
//! generated at base construction: a descriptor listing the node's
//! members, each with its kind, multiplicity and required flag.
//! Instantiating a type with a member map yields a [`Document`], the
//! typed object-graph representation of a validated document.

pub mod path;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::convert::ConversionError;
use crate::models::{DataType, Structure};

pub use path::{Path, PathError, PathSegment, PathValue};

/// What a member of a document type holds.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    /// A leaf value of the given datatype
    Field(DataType),
    /// A nested document of the named group's type
    Group(String),
}

/// Descriptor for one named member of a document type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    name: String,
    kind: MemberKind,
    multivalued: bool,
    required: bool,
}

impl MemberDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    pub fn multivalued(&self) -> bool {
        self.multivalued
    }

    pub fn required(&self) -> bool {
        self.required
    }
}

/// Generated structural type for one group (or base root) node.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentType {
    name: String,
    members: Vec<MemberDef>,
}

impl DocumentType {
    /// Derive the type descriptor for a node's content list.
    pub(crate) fn generate(name: &str, content: &[Structure]) -> Self {
        let members = content
            .iter()
            .map(|structure| MemberDef {
                name: structure.name().to_string(),
                kind: match structure {
                    Structure::Field(field) => MemberKind::Field(field.datatype()),
                    Structure::Group(group) => MemberKind::Group(group.name().to_string()),
                },
                multivalued: structure.multivalued(),
                required: structure.required(),
            })
            .collect();
        DocumentType {
            name: name.to_string(),
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[MemberDef] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberDef> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Instantiate the type from a keyword-to-member map.
    ///
    /// Keys absent from the node's content are rejected, as is a member
    /// whose shape disagrees with its descriptor (a nested document where
    /// a field value is expected, a single document for a multivalued
    /// group, and so on). Members may be left unset.
    pub fn new_document(
        &self,
        members: BTreeMap<String, Member>,
    ) -> Result<Document, ConversionError> {
        for (name, member) in &members {
            let def = self
                .member(name)
                .ok_or_else(|| ConversionError::UnknownMember {
                    type_name: self.name.clone(),
                    member: name.clone(),
                })?;
            let ok = match (&def.kind, member) {
                (MemberKind::Field(_), Member::Value(_)) => true,
                (MemberKind::Group(_), Member::Document(_)) => !def.multivalued,
                (MemberKind::Group(_), Member::Documents(_)) => def.multivalued,
                _ => false,
            };
            if !ok {
                return Err(ConversionError::MemberShape {
                    type_name: self.name.clone(),
                    member: name.clone(),
                    reason: member_shape_reason(def, member),
                });
            }
        }
        Ok(Document {
            type_name: self.name.clone(),
            members,
        })
    }
}

fn member_shape_reason(def: &MemberDef, member: &Member) -> String {
    let expected = match (&def.kind, def.multivalued) {
        (MemberKind::Field(_), _) => "a field value",
        (MemberKind::Group(_), false) => "a single nested document",
        (MemberKind::Group(_), true) => "a sequence of nested documents",
    };
    let got = match member {
        Member::Value(_) => "a field value",
        Member::Document(_) => "a single nested document",
        Member::Documents(_) => "a sequence of nested documents",
    };
    format!("expected {expected}, got {got}")
}

/// Value held by one member of a document instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// A field value, kept verbatim (a scalar, or a sequence for a
    /// multivalued field)
    Value(Value),
    /// A single nested document
    Document(Document),
    /// An ordered sequence of nested documents, for a multivalued group
    Documents(Vec<Document>),
}

/// A validated, addressable document instance.
///
/// Exposes one named member per content entry of the node it was
/// generated from; a member that was not set is simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    type_name: String,
    members: BTreeMap<String, Member>,
}

impl Document {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.members.get_mut(name)
    }

    pub(crate) fn insert(&mut self, name: String, member: Member) {
        self.members.insert(name, member);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Member> {
        self.members.remove(name)
    }
}
