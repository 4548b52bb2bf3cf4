//! Conversion engine
//!
//! Two independent bidirectional pipelines, both recursive over the same
//! tree shape:
//! - serialized schema form ⇄ [`Base`] (`json_to_base` / `base_to_json`,
//!   plus YAML variants for hand-authored schema files)
//! - serialized document form ⇄ [`Document`] (`json_to_document` /
//!   `document_to_json` and the mapping-level equivalents)
//!
//! The schema wire shape nests one externally tagged entry per structure
//! (`{"field": {...}}` or `{"group": {"metadata": {...}, "content":
//! [...]}}`) under a top-level `{"metadata": {...}, "content": [...]}`.
//! Serializing a base additionally embeds the derived document model
//! under `metadata.model`; the parser strips it, so
//! `base → serialized → base` reproduces a structurally equal tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::{Document, Member, MemberKind};
use crate::models::{
    Base, BaseMetadata, ConstructionError, DataType, Field, Group, GroupMetadata, Index,
    Multivalued, Required, Structure, UnknownStructure,
};

/// Error raised when a serialized form disagrees with the schema shape,
/// or cannot be read at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("failed to parse serialized form: {0}")]
    Parse(String),
    #[error("serialized form at '{path}': {reason}")]
    Shape { path: String, reason: String },
    #[error("document type '{type_name}' has no member '{member}'")]
    UnknownMember { type_name: String, member: String },
    #[error("member '{member}' of '{type_name}': {reason}")]
    MemberShape {
        type_name: String,
        member: String,
        reason: String,
    },
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    UnknownStructure(#[from] UnknownStructure),
}

/// Wire form of a field definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FieldDef {
    name: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    description: String,
    datatype: String,
    indices: Vec<String>,
    multivalued: bool,
    required: bool,
}

/// Wire form of a group definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupDef {
    metadata: GroupMetadata,
    content: Vec<StructureDef>,
}

/// Wire form of one content entry; externally tagged, so a field entry
/// serializes as `{"field": {...}}` and a group as `{"group": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StructureDef {
    Field(FieldDef),
    Group(GroupDef),
}

/// Wire form of a whole base.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BaseDef {
    metadata: BaseMetadata,
    content: Vec<StructureDef>,
}

/// Parse the serialized schema form into a validated [`Base`].
pub fn base_from_value(value: Value) -> Result<Base, ConversionError> {
    let mut def: BaseDef =
        serde_json::from_value(value).map_err(|err| ConversionError::Parse(err.to_string()))?;
    // `model` is derived on serialization; never a stored input
    def.metadata.extra.remove("model");
    let content = def
        .content
        .into_iter()
        .map(assemble_structure)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Base::new(def.metadata, content)?)
}

/// Serialize a [`Base`] into its mapping form, embedding the document
/// model under `metadata.model`.
pub fn base_to_value(base: &Base) -> Result<Value, ConversionError> {
    let mut metadata = base.metadata().clone();
    metadata
        .extra
        .insert("model".to_string(), base.document_model());
    let def = BaseDef {
        metadata,
        content: base.content().iter().map(structure_def).collect(),
    };
    serde_json::to_value(def).map_err(|err| ConversionError::Parse(err.to_string()))
}

/// Parse a UTF-8 JSON schema text into a [`Base`].
pub fn json_to_base(text: &str) -> Result<Base, ConversionError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| ConversionError::Parse(err.to_string()))?;
    base_from_value(value)
}

/// Serialize a [`Base`] to JSON text.
pub fn base_to_json(base: &Base) -> Result<String, ConversionError> {
    serde_json::to_string(&base_to_value(base)?)
        .map_err(|err| ConversionError::Parse(err.to_string()))
}

/// Parse a YAML schema text into a [`Base`].
pub fn yaml_to_base(text: &str) -> Result<Base, ConversionError> {
    let value: Value =
        serde_yaml::from_str(text).map_err(|err| ConversionError::Parse(err.to_string()))?;
    base_from_value(value)
}

/// Serialize a [`Base`] to YAML text.
pub fn base_to_yaml(base: &Base) -> Result<String, ConversionError> {
    serde_yaml::to_string(&base_to_value(base)?)
        .map_err(|err| ConversionError::Parse(err.to_string()))
}

fn assemble_structure(def: StructureDef) -> Result<Structure, ConversionError> {
    match def {
        StructureDef::Field(field) => {
            let datatype: DataType = field.datatype.parse()?;
            let indices = field
                .indices
                .iter()
                .map(|name| name.parse::<Index>())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Structure::Field(Field::new(
                field.name,
                field.alias,
                field.description,
                datatype,
                indices,
                Multivalued::new(field.multivalued),
                Required::new(field.required),
            )?))
        }
        StructureDef::Group(group) => {
            let content = group
                .content
                .into_iter()
                .map(assemble_structure)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Structure::Group(Group::new(group.metadata, content)?))
        }
    }
}

fn structure_def(structure: &Structure) -> StructureDef {
    match structure {
        Structure::Field(field) => StructureDef::Field(FieldDef {
            name: field.name().to_string(),
            alias: field.alias().to_string(),
            description: field.description().to_string(),
            datatype: field.datatype().as_str().to_string(),
            indices: field.indices().iter().map(|i| i.to_string()).collect(),
            multivalued: field.multivalued(),
            required: field.required(),
        }),
        Structure::Group(group) => StructureDef::Group(GroupDef {
            metadata: group.metadata().clone(),
            content: group.content().iter().map(structure_def).collect(),
        }),
    }
}

/// Lift a serialized document mapping into a typed [`Document`] of the
/// base's root type.
pub fn document_from_map(base: &Base, value: &Value) -> Result<Document, ConversionError> {
    lift_into(base, base.root_type().name(), value)
}

/// Lift a mapping into a document of the named type (root or group).
pub(crate) fn lift_into(
    base: &Base,
    type_name: &str,
    value: &Value,
) -> Result<Document, ConversionError> {
    let ty = base.type_by_name(type_name)?;
    let object = value.as_object().ok_or_else(|| ConversionError::Shape {
        path: type_name.to_string(),
        reason: "expected a mapping".to_string(),
    })?;
    let mut members = BTreeMap::new();
    for (key, entry) in object {
        let def = ty
            .member(key)
            .ok_or_else(|| ConversionError::UnknownMember {
                type_name: ty.name().to_string(),
                member: key.clone(),
            })?;
        let member = match def.kind() {
            MemberKind::Field(_) => Member::Value(entry.clone()),
            MemberKind::Group(group_name) => {
                if def.multivalued() {
                    let elements =
                        entry
                            .as_array()
                            .ok_or_else(|| ConversionError::MemberShape {
                                type_name: ty.name().to_string(),
                                member: key.clone(),
                                reason: "expected a sequence of mappings".to_string(),
                            })?;
                    let mut documents = Vec::with_capacity(elements.len());
                    for element in elements {
                        documents.push(lift_into(base, group_name, element)?);
                    }
                    Member::Documents(documents)
                } else {
                    Member::Document(lift_into(base, group_name, entry)?)
                }
            }
        };
        members.insert(key.clone(), member);
    }
    ty.new_document(members)
}

/// Lower a typed [`Document`] back into its serialized mapping form.
///
/// Iterates the known member names of the document's type, not the
/// instance's present members; a member that was never set is skipped.
pub fn document_to_map(base: &Base, document: &Document) -> Result<Value, ConversionError> {
    let ty = base.type_by_name(document.type_name())?;
    let mut map = Map::new();
    for def in ty.members() {
        let Some(member) = document.get(def.name()) else {
            continue;
        };
        let value = match member {
            Member::Value(value) => value.clone(),
            Member::Document(nested) => document_to_map(base, nested)?,
            Member::Documents(sequence) => Value::Array(
                sequence
                    .iter()
                    .map(|nested| document_to_map(base, nested))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        map.insert(def.name().to_string(), value);
    }
    Ok(Value::Object(map))
}

/// Parse a JSON document text into a typed [`Document`].
pub fn json_to_document(base: &Base, text: &str) -> Result<Document, ConversionError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| ConversionError::Parse(err.to_string()))?;
    document_from_map(base, &value)
}

/// Serialize a typed [`Document`] to JSON text.
pub fn document_to_json(base: &Base, document: &Document) -> Result<String, ConversionError> {
    serde_json::to_string(&document_to_map(base, document)?)
        .map_err(|err| ConversionError::Parse(err.to_string()))
}
