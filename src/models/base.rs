//! Base model
//!
//! A base is the root of a document schema: metadata plus an ordered tree
//! of fields and groups. Construction validates the whole tree once,
//! builds a flattened per-name registry and eagerly generates one
//! document type per group (plus one for the root). A constructed base is
//! immutable, so it is safe to share across threads for the lifetime of
//! the process.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::document::DocumentType;

use super::field::Field;
use super::group::{repeated_names, Structure};
use super::ConstructionError;

/// Base metadata.
///
/// `name` and `description` are first-class; every other key is opaque to
/// the core and survives round-trips untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BaseMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        BaseMetadata {
            name: name.into(),
            description: description.into(),
            extra: Map::new(),
        }
    }
}

/// Lookup failure for a structure name absent from the base definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("structure '{name}' does not exist on the base definition")]
pub struct UnknownStructure {
    pub name: String,
}

/// Registry entry for one structure: where it lives in the tree and how
/// many multivalued nodes sit on the path down to it (itself included).
#[derive(Debug, Clone)]
struct StructEntry {
    path: Vec<usize>,
    dimension: u32,
}

/// Schema root binding metadata to a content tree.
#[derive(Debug, Clone)]
pub struct Base {
    metadata: BaseMetadata,
    content: Vec<Structure>,
    registry: HashMap<String, StructEntry>,
    types: HashMap<String, DocumentType>,
    root_type: DocumentType,
}

impl Base {
    /// Build a base, validating the full tree and generating its document
    /// types.
    pub fn new(metadata: BaseMetadata, content: Vec<Structure>) -> Result<Self, ConstructionError> {
        if content.is_empty() {
            return Err(ConstructionError::EmptyContent {
                kind: "base",
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

        let mut registry = HashMap::new();
        index_structures(&content, &[], 0, &mut registry);

        let mut types = HashMap::new();
        collect_types(&content, &mut types);
        let root_type = DocumentType::generate(&metadata.name, &content);
        debug!(
            base = %metadata.name,
            types = types.len() + 1,
            "generated document types"
        );

        Ok(Base {
            metadata,
            content,
            registry,
            types,
            root_type,
        })
    }

    pub fn metadata(&self) -> &BaseMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn content(&self) -> &[Structure] {
        &self.content
    }

    /// Look up a structure anywhere in the tree by name.
    pub fn structure(&self, name: &str) -> Result<&Structure, UnknownStructure> {
        self.registry
            .get(name)
            .and_then(|entry| self.resolve(entry))
            .ok_or_else(|| UnknownStructure {
                name: name.to_string(),
            })
    }

    /// Number of multivalued nodes on the path from the root down to and
    /// including the named structure. A path addressing into the
    /// structure needs exactly this many sequence indices.
    pub fn dimension(&self, name: &str) -> Result<u32, UnknownStructure> {
        self.registry
            .get(name)
            .map(|entry| entry.dimension)
            .ok_or_else(|| UnknownStructure {
                name: name.to_string(),
            })
    }

    /// The generated document type for a named group.
    pub fn document_type(&self, name: &str) -> Result<&DocumentType, UnknownStructure> {
        self.types.get(name).ok_or_else(|| UnknownStructure {
            name: name.to_string(),
        })
    }

    /// The generated document type for the base root.
    pub fn root_type(&self) -> &DocumentType {
        &self.root_type
    }

    /// Resolve a document instance's type name: the root type, or a
    /// group's type.
    pub(crate) fn type_by_name(&self, type_name: &str) -> Result<&DocumentType, UnknownStructure> {
        if type_name == self.root_type.name() {
            Ok(&self.root_type)
        } else {
            self.document_type(type_name)
        }
    }

    /// All structure names known to the base, flattened across nesting.
    pub fn structure_names(&self) -> impl Iterator<Item = &str> {
        self.registry.keys().map(|s| s.as_str())
    }

    /// The relational fields of the whole tree, flattened by name.
    pub fn relational_fields(&self) -> BTreeMap<&str, &Field> {
        let mut fields = BTreeMap::new();
        collect_relational(&self.content, &mut fields);
        fields
    }

    /// The document model: a nested template of the document shape, with
    /// each field mapped to its datatype name and multivalued nodes
    /// wrapped in a one-element sequence.
    pub fn document_model(&self) -> Value {
        let mut model = Map::new();
        for structure in &self.content {
            model.insert(structure.name().to_string(), model_of(structure));
        }
        Value::Object(model)
    }

    fn resolve(&self, entry: &StructEntry) -> Option<&Structure> {
        let (first, rest) = entry.path.split_first()?;
        let mut current = self.content.get(*first)?;
        for &i in rest {
            match current {
                Structure::Group(group) => current = group.content().get(i)?,
                Structure::Field(_) => return None,
            }
        }
        Some(current)
    }
}

fn index_structures(
    content: &[Structure],
    prefix: &[usize],
    dimension: u32,
    registry: &mut HashMap<String, StructEntry>,
) {
    for (i, structure) in content.iter().enumerate() {
        let mut path = prefix.to_vec();
        path.push(i);
        let own_dimension = dimension + u32::from(structure.multivalued());
        registry.insert(
            structure.name().to_string(),
            StructEntry {
                path: path.clone(),
                dimension: own_dimension,
            },
        );
        if let Structure::Group(group) = structure {
            index_structures(group.content(), &path, own_dimension, registry);
        }
    }
}

fn collect_types(content: &[Structure], types: &mut HashMap<String, DocumentType>) {
    for structure in content {
        if let Structure::Group(group) = structure {
            types.insert(
                group.name().to_string(),
                DocumentType::generate(group.name(), group.content()),
            );
            collect_types(group.content(), types);
        }
    }
}

fn collect_relational<'a>(content: &'a [Structure], fields: &mut BTreeMap<&'a str, &'a Field>) {
    for structure in content {
        match structure {
            Structure::Field(field) if field.is_rel() => {
                fields.insert(field.name(), field);
            }
            Structure::Field(_) => {}
            Structure::Group(group) => collect_relational(group.content(), fields),
        }
    }
}

fn model_of(structure: &Structure) -> Value {
    let template = match structure {
        Structure::Field(field) => Value::String(field.datatype().as_str().to_string()),
        Structure::Group(group) => {
            let mut map = Map::new();
            for child in group.content() {
                map.insert(child.name().to_string(), model_of(child));
            }
            Value::Object(map)
        }
    };
    if structure.multivalued() {
        Value::Array(vec![template])
    } else {
        template
    }
}
