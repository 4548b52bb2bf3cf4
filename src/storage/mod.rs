//! Storage collaborator seam
//!
//! The core hands each successfully validated document to a
//! [`DocumentStore`]: the validated serialized document, the extracted
//! relational values, the file reference list and the (reserved, empty)
//! extension list. Persistence, indexing and file content storage are
//! the store's problem; the core consumes nothing back.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde_json::Value;
use uuid::Uuid;

use crate::validation::{FileRef, ValidatedDocument};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("document not found: {0}")]
    NotFound(Uuid),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Everything the storage layer receives for one validated document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSubmission {
    pub id: Uuid,
    pub document: Value,
    pub relational: BTreeMap<String, Value>,
    pub files: Vec<FileRef>,
    pub extensions: Vec<Value>,
}

impl DocumentSubmission {
    /// Build a submission from a validation outcome.
    ///
    /// When no id is supplied, a deterministic UUID v5 is derived from
    /// the document content, so resubmitting the same document yields
    /// the same id.
    pub fn new(id: Option<Uuid>, validated: ValidatedDocument) -> Self {
        let id = id.unwrap_or_else(|| {
            let content = validated.document.to_string();
            Uuid::new_v5(&Uuid::NAMESPACE_OID, content.as_bytes())
        });
        DocumentSubmission {
            id,
            document: validated.document,
            relational: validated.relational,
            files: validated.files,
            extensions: validated.extensions,
        }
    }
}

/// Trait for document stores
///
/// Implementations persist validated documents and their side data; the
/// core never reads anything back through this seam.
pub trait DocumentStore: Send + Sync {
    /// Persist a validated document under the named base
    fn store(&self, base: &str, submission: DocumentSubmission) -> Result<Uuid, StorageError>;

    /// Fetch a previously stored serialized document
    fn fetch(&self, base: &str, id: Uuid) -> Result<Option<Value>, StorageError>;

    /// Delete a stored document
    fn delete(&self, base: &str, id: Uuid) -> Result<(), StorageError>;
}

/// In-memory store, used by the tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<(String, Uuid), DocumentSubmission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn store(&self, base: &str, submission: DocumentSubmission) -> Result<Uuid, StorageError> {
        let id = submission.id;
        let mut documents = self
            .documents
            .lock()
            .map_err(|err| StorageError::Backend(err.to_string()))?;
        documents.insert((base.to_string(), id), submission);
        Ok(id)
    }

    fn fetch(&self, base: &str, id: Uuid) -> Result<Option<Value>, StorageError> {
        let documents = self
            .documents
            .lock()
            .map_err(|err| StorageError::Backend(err.to_string()))?;
        Ok(documents
            .get(&(base.to_string(), id))
            .map(|submission| submission.document.clone()))
    }

    fn delete(&self, base: &str, id: Uuid) -> Result<(), StorageError> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|err| StorageError::Backend(err.to_string()))?;
        documents
            .remove(&(base.to_string(), id))
            .map(|_| ())
            .ok_or(StorageError::NotFound(id))
    }
}
