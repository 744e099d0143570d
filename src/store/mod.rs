//! Document stores: enumerate, read and write documents by key.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::document::Document;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by document stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key or root directory does not exist.
    #[error("Path does not exist: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },
    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path involved in the failing operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Stored content is not valid JSON, or a payload could not be serialized.
    #[error("Invalid JSON for document '{key}': {source}")]
    InvalidJson {
        /// Key of the offending document.
        key: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// Directory traversal failed while listing documents.
    #[error("Failed to walk document tree: {0}")]
    Walk(#[from] walkdir::Error),
    /// Attempted to persist a document without a payload.
    #[error("Document '{key}' has no payload to store")]
    MissingPayload {
        /// Key of the payload-less document.
        key: String,
    },
}

/// Key/value document storage consumed by the pipeline.
///
/// Calls are synchronous and blocking; retries and timeouts are the implementation's concern.
pub trait DocumentStore: Send + Sync {
    /// Enumerate available documents. Returned documents carry keys only.
    fn list(&self) -> Result<Vec<Document>, StoreError>;

    /// Load the payload for `doc`. Empty content is read as `{}`.
    fn get_content(&self, doc: &Document) -> Result<Document, StoreError>;

    /// Persist `doc` under its key, overwriting any previous content.
    fn put_content(&self, doc: &Document) -> Result<(), StoreError>;
}

/// Return `doc` unchanged when its payload is loaded, otherwise fetch it from `store`.
pub fn ensure_loaded(store: &dyn DocumentStore, doc: &Document) -> Result<Document, StoreError> {
    if doc.payload().is_some() {
        Ok(doc.clone())
    } else {
        store.get_content(doc)
    }
}
