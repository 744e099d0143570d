//! Stage abstractions and error definitions for the transform pipeline.

use crate::{document::Document, format::MappingError, store::DocumentStore, store::StoreError};
use std::sync::Arc;
use thiserror::Error;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Loading raw content from the document store failed.
    #[error("Document store failure: {0}")]
    Store(#[from] StoreError),
    /// A raw record could not be mapped and the transformer policy is to abort.
    #[error("Failed to map record from '{key}': {source}")]
    Mapping {
        /// Key of the raw document holding the record.
        key: String,
        /// Mapper error.
        #[source]
        source: MappingError,
    },
    /// Raw content was neither a list of records nor empty.
    #[error("Unexpected content in '{key}': expected a list of records")]
    UnexpectedContent {
        /// Key of the raw document.
        key: String,
    },
    /// A normalized record carries a date that does not start with `YYYY-MM-DD`.
    #[error("Invalid date '{value}' in '{key}'")]
    InvalidDate {
        /// Key of the normalized document.
        key: String,
        /// Offending date value.
        value: String,
    },
    /// A normalized record lacks a field required for indexing.
    #[error("Document '{key}' is missing field '{field}'")]
    MissingField {
        /// Key of the normalized document.
        key: String,
        /// Name of the absent field.
        field: &'static str,
    },
    /// Index pages must hold at least one entry.
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}

/// A pipeline stage mapping the current document set to newly derived documents.
///
/// Provider transformers and index generators both implement this trait; the pipeline appends
/// whatever a stage returns to the working set.
pub trait Transformer {
    /// Derive new documents from `documents`. The input is never modified.
    fn run(&self, documents: &[Document]) -> Result<Vec<Document>, PipelineError>;
}

/// Builds a stage bound to the pipeline's document store.
pub type TransformerFactory = Box<dyn Fn(Arc<dyn DocumentStore>) -> Box<dyn Transformer>>;

/// Builds an index generator bound to the pipeline's document store.
pub type IndexGeneratorFactory = TransformerFactory;

/// Removes unwanted documents from the working set.
pub type Filter = Box<dyn Fn(Vec<Document>) -> Vec<Document>>;

/// Counts reported by a completed pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Size of the working set after all transformers ran.
    pub images: usize,
    /// Documents removed by filters.
    pub filtered: usize,
    /// Documents appended by index generators.
    pub indexes: usize,
}
