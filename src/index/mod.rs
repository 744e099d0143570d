//! Index generators: listings derived from the normalized image documents.
//!
//! Generators run after filtering and see every document in the working set, including the
//! output of generators that ran before them, so each one narrows its input to normalized
//! documents first.

mod latest;
mod names;

pub use latest::{DEFAULT_PAGE_SIZE, LatestByDate};
pub use names::ImageNames;

use crate::{
    document::Document,
    pipeline::PipelineError,
    store::{DocumentStore, ensure_loaded},
};

/// Normalized documents of the working set with payloads loaded, in input order.
fn normalized_entries(
    store: &dyn DocumentStore,
    documents: &[Document],
) -> Result<Vec<Document>, PipelineError> {
    documents
        .iter()
        .filter(|doc| doc.is_normalized())
        .map(|doc| ensure_loaded(store, doc).map_err(PipelineError::from))
        .collect()
}
