use crate::{
    document::Document,
    pipeline::{IndexGeneratorFactory, PipelineError, Transformer},
    store::DocumentStore,
};
use serde_json::Value;
use std::sync::Arc;

/// Key of the image name catalog.
pub const IMAGE_NAMES_KEY: &str = "idx/list/image-names";

/// Emits `idx/list/image-names`: the sorted keys of every normalized image.
///
/// Only keys are read, so payloads are never loaded from the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageNames;

impl ImageNames {
    /// Build the generator.
    pub fn new() -> Self {
        Self
    }

    /// Factory for pipeline construction.
    pub fn factory() -> IndexGeneratorFactory {
        Box::new(|_store: Arc<dyn DocumentStore>| -> Box<dyn Transformer> {
            Box::new(Self::new())
        })
    }
}

impl Transformer for ImageNames {
    fn run(&self, documents: &[Document]) -> Result<Vec<Document>, PipelineError> {
        let mut keys: Vec<String> = documents
            .iter()
            .filter(|doc| doc.is_normalized())
            .map(|doc| doc.key().to_string())
            .collect();
        keys.sort();
        tracing::debug!(images = keys.len(), "Generated image name catalog");

        Ok(vec![Document::new(
            IMAGE_NAMES_KEY,
            Value::Array(keys.into_iter().map(Value::String).collect()),
        )])
    }
}
