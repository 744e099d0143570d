use super::{
    MappingPolicy, field_label, load_records, normalized_document, raw_documents_for,
    resolve_mapping,
};
use crate::{
    document::{Document, Provider},
    format::{self, MappingError},
    pipeline::{PipelineError, Transformer, TransformerFactory},
    store::DocumentStore,
};
use serde_json::Value;
use std::sync::Arc;

/// Google images are global rather than regional.
const GLOBAL_SCOPE: &str = "global";

/// Normalizes Compute Engine image listings stored under `raw/google/`.
///
/// Only images whose name contains `rhel` are kept.
pub struct GoogleTransformer {
    store: Arc<dyn DocumentStore>,
    policy: MappingPolicy,
}

impl GoogleTransformer {
    /// Build a transformer with the given mapping policy.
    pub fn new(store: Arc<dyn DocumentStore>, policy: MappingPolicy) -> Self {
        Self { store, policy }
    }

    /// Factory for pipeline construction.
    pub fn factory(policy: MappingPolicy) -> TransformerFactory {
        Box::new(
            move |store: Arc<dyn DocumentStore>| -> Box<dyn Transformer> {
                Box::new(Self::new(store, policy))
            },
        )
    }
}

fn is_rhel(record: &Value) -> Result<bool, MappingError> {
    record
        .get("name")
        .and_then(Value::as_str)
        .map(|name| name.contains("rhel"))
        .ok_or(MappingError::MissingField { field: "name" })
}

fn with_snake_case_timestamp(record: &Value) -> Value {
    let mut record = record.clone();
    if let Some(map) = record.as_object_mut() {
        if let Some(timestamp) = map.get("creationTimestamp").cloned() {
            map.insert("creation_timestamp".into(), timestamp);
        }
    }
    record
}

impl Transformer for GoogleTransformer {
    fn run(&self, documents: &[Document]) -> Result<Vec<Document>, PipelineError> {
        let mut results = Vec::new();
        for entry in raw_documents_for(documents, Provider::Google) {
            let (raw, records) = load_records(self.store.as_ref(), entry)?;
            tracing::debug!(
                source = raw.key(),
                records = records.len(),
                "Transforming Google images"
            );

            for record in &records {
                let mapped = match is_rhel(record) {
                    Ok(false) => continue,
                    Ok(true) => format::google::image_rhel(&with_snake_case_timestamp(record)),
                    Err(error) => Err(error),
                };
                let label = || field_label(record, "name");
                if let Some(image) =
                    resolve_mapping(self.policy, Provider::Google, raw.key(), label, mapped)?
                {
                    results.push(normalized_document(Provider::Google, GLOBAL_SCOPE, image));
                }
            }
        }
        Ok(results)
    }
}
