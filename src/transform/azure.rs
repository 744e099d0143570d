use super::{
    MappingPolicy, field_label, load_records, normalized_document, raw_documents_for,
    resolve_mapping,
};
use crate::{
    document::{Document, Provider},
    format::{self, MappingError, azure::RHEL_PUBLISHER},
    pipeline::{PipelineError, Transformer, TransformerFactory},
    store::DocumentStore,
};
use serde_json::Value;
use std::sync::Arc;

/// Normalizes Azure image listings stored as `raw/azure/<region>.json`.
///
/// Records from publishers other than Red Hat are ignored. A missing `hyperVGeneration` is
/// filled with `unknown` before mapping.
pub struct AzureTransformer {
    store: Arc<dyn DocumentStore>,
    policy: MappingPolicy,
}

impl AzureTransformer {
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

fn is_red_hat(record: &Value) -> Result<bool, MappingError> {
    record
        .get("publisher")
        .and_then(Value::as_str)
        .map(|publisher| publisher == RHEL_PUBLISHER)
        .ok_or(MappingError::MissingField { field: "publisher" })
}

fn with_generation_placeholder(record: &Value) -> Value {
    let mut record = record.clone();
    if let Some(map) = record.as_object_mut() {
        map.entry("hyperVGeneration")
            .or_insert_with(|| Value::String("unknown".into()));
    }
    record
}

impl Transformer for AzureTransformer {
    fn run(&self, documents: &[Document]) -> Result<Vec<Document>, PipelineError> {
        let mut results = Vec::new();
        for entry in raw_documents_for(documents, Provider::Azure) {
            let (raw, records) = load_records(self.store.as_ref(), entry)?;
            let region = raw.file_stem();
            tracing::debug!(
                source = raw.key(),
                region,
                records = records.len(),
                "Transforming Azure images"
            );

            for record in &records {
                let mapped = match is_red_hat(record) {
                    Ok(false) => continue,
                    Ok(true) => format::azure::image_rhel(&with_generation_placeholder(record)),
                    Err(error) => Err(error),
                };
                let label = || {
                    format!(
                        "sku: {} offer: {}",
                        field_label(record, "sku"),
                        field_label(record, "offer")
                    )
                };
                if let Some(image) =
                    resolve_mapping(self.policy, Provider::Azure, raw.key(), label, mapped)?
                {
                    results.push(normalized_document(Provider::Azure, region, image));
                }
            }
        }
        Ok(results)
    }
}
