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

/// Normalizes `DescribeImages` dumps stored as `raw/aws/<region>.json`.
///
/// Only images owned by an allow-listed account are kept. The region comes from the raw file
/// name.
pub struct AwsTransformer {
    store: Arc<dyn DocumentStore>,
    owner_ids: Vec<String>,
    policy: MappingPolicy,
}

impl AwsTransformer {
    /// Build a transformer accepting images owned by any of `owner_ids`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        owner_ids: Vec<String>,
        policy: MappingPolicy,
    ) -> Self {
        Self {
            store,
            owner_ids,
            policy,
        }
    }

    /// Factory for pipeline construction.
    pub fn factory(owner_ids: Vec<String>, policy: MappingPolicy) -> TransformerFactory {
        Box::new(
            move |store: Arc<dyn DocumentStore>| -> Box<dyn Transformer> {
                Box::new(Self::new(store, owner_ids.clone(), policy))
            },
        )
    }

    fn is_allowed(&self, record: &Value) -> Result<bool, MappingError> {
        let owner = record
            .get("OwnerId")
            .and_then(Value::as_str)
            .ok_or(MappingError::MissingField { field: "OwnerId" })?;
        Ok(self.owner_ids.iter().any(|allowed| allowed == owner))
    }
}

impl Transformer for AwsTransformer {
    fn run(&self, documents: &[Document]) -> Result<Vec<Document>, PipelineError> {
        let mut results = Vec::new();
        for entry in raw_documents_for(documents, Provider::Aws) {
            let (raw, records) = load_records(self.store.as_ref(), entry)?;
            let region = raw.file_stem();
            tracing::debug!(
                source = raw.key(),
                region,
                records = records.len(),
                "Transforming AWS images"
            );

            for record in &records {
                let mapped = match self.is_allowed(record) {
                    Ok(false) => continue,
                    Ok(true) => format::aws::image_rhel(record, region),
                    Err(error) => Err(error),
                };
                let label = || {
                    format!(
                        "{} ({})",
                        field_label(record, "Name"),
                        field_label(record, "ImageId")
                    )
                };
                if let Some(image) =
                    resolve_mapping(self.policy, Provider::Aws, raw.key(), label, mapped)?
                {
                    results.push(normalized_document(Provider::Aws, region, image));
                }
            }
        }
        Ok(results)
    }
}
