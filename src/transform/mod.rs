//! Provider transformers: raw provider dumps to normalized image documents.
//!
//! Each transformer picks the raw documents of its provider, loads them through the document
//! store, and maps every accepted record with the provider's field mapper. What happens when a
//! single record fails to map is governed by a [`MappingPolicy`].

mod aws;
mod azure;
mod google;

pub use aws::AwsTransformer;
pub use azure::AzureTransformer;
pub use google::GoogleTransformer;

use crate::{
    document::{Document, Provider, slugify},
    format::{ImageRecord, MappingError},
    pipeline::PipelineError,
    store::{DocumentStore, ensure_loaded},
};
use serde_json::Value;
use std::fmt;

/// What a transformer does with a record its mapper rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingPolicy {
    /// Fail the whole run.
    Abort,
    /// Log a warning and drop the record.
    Skip,
}

impl std::str::FromStr for MappingPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MappingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

/// Raw documents of `provider`, in input order.
fn raw_documents_for(documents: &[Document], provider: Provider) -> Vec<&Document> {
    documents
        .iter()
        .filter(|doc| doc.is_provided_by(provider.as_str()) && doc.is_raw())
        .collect()
}

/// Load `doc` and return its records. An empty object (an empty file) holds no records.
fn load_records(
    store: &dyn DocumentStore,
    doc: &Document,
) -> Result<(Document, Vec<Value>), PipelineError> {
    let loaded = ensure_loaded(store, doc)?;
    let records = match loaded.payload() {
        Some(Value::Array(records)) => records.clone(),
        Some(Value::Object(map)) if map.is_empty() => Vec::new(),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            return Err(PipelineError::UnexpectedContent {
                key: doc.key().to_string(),
            });
        }
    };
    Ok((loaded, records))
}

/// Resolve a mapping result under `policy`; `Ok(None)` means the record was skipped.
fn resolve_mapping(
    policy: MappingPolicy,
    provider: Provider,
    source_key: &str,
    record_label: impl FnOnce() -> String,
    result: Result<ImageRecord, MappingError>,
) -> Result<Option<ImageRecord>, PipelineError> {
    match (result, policy) {
        (Ok(image), _) => Ok(Some(image)),
        (Err(source), MappingPolicy::Abort) => Err(PipelineError::Mapping {
            key: source_key.to_string(),
            source,
        }),
        (Err(error), MappingPolicy::Skip) => {
            tracing::warn!(
                %provider,
                source = source_key,
                record = %record_label(),
                error = %error,
                "Could not format image; skipping record"
            );
            Ok(None)
        }
    }
}

/// Build the normalized document `<provider>/<scope>/<slug(name)>`.
fn normalized_document(provider: Provider, scope: &str, image: ImageRecord) -> Document {
    let name = image
        .get("name")
        .and_then(Value::as_str)
        .map(slugify)
        .unwrap_or_default();
    Document::new(format!("{provider}/{scope}/{name}"), Value::Object(image))
}

fn field_label(record: &Value, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or("<missing>")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn mapping_policy_parses_case_insensitively() {
        assert_eq!("Abort".parse(), Ok(MappingPolicy::Abort));
        assert_eq!(" skip ".parse(), Ok(MappingPolicy::Skip));
        assert_eq!("retry".parse::<MappingPolicy>(), Err(()));
        assert_eq!(MappingPolicy::Skip.to_string(), "skip");
    }

    #[test]
    fn raw_documents_for_selects_provider_and_raw() {
        let docs = vec![
            Document::key_only("raw/aws/us-east-1.json"),
            Document::key_only("raw/azure/eastus.json"),
            Document::key_only("aws/us-east-1/rhel"),
        ];
        let selected = raw_documents_for(&docs, Provider::Aws);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].key(), "raw/aws/us-east-1.json");
    }

    #[test]
    fn load_records_rejects_non_list_content() {
        let store = MemoryStore::with_documents([
            ("raw/aws/a", json!({"Images": []})),
            ("raw/aws/b", json!({})),
        ]);
        let error = load_records(&store, &Document::key_only("raw/aws/a")).unwrap_err();
        assert!(matches!(error, PipelineError::UnexpectedContent { .. }));

        let (_, records) = load_records(&store, &Document::key_only("raw/aws/b")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn resolve_mapping_follows_policy() {
        let failure = || Err(MappingError::MissingField { field: "sku" });
        let skipped = resolve_mapping(
            MappingPolicy::Skip,
            Provider::Azure,
            "raw/azure/eastus",
            || "sku".into(),
            failure(),
        )
        .expect("skip policy never fails");
        assert!(skipped.is_none());

        let aborted = resolve_mapping(
            MappingPolicy::Abort,
            Provider::Aws,
            "raw/aws/us-east-1",
            || "name".into(),
            failure(),
        );
        assert!(matches!(aborted, Err(PipelineError::Mapping { .. })));
    }

    #[test]
    fn normalized_document_slugifies_name() {
        let mut image = ImageRecord::new();
        image.insert("name".into(), json!("RHEL 8.3 HVM x86_64 Hourly2"));
        let doc = normalized_document(Provider::Aws, "us-east-1", image);
        assert_eq!(doc.key(), "aws/us-east-1/rhel_8.3_hvm_x86_64_hourly2");
        assert!(doc.is_normalized());
    }
}
