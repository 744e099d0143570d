use super::{DocumentStore, StoreError};
use crate::document::Document;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe in-memory document store keyed by document key.
///
/// Listing is ordered by key. Unknown keys read as an empty object, mirroring how the filesystem
/// store treats empty files.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `(key, payload)` pairs.
    pub fn with_documents<I, K>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let map = documents
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        Self {
            documents: Mutex::new(map),
        }
    }

    /// Payload stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// All stored keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        // A poisoned map is still structurally valid; keep serving it.
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn list(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.lock().keys().map(Document::key_only).collect())
    }

    fn get_content(&self, doc: &Document) -> Result<Document, StoreError> {
        let payload = self
            .lock()
            .get(doc.key())
            .cloned()
            .filter(|value| !value.is_null())
            .unwrap_or_else(|| Value::Object(Map::new()));
        Ok(doc.with_payload(payload))
    }

    fn put_content(&self, doc: &Document) -> Result<(), StoreError> {
        let payload = doc
            .payload()
            .cloned()
            .ok_or_else(|| StoreError::MissingPayload {
                key: doc.key().to_string(),
            })?;
        self.lock().insert(doc.key().to_string(), payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_returns_key_only_documents_in_order() {
        let store = MemoryStore::with_documents([
            ("raw/google/global", json!([])),
            ("raw/aws/us-east-1", json!([])),
        ]);
        let listed = store.list().expect("list");
        let keys: Vec<_> = listed.iter().map(Document::key).collect();
        assert_eq!(keys, vec!["raw/aws/us-east-1", "raw/google/global"]);
        assert!(listed.iter().all(|doc| doc.payload().is_none()));
    }

    #[test]
    fn get_content_defaults_missing_keys_to_empty_object() {
        let store = MemoryStore::new();
        let doc = store
            .get_content(&Document::key_only("raw/aws/missing"))
            .expect("content");
        assert_eq!(doc.payload(), Some(&json!({})));
    }

    #[test]
    fn put_content_overwrites_by_key() {
        let store = MemoryStore::new();
        store
            .put_content(&Document::new("idx/list/image-names", json!(["a"])))
            .expect("first put");
        store
            .put_content(&Document::new("idx/list/image-names", json!(["b"])))
            .expect("second put");
        assert_eq!(store.get("idx/list/image-names"), Some(json!(["b"])));
        assert_eq!(store.keys().len(), 1);
    }

    #[test]
    fn put_content_rejects_missing_payload() {
        let store = MemoryStore::new();
        let error = store
            .put_content(&Document::key_only("aws/us-east-1/x"))
            .unwrap_err();
        assert!(matches!(error, StoreError::MissingPayload { .. }));
    }
}
