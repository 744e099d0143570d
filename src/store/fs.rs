use super::{DocumentStore, StoreError};
use crate::document::Document;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Filesystem-backed store.
///
/// Documents are read relative to `origin` and written relative to `destination`. Listing either
/// returns the explicitly supplied files or walks `origin` for `*.json` files. Keys always use
/// `/` as separator regardless of platform.
#[derive(Debug, Clone)]
pub struct FsStore {
    origin: PathBuf,
    destination: PathBuf,
    files: Vec<PathBuf>,
}

impl FsStore {
    /// Store reading and writing under the same directory.
    pub fn new(origin: impl Into<PathBuf>) -> Self {
        let origin = origin.into();
        Self {
            destination: origin.clone(),
            origin,
            files: Vec::new(),
        }
    }

    /// Write documents under `destination` instead of the origin directory.
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Restrict listing to the given files instead of walking the origin directory.
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    /// Directory documents are read from.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Directory documents are written to.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    fn key_for(&self, path: &Path) -> String {
        match path.strip_prefix(&self.origin) {
            Ok(relative) => path_to_key(relative),
            // Outside the origin: keep the file readable from where it was named.
            Err(_) if path.is_relative() => match std::path::absolute(path) {
                Ok(absolute) => path_to_key(&absolute),
                Err(_) => path_to_key(path),
            },
            Err(_) => path_to_key(path),
        }
    }

    fn read_path(&self, key: &str) -> PathBuf {
        let path = Path::new(key);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.origin.join(path)
        }
    }

    fn write_path(&self, key: &str) -> PathBuf {
        self.destination.join(key.trim_start_matches('/'))
    }

    fn walk_origin(&self) -> Result<Vec<Document>, StoreError> {
        if !self.origin.exists() {
            return Err(StoreError::NotFound {
                path: self.origin.clone(),
            });
        }

        let mut documents = Vec::new();
        for entry in WalkDir::new(&self.origin).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
            {
                documents.push(Document::key_only(self.key_for(entry.path())));
            }
        }
        tracing::debug!(
            origin = %self.origin.display(),
            count = documents.len(),
            "Listed documents"
        );
        Ok(documents)
    }
}

impl DocumentStore for FsStore {
    fn list(&self) -> Result<Vec<Document>, StoreError> {
        if self.files.is_empty() {
            return self.walk_origin();
        }
        Ok(self
            .files
            .iter()
            .map(|file| Document::key_only(self.key_for(file)))
            .collect())
    }

    fn get_content(&self, doc: &Document) -> Result<Document, StoreError> {
        let path = self.read_path(doc.key());
        let content = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound { path: path.clone() }
            } else {
                StoreError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let payload = if content.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&content).map_err(|source| StoreError::InvalidJson {
                key: doc.key().to_string(),
                source,
            })?
        };
        Ok(doc.with_payload(payload))
    }

    fn put_content(&self, doc: &Document) -> Result<(), StoreError> {
        let payload = doc.payload().ok_or_else(|| StoreError::MissingPayload {
            key: doc.key().to_string(),
        })?;
        let mut serialized =
            serde_json::to_string(payload).map_err(|source| StoreError::InvalidJson {
                key: doc.key().to_string(),
                source,
            })?;
        serialized.push('\n');

        let path = self.write_path(doc.key());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, serialized).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::trace!(path = %path.display(), "Wrote document");
        Ok(())
    }
}

fn path_to_key(path: &Path) -> String {
    if path.is_absolute() {
        return path.to_string_lossy().replace('\\', "/");
    }
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn list_walks_origin_for_json_files() {
        let dir = tempdir().expect("tempdir");
        let raw = dir.path().join("raw/aws");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join("us-east-1.json"), "[]").unwrap();
        fs::write(raw.join("notes.txt"), "ignored").unwrap();
        fs::create_dir_all(dir.path().join("raw/azure")).unwrap();
        fs::write(dir.path().join("raw/azure/eastus.json"), "[]").unwrap();

        let store = FsStore::new(dir.path());
        let keys: Vec<String> = store
            .list()
            .expect("list")
            .iter()
            .map(|doc| doc.key().to_string())
            .collect();
        assert_eq!(keys, vec!["raw/aws/us-east-1.json", "raw/azure/eastus.json"]);
    }

    #[test]
    fn list_fails_for_missing_origin() {
        let dir = tempdir().expect("tempdir");
        let store = FsStore::new(dir.path().join("missing"));
        assert!(matches!(store.list(), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn list_prefers_explicit_files() {
        let dir = tempdir().expect("tempdir");
        let store = FsStore::new(dir.path())
            .with_files(vec![dir.path().join("raw/aws/af-south-1.json")]);
        let listed = store.list().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key(), "raw/aws/af-south-1.json");
        assert!(listed[0].is_raw());
    }

    #[test]
    fn explicit_relative_files_outside_origin_stay_readable() {
        let origin = tempdir().expect("origin");
        let outside = tempfile::Builder::new()
            .prefix("fs-store-")
            .tempdir_in(".")
            .expect("tempdir in cwd");
        let relative = outside
            .path()
            .strip_prefix(std::env::current_dir().unwrap())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| outside.path().to_path_buf())
            .join("raw/aws/af-south-1.json");
        fs::create_dir_all(relative.parent().unwrap()).unwrap();
        fs::write(&relative, "[]").unwrap();

        let store = FsStore::new(origin.path()).with_files(vec![relative]);
        let listed = store.list().expect("list");
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_raw());
        assert_eq!(listed[0].file_stem(), "af-south-1");

        let loaded = store.get_content(&listed[0]).expect("content");
        assert_eq!(loaded.payload(), Some(&json!([])));
    }

    #[test]
    fn get_content_reads_empty_files_as_empty_object() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("empty.json"), "").unwrap();
        let store = FsStore::new(dir.path());
        let doc = store
            .get_content(&Document::key_only("empty.json"))
            .expect("content");
        assert_eq!(doc.payload(), Some(&json!({})));
    }

    #[test]
    fn get_content_reports_missing_keys() {
        let dir = tempdir().expect("tempdir");
        let store = FsStore::new(dir.path());
        let error = store
            .get_content(&Document::key_only("raw/aws/nope.json"))
            .unwrap_err();
        assert!(matches!(error, StoreError::NotFound { .. }));
    }

    #[test]
    fn put_content_creates_directories_under_destination() {
        let origin = tempdir().expect("origin");
        let destination = tempdir().expect("destination");
        let store = FsStore::new(origin.path()).with_destination(destination.path());

        let doc = Document::new("idx/list/sort-by-date/pages", json!({"first": 0}));
        store.put_content(&doc).expect("put");

        let written =
            fs::read_to_string(destination.path().join("idx/list/sort-by-date/pages")).unwrap();
        assert_eq!(written, "{\"first\":0}\n");
    }
}
