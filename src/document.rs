//! Key-addressed documents flowing through the pipeline.
//!
//! A [`Document`] is a slash-delimited key plus an optional JSON payload. Everything the pipeline
//! needs to know about a document (raw input, normalized image, derived index) is read off the
//! key once, when the value is built, and kept as [`DocumentKind`] and [`Provider`].

use serde_json::Value;
use std::fmt;

/// Role of a document, derived from its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Unmodified provider response stored under `raw/`.
    Raw,
    /// Derived listing stored under `idx/`.
    Index,
    /// Per-image record in the common schema.
    Normalized,
}

/// Public cloud providers known to the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provider {
    /// Amazon Web Services.
    Aws,
    /// Microsoft Azure.
    Azure,
    /// Google Cloud.
    Google,
}

impl Provider {
    /// Every provider, in classification order.
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Google];

    /// Key segment used for the provider (`aws`, `azure`, `google`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Google => "google",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "azure" => Ok(Self::Azure),
            "google" => Ok(Self::Google),
            _ => Err(()),
        }
    }
}

/// Unit of data handled by stores, transformers, filters and index generators.
///
/// Documents are immutable once built; attaching a payload produces a new value via
/// [`Document::with_payload`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    key: String,
    kind: DocumentKind,
    provider: Option<Provider>,
    payload: Option<Value>,
}

impl Document {
    /// Build a document carrying a payload.
    pub fn new(key: impl Into<String>, payload: Value) -> Self {
        Self::build(key.into(), Some(payload))
    }

    /// Build a key-only document whose payload is loaded later from a store.
    pub fn key_only(key: impl Into<String>) -> Self {
        Self::build(key.into(), None)
    }

    fn build(key: String, payload: Option<Value>) -> Self {
        let kind = classify_kind(&key);
        let provider = Provider::ALL
            .into_iter()
            .find(|provider| key_is_provided_by(&key, provider.as_str()));
        Self {
            key,
            kind,
            provider,
            payload,
        }
    }

    /// Return a copy of this document with the given payload attached.
    pub fn with_payload(&self, payload: Value) -> Self {
        Self {
            key: self.key.clone(),
            kind: self.kind,
            provider: self.provider,
            payload: Some(payload),
        }
    }

    /// Slash-delimited key of the document.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Role derived from the key.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// First provider whose segment appears in the key (`aws`, `azure`, `google` order).
    pub fn provider(&self) -> Option<Provider> {
        self.provider
    }

    /// Loaded payload, if any.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Consume the document and return its payload.
    pub fn into_payload(self) -> Option<Value> {
        self.payload
    }

    /// `true` when the key contains the `raw/` segment.
    pub fn is_raw(&self) -> bool {
        self.kind == DocumentKind::Raw
    }

    /// `true` when the key contains `<segment>/`.
    pub fn is_provided_by(&self, segment: &str) -> bool {
        key_is_provided_by(&self.key, segment)
    }

    /// `true` for normalized image documents (neither raw nor index).
    pub fn is_normalized(&self) -> bool {
        self.kind == DocumentKind::Normalized
    }

    /// Basename of the key up to its first `.`; used as the region of raw provider dumps.
    pub fn file_stem(&self) -> &str {
        let basename = self.key.rsplit('/').next().unwrap_or(&self.key);
        basename.split('.').next().unwrap_or(basename)
    }
}

fn key_is_provided_by(key: &str, segment: &str) -> bool {
    key.contains(&format!("{segment}/"))
}

fn classify_kind(key: &str) -> DocumentKind {
    if key.contains("raw/") {
        DocumentKind::Raw
    } else if key_is_provided_by(key, "idx") {
        DocumentKind::Index
    } else {
        DocumentKind::Normalized
    }
}

/// Normalize an image name into a key segment: lowercase, spaces replaced with `_`.
pub fn slugify(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}
