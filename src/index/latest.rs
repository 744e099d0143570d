//! Paginated "latest images" listings sorted by image date.

use super::normalized_entries;
use crate::{
    document::{Document, Provider},
    pipeline::{IndexGeneratorFactory, PipelineError, Transformer},
    store::DocumentStore,
};
use serde_json::{Value, json};
use std::sync::Arc;
use time::{Date, macros::format_description};

/// Entries per listing page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 50;

const UNKNOWN: &str = "unknown";

/// Emits `idx/list/sort-by-date[-<provider>]/<page>` pages plus a `pages` bounds record.
///
/// With no provider every normalized image is listed; otherwise only that provider's images.
pub struct LatestByDate {
    store: Arc<dyn DocumentStore>,
    provider: Option<Provider>,
    page_size: usize,
}

struct DatedEntry<'a> {
    date: Date,
    date_text: &'a str,
    doc: &'a Document,
}

impl LatestByDate {
    /// Build a generator for `provider` (all providers when `None`).
    pub fn new(
        store: Arc<dyn DocumentStore>,
        provider: Option<Provider>,
        page_size: usize,
    ) -> Self {
        Self {
            store,
            provider,
            page_size,
        }
    }

    /// Factory for pipeline construction.
    pub fn factory(provider: Option<Provider>, page_size: usize) -> IndexGeneratorFactory {
        Box::new(
            move |store: Arc<dyn DocumentStore>| -> Box<dyn Transformer> {
                Box::new(Self::new(store, provider, page_size))
            },
        )
    }

    /// Key prefix shared by the pages of this listing.
    pub fn prefix(&self) -> String {
        match self.provider {
            Some(provider) => format!("idx/list/sort-by-date-{provider}"),
            None => "idx/list/sort-by-date".to_string(),
        }
    }

    fn build_entry(
        &self,
        entry: &DatedEntry<'_>,
        provider: &str,
    ) -> Result<Value, PipelineError> {
        let doc = entry.doc;
        let payload = doc.payload().unwrap_or(&Value::Null);
        let field = |field: &'static str| {
            payload
                .get(field)
                .cloned()
                .ok_or_else(|| PipelineError::MissingField {
                    key: doc.key().to_string(),
                    field,
                })
        };

        Ok(json!({
            "name": field("name")?,
            "date": entry.date_text,
            "provider": provider,
            "ref": doc.key(),
            "arch": field("arch")?,
            "region": region_of(doc.key()),
        }))
    }
}

impl Transformer for LatestByDate {
    fn run(&self, documents: &[Document]) -> Result<Vec<Document>, PipelineError> {
        if self.page_size == 0 {
            return Err(PipelineError::InvalidPageSize);
        }

        let entries = normalized_entries(self.store.as_ref(), documents)?;
        let mut dated = entries
            .iter()
            .map(parse_entry_date)
            .collect::<Result<Vec<_>, _>>()?;
        // Stable: images sharing a date keep their input order.
        dated.sort_by(|left, right| right.date.cmp(&left.date));

        let mut listing = Vec::with_capacity(dated.len());
        for entry in &dated {
            let provider = entry.doc.provider().map_or(UNKNOWN, Provider::as_str);
            if let Some(wanted) = self.provider {
                if provider != wanted.as_str() {
                    continue;
                }
            }
            listing.push(self.build_entry(entry, provider)?);
        }

        let prefix = self.prefix();
        let mut results: Vec<Document> = listing
            .chunks(self.page_size)
            .enumerate()
            .map(|(page, chunk)| {
                Document::new(format!("{prefix}/{page}"), Value::Array(chunk.to_vec()))
            })
            .collect();
        let page_count = results.len() as i64;
        results.push(Document::new(
            format!("{prefix}/pages"),
            json!({
                "first": 0,
                "last": page_count - 1,
                "entries": self.page_size,
            }),
        ));

        tracing::debug!(
            listing = %prefix,
            images = listing.len(),
            pages = page_count,
            "Generated date-sorted listing"
        );
        Ok(results)
    }
}

fn parse_entry_date(doc: &Document) -> Result<DatedEntry<'_>, PipelineError> {
    let raw = doc
        .payload()
        .and_then(|payload| payload.get("date"))
        .ok_or_else(|| PipelineError::MissingField {
            key: doc.key().to_string(),
            field: "date",
        })?;
    let invalid = || PipelineError::InvalidDate {
        key: doc.key().to_string(),
        value: raw.to_string(),
    };
    let text = raw.as_str().ok_or_else(invalid)?;
    let date_text = text.split('T').next().unwrap_or(text);
    let date = Date::parse(date_text, format_description!("[year]-[month]-[day]"))
        .map_err(|_| invalid())?;
    Ok(DatedEntry {
        date,
        date_text,
        doc,
    })
}

/// Region is the middle segment of a `provider/region/name` key.
fn region_of(key: &str) -> &str {
    let segments: Vec<&str> = key.split('/').collect();
    if let [_, region, _] = segments.as_slice() {
        *region
    } else {
        tracing::warn!(key, "Could not determine region of image");
        UNKNOWN
    }
}
