//! Document filters applied between transformation and index generation.

use crate::{document::Document, pipeline::Filter};
use serde_json::Value;
use time::{Date, macros::format_description};

/// Remove every document whose key contains `word`, ignoring case.
pub fn filter_by_key_word(word: impl Into<String>) -> Filter {
    let word = word.into().to_lowercase();
    tracing::info!(word = %word, "Filtering images by key");
    Box::new(move |documents: Vec<Document>| -> Vec<Document> {
        documents
            .into_iter()
            .filter(|doc| !doc.key().to_lowercase().contains(&word))
            .collect()
    })
}

/// Parse a `--filter.until` value: `none` disables the cutoff, anything else must be
/// `YYYY-MM-DD`.
pub fn parse_cutoff(value: &str) -> Result<Option<Date>, time::error::Parse> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Date::parse(value, format_description!("[year]-[month]-[day]")).map(Some)
}

/// Remove normalized images dated before `cutoff`.
///
/// Raw and index documents pass through, as do images without a readable date.
pub fn filter_until(cutoff: Date) -> Filter {
    tracing::info!(%cutoff, "Filtering images older than cutoff");
    Box::new(move |documents: Vec<Document>| -> Vec<Document> {
        documents
            .into_iter()
            .filter(|doc| {
                !doc.is_normalized() || image_date(doc).is_none_or(|date| date >= cutoff)
            })
            .collect()
    })
}

fn image_date(doc: &Document) -> Option<Date> {
    let text = doc.payload()?.get("date").and_then(Value::as_str)?;
    let day = text.split('T').next().unwrap_or(text);
    Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
}
