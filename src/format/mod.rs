//! Per-provider field mappers: raw provider records to the common image schema.
//!
//! Every mapper is a pure function over a JSON object and reports malformed input with a
//! [`MappingError`]; whether such a failure stops a run is decided by the calling transformer.

pub mod aws;
pub mod azure;
pub mod google;

use serde_json::{Map, Value};
use thiserror::Error;

/// Normalized image record produced by the mappers.
pub type ImageRecord = Map<String, Value>;

/// Errors raised while mapping a raw provider record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The raw record is not a JSON object.
    #[error("record is not an object")]
    NotAnObject,
    /// A required field is absent or not a string.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },
    /// A field is present but its value cannot be interpreted.
    #[error("invalid value for field '{field}': {value}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Value found in the record.
        value: String,
    },
    /// The image name does not follow the provider naming convention.
    #[error("unrecognized image name '{name}'")]
    UnrecognizedName {
        /// Name that failed to parse.
        name: String,
    },
}

pub(crate) fn as_object(record: &Value) -> Result<&Map<String, Value>, MappingError> {
    record.as_object().ok_or(MappingError::NotAnObject)
}

pub(crate) fn required_str<'a>(
    record: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, MappingError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .ok_or(MappingError::MissingField { field })
}

pub(crate) fn optional_str<'a>(record: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
