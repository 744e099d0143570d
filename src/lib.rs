#![deny(missing_docs)]

//! Core library for the cloud image directory transformer.
//!
//! Raw image listings dumped from AWS, Azure and Google Cloud are normalized into one record
//! per image, filtered, and summarized into paginated index documents.

/// Environment-driven configuration management.
pub mod config;
/// Keyed documents and the key conventions that classify them.
pub mod document;
/// Key-word filters applied between transformation and indexing.
pub mod filter;
/// Per-provider field mappers producing the common image record.
pub mod format;
/// Index generators summarizing normalized images.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline run counters.
pub mod metrics;
/// Stage orchestration and the transformer abstraction.
pub mod pipeline;
/// Document storage backends.
pub mod store;
/// Provider transformers turning raw dumps into normalized images.
pub mod transform;
