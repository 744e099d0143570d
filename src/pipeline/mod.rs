//! Transform pipeline: provider transformers, filters and index generators over documents.

pub mod defaults;
mod service;
pub mod types;

pub use service::Pipeline;
pub use types::{
    Filter, IndexGeneratorFactory, PipelineError, RunSummary, Transformer, TransformerFactory,
};
