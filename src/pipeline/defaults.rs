//! Standard stage wiring used by the command-line transformer.

use super::{Filter, IndexGeneratorFactory, Pipeline, TransformerFactory};
use crate::{
    config::Config,
    document::Provider,
    index::{ImageNames, LatestByDate},
    store::DocumentStore,
    transform::{AwsTransformer, AzureTransformer, GoogleTransformer},
};
use std::sync::Arc;

/// AWS, Azure and Google transformers, configured from `config`.
pub fn transformers(config: &Config) -> Vec<TransformerFactory> {
    vec![
        AwsTransformer::factory(config.aws_owner_ids.clone(), config.aws_mapping_policy),
        AzureTransformer::factory(config.azure_mapping_policy),
        GoogleTransformer::factory(config.google_mapping_policy),
    ]
}

/// The cross-provider date listing, one listing per provider, then the name catalog.
pub fn index_generators(page_size: usize) -> Vec<IndexGeneratorFactory> {
    let mut generators = vec![LatestByDate::factory(None, page_size)];
    generators.extend(
        Provider::ALL
            .into_iter()
            .map(|provider| LatestByDate::factory(Some(provider), page_size)),
    );
    generators.push(ImageNames::factory());
    generators
}

/// Pipeline with the standard stages and the given filters.
pub fn pipeline(store: Arc<dyn DocumentStore>, config: &Config, filters: Vec<Filter>) -> Pipeline {
    Pipeline::new(
        store,
        transformers(config),
        filters,
        index_generators(config.index_page_size),
    )
}
