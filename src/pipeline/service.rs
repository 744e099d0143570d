//! Pipeline orchestration: transformers, then filters, then index generators.

use super::types::{
    Filter, IndexGeneratorFactory, PipelineError, RunSummary, Transformer, TransformerFactory,
};
use crate::{
    document::Document,
    metrics::{MetricsSnapshot, PipelineMetrics},
    store::DocumentStore,
};
use std::sync::Arc;

/// Ordered set of pipeline stages bound to one document store.
///
/// Stages are instantiated from their factories when the pipeline is built; every pipeline owns
/// its own stage lists, so several pipelines in one process never share state.
pub struct Pipeline {
    transformers: Vec<Box<dyn Transformer>>,
    filters: Vec<Filter>,
    idx_generators: Vec<Box<dyn Transformer>>,
    metrics: PipelineMetrics,
    last_run: Option<RunSummary>,
}

impl Pipeline {
    /// Build a pipeline, instantiating every factory against `store`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        transformer_factories: Vec<TransformerFactory>,
        filters: Vec<Filter>,
        idx_generator_factories: Vec<IndexGeneratorFactory>,
    ) -> Self {
        let transformers = transformer_factories
            .iter()
            .map(|factory| factory(Arc::clone(&store)))
            .collect();
        let idx_generators = idx_generator_factories
            .iter()
            .map(|factory| factory(Arc::clone(&store)))
            .collect();

        Self {
            transformers,
            filters,
            idx_generators,
            metrics: PipelineMetrics::new(),
            last_run: None,
        }
    }

    /// Run every stage over `data` and return the final document set.
    ///
    /// Transformer and generator outputs are appended to the working set, so later stages see
    /// earlier output. The first failing stage aborts the run.
    pub fn run(&mut self, data: Vec<Document>) -> Result<Vec<Document>, PipelineError> {
        let mut results = data;
        for transformer in &self.transformers {
            let produced = transformer.run(&results)?;
            results.extend(produced);
        }

        let images = results.len();
        tracing::info!(images, "Transformed images");

        for filter in &self.filters {
            let before = results.len();
            results = filter(results);
            let after = results.len();
            if after < before {
                tracing::info!(removed = before - after, "Filtered items");
            } else {
                tracing::debug!(added = after - before, "Filter removed nothing");
            }
        }

        let filtered_count = results.len();
        for generator in &self.idx_generators {
            let produced = generator.run(&results)?;
            results.extend(produced);
        }

        let summary = RunSummary {
            images,
            filtered: images.saturating_sub(filtered_count),
            indexes: results.len() - filtered_count,
        };
        tracing::info!(indexes = summary.indexes, "Generated indexes");
        self.metrics.record_run(&summary);
        self.last_run = Some(summary);

        Ok(results)
    }

    /// Counts of the most recent successful run.
    pub fn last_run(&self) -> Option<RunSummary> {
        self.last_run
    }

    /// Cumulative counters across runs of this pipeline.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Emits one document per call, named after the working-set size it observed.
    struct Counting {
        prefix: &'static str,
        seen: Rc<RefCell<Vec<usize>>>,
    }

    impl Transformer for Counting {
        fn run(&self, documents: &[Document]) -> Result<Vec<Document>, PipelineError> {
            self.seen.borrow_mut().push(documents.len());
            Ok(vec![Document::new(
                format!("{}/{}", self.prefix, documents.len()),
                json!({}),
            )])
        }
    }

    struct Failing;

    impl Transformer for Failing {
        fn run(&self, _documents: &[Document]) -> Result<Vec<Document>, PipelineError> {
            Err(PipelineError::InvalidPageSize)
        }
    }

    fn counting(prefix: &'static str, seen: &Rc<RefCell<Vec<usize>>>) -> TransformerFactory {
        let seen = Rc::clone(seen);
        Box::new(move |_store: Arc<dyn DocumentStore>| -> Box<dyn Transformer> {
            Box::new(Counting {
                prefix,
                seen: Rc::clone(&seen),
            })
        })
    }

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryStore::new())
    }

    #[test]
    fn stages_see_previously_appended_output() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = Pipeline::new(
            store(),
            vec![counting("a", &seen), counting("b", &seen)],
            Vec::new(),
            vec![counting("idx/one", &seen), counting("idx/two", &seen)],
        );

        let output = pipeline
            .run(vec![Document::key_only("raw/aws/us-east-1")])
            .expect("run");

        assert_eq!(*seen.borrow(), vec![1, 2, 3, 4]);
        let keys: Vec<_> = output.iter().map(Document::key).collect();
        assert_eq!(
            keys,
            vec!["raw/aws/us-east-1", "a/1", "b/2", "idx/one/3", "idx/two/4"]
        );
    }

    #[test]
    fn filters_run_in_order_before_generators() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let drop_raw: Filter = Box::new(|docs: Vec<Document>| -> Vec<Document> {
            docs.into_iter().filter(|doc| !doc.is_raw()).collect()
        });
        let keep_first: Filter = Box::new(|docs: Vec<Document>| -> Vec<Document> {
            docs.into_iter().take(1).collect()
        });
        let mut pipeline = Pipeline::new(
            store(),
            vec![counting("aws/x", &seen)],
            vec![drop_raw, keep_first],
            vec![counting("idx/list", &seen)],
        );

        let output = pipeline
            .run(vec![
                Document::key_only("raw/aws/a"),
                Document::key_only("raw/aws/b"),
            ])
            .expect("run");

        let keys: Vec<_> = output.iter().map(Document::key).collect();
        assert_eq!(keys, vec!["aws/x/2", "idx/list/1"]);
        assert_eq!(
            pipeline.last_run(),
            Some(RunSummary {
                images: 3,
                filtered: 2,
                indexes: 1
            })
        );
    }

    #[test]
    fn growing_filter_counts_nothing_as_filtered() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let add_one: Filter = Box::new(|mut docs: Vec<Document>| -> Vec<Document> {
            docs.push(Document::new("aws/us-east-1/extra", json!({})));
            docs
        });
        let mut pipeline = Pipeline::new(
            store(),
            Vec::new(),
            vec![add_one],
            vec![counting("idx/list", &seen)],
        );

        let output = pipeline.run(Vec::new()).expect("run");

        assert_eq!(output.len(), 2);
        assert_eq!(
            pipeline.last_run(),
            Some(RunSummary {
                images: 0,
                filtered: 0,
                indexes: 1
            })
        );
    }

    #[test]
    fn failing_stage_aborts_run() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let failing: TransformerFactory =
            Box::new(|_store: Arc<dyn DocumentStore>| -> Box<dyn Transformer> {
                Box::new(Failing)
            });
        let mut pipeline = Pipeline::new(
            store(),
            vec![failing],
            Vec::new(),
            vec![counting("idx/list", &seen)],
        );

        assert!(pipeline.run(Vec::new()).is_err());
        assert!(seen.borrow().is_empty());
        assert!(pipeline.last_run().is_none());
        assert_eq!(pipeline.metrics_snapshot().runs, 0);
    }

    #[test]
    fn pipelines_do_not_share_stages() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut first =
            Pipeline::new(store(), vec![counting("a", &seen)], Vec::new(), Vec::new());
        let mut second = Pipeline::new(store(), Vec::new(), Vec::new(), Vec::new());

        first.run(Vec::new()).expect("first run");
        let output = second.run(Vec::new()).expect("second run");

        assert!(output.is_empty());
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(first.metrics_snapshot().runs, 1);
        assert_eq!(second.metrics_snapshot().images, 0);
    }
}
