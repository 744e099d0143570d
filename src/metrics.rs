use crate::pipeline::RunSummary;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    runs: AtomicU64,
    images: AtomicU64,
    filtered: AtomicU64,
    indexes: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed run.
    pub fn record_run(&self, summary: &RunSummary) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.images
            .fetch_add(summary.images as u64, Ordering::Relaxed);
        self.filtered
            .fetch_add(summary.filtered as u64, Ordering::Relaxed);
        self.indexes
            .fetch_add(summary.indexes as u64, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            images: self.images.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            indexes: self.indexes.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of completed runs.
    pub runs: u64,
    /// Documents present after transformers, summed over runs.
    pub images: u64,
    /// Documents removed by filters, summed over runs.
    pub filtered: u64,
    /// Index documents generated, summed over runs.
    pub indexes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_runs_cumulatively() {
        let metrics = PipelineMetrics::new();
        metrics.record_run(&RunSummary {
            images: 4,
            filtered: 1,
            indexes: 2,
        });
        metrics.record_run(&RunSummary {
            images: 3,
            filtered: 0,
            indexes: 2,
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.runs, 2);
        assert_eq!(snapshot.images, 7);
        assert_eq!(snapshot.filtered, 1);
        assert_eq!(snapshot.indexes, 4);
    }

    #[test]
    fn snapshot_starts_empty() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot().runs, 0);
        assert_eq!(metrics.snapshot().indexes, 0);
    }
}
