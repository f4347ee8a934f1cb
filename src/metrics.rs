//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the ledger:
//!
//! - `ledger_records_total` - Total accepted record writes
//! - `ledger_rejections_total` - Total rejected calls
//! - `ledger_batch_size` - Histogram of accepted batch sizes
//! - `ledger_append_duration_seconds` - Histogram of append latencies
//! - `ledger_paused` - Current paused flag (0 or 1)
//!
//! Each collector registers against its own registry, so several ledgers can
//! coexist in one process.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total accepted record writes
    pub records_total: IntCounter,

    /// Total rejected calls
    pub rejections_total: IntCounter,

    /// Accepted batch size histogram
    pub batch_size: Histogram,

    /// Append duration histogram
    pub append_duration: Histogram,

    /// Paused flag gauge
    pub paused: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let records_total =
            IntCounter::new("ledger_records_total", "Total accepted record writes")?;
        registry.register(Box::new(records_total.clone()))?;

        let rejections_total =
            IntCounter::new("ledger_rejections_total", "Total rejected calls")?;
        registry.register(Box::new(rejections_total.clone()))?;

        let batch_size = Histogram::with_opts(
            HistogramOpts::new("ledger_batch_size", "Histogram of accepted batch sizes")
                .buckets(vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0]),
        )?;
        registry.register(Box::new(batch_size.clone()))?;

        let append_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_append_duration_seconds",
                "Histogram of append latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100]),
        )?;
        registry.register(Box::new(append_duration.clone()))?;

        let paused = IntGauge::new("ledger_paused", "Current paused flag (0 or 1)")?;
        registry.register(Box::new(paused.clone()))?;

        Ok(Self {
            records_total,
            rejections_total,
            batch_size,
            append_duration,
            paused,
            registry,
        })
    }

    /// Record accepted writes (one per record, batches count each element)
    pub fn record_accepted(&self, count: usize) {
        self.records_total.inc_by(count as u64);
        self.batch_size.observe(count as f64);
    }

    /// Record a rejected call
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Record append duration
    pub fn record_append_duration(&self, duration_seconds: f64) {
        self.append_duration.observe(duration_seconds);
    }

    /// Update paused gauge
    pub fn set_paused(&self, paused: bool) {
        self.paused.set(paused as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.records_total.get(), 0);
        assert_eq!(metrics.rejections_total.get(), 0);
        assert_eq!(metrics.paused.get(), 0);
    }

    #[test]
    fn test_record_accepted() {
        let metrics = Metrics::new().unwrap();
        metrics.record_accepted(1);
        metrics.record_accepted(3);
        assert_eq!(metrics.records_total.get(), 4);
    }

    #[test]
    fn test_record_rejection() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejection();
        assert_eq!(metrics.rejections_total.get(), 1);
    }

    #[test]
    fn test_set_paused() {
        let metrics = Metrics::new().unwrap();
        metrics.set_paused(true);
        assert_eq!(metrics.paused.get(), 1);
        metrics.set_paused(false);
        assert_eq!(metrics.paused.get(), 0);
    }

    #[test]
    fn test_independent_registries() {
        // Two collectors must not collide on metric names
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_accepted(1);
        assert_eq!(b.records_total.get(), 0);
    }
}
