//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for recompute runs, store calls
//! and validation rejections.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the ladder service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Recompute-related metrics
    recompute_metrics: RecomputeMetrics,

    /// Ladder write metrics
    ladder_metrics: LadderMetrics,
}

/// Recompute-related metrics
#[derive(Clone)]
pub struct RecomputeMetrics {
    /// Recompute runs by outcome (success, failed)
    pub runs_total: IntCounterVec,

    /// Duration of a full rebuild, lock wait excluded
    pub duration_seconds: Histogram,

    /// Store call durations by operation
    pub store_operation_duration: HistogramVec,

    /// Matches replayed by the last successful run
    pub matches_replayed: IntGauge,

    /// Competitors written by the last successful run
    pub competitors_ranked: IntGauge,
}

/// Ladder write metrics
#[derive(Clone)]
pub struct LadderMetrics {
    /// Accepted writes by kind (competitor_created, match_recorded, ...)
    pub writes_total: IntCounterVec,

    /// Rejected inputs by validation reason
    pub validation_rejections_total: IntCounterVec,
}

impl RecomputeMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let runs_total = IntCounterVec::new(
            Opts::new("ladder_recompute_runs_total", "Recompute runs by outcome"),
            &["outcome"],
        )?;
        let duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "ladder_recompute_duration_seconds",
                "Time spent rebuilding a scope",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        let store_operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "ladder_store_operation_duration_seconds",
                "Store call duration during recompute",
            ),
            &["operation"],
        )?;
        let matches_replayed = IntGauge::new(
            "ladder_matches_replayed",
            "Matches replayed by the last successful recompute",
        )?;
        let competitors_ranked = IntGauge::new(
            "ladder_competitors_ranked",
            "Competitors written by the last successful recompute",
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(store_operation_duration.clone()))?;
        registry.register(Box::new(matches_replayed.clone()))?;
        registry.register(Box::new(competitors_ranked.clone()))?;

        Ok(Self {
            runs_total,
            duration_seconds,
            store_operation_duration,
            matches_replayed,
            competitors_ranked,
        })
    }
}

impl LadderMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let writes_total = IntCounterVec::new(
            Opts::new("ladder_writes_total", "Accepted ladder writes by kind"),
            &["kind"],
        )?;
        let validation_rejections_total = IntCounterVec::new(
            Opts::new(
                "ladder_validation_rejections_total",
                "Inputs rejected before any write",
            ),
            &["reason"],
        )?;

        registry.register(Box::new(writes_total.clone()))?;
        registry.register(Box::new(validation_rejections_total.clone()))?;

        Ok(Self {
            writes_total,
            validation_rejections_total,
        })
    }
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let recompute_metrics = RecomputeMetrics::new(&registry)?;
        let ladder_metrics = LadderMetrics::new(&registry)?;

        Ok(Self {
            registry,
            recompute_metrics,
            ladder_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn recompute(&self) -> &RecomputeMetrics {
        &self.recompute_metrics
    }

    pub fn ladder(&self) -> &LadderMetrics {
        &self.ladder_metrics
    }

    /// Record a successful rebuild
    pub fn record_recompute_success(&self, matches: usize, competitors: usize, duration: Duration) {
        self.recompute_metrics
            .runs_total
            .with_label_values(&["success"])
            .inc();
        self.recompute_metrics
            .duration_seconds
            .observe(duration.as_secs_f64());
        self.recompute_metrics.matches_replayed.set(matches as i64);
        self.recompute_metrics
            .competitors_ranked
            .set(competitors as i64);
    }

    /// Record a rebuild that aborted
    pub fn record_recompute_failure(&self, duration: Duration) {
        self.recompute_metrics
            .runs_total
            .with_label_values(&["failed"])
            .inc();
        self.recompute_metrics
            .duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record how long a store call took
    pub fn record_store_operation(&self, operation: &str, duration: Duration) {
        self.recompute_metrics
            .store_operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Record an accepted write
    pub fn record_write(&self, kind: &str) {
        self.ladder_metrics
            .writes_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Record an input rejected by validation
    pub fn record_validation_rejection(&self, reason: &str) {
        self.ladder_metrics
            .validation_rejections_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Render every metric in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        // A fresh registry cannot hold conflicting names
        Self::new().expect("metrics registration on an empty registry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().unwrap();
        assert_eq!(collector.recompute().matches_replayed.get(), 0);
    }

    #[test]
    fn test_record_recompute_outcomes() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_recompute_success(12, 4, Duration::from_millis(3));
        collector.record_recompute_failure(Duration::from_millis(1));
        collector.record_recompute_failure(Duration::from_millis(1));

        let runs = &collector.recompute().runs_total;
        assert_eq!(runs.with_label_values(&["success"]).get(), 1);
        assert_eq!(runs.with_label_values(&["failed"]).get(), 2);
        assert_eq!(collector.recompute().matches_replayed.get(), 12);
        assert_eq!(collector.recompute().competitors_ranked.get(), 4);
    }

    #[test]
    fn test_render_contains_metric_names() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_write("match_recorded");
        collector.record_validation_rejection("self_match");
        collector.record_store_operation("list_matches", Duration::from_millis(2));

        let text = collector.render().unwrap();
        assert!(text.contains("ladder_writes_total"));
        assert!(text.contains("ladder_validation_rejections_total"));
        assert!(text.contains("ladder_store_operation_duration_seconds"));
    }

    #[test]
    fn test_shared_registry_rejects_duplicates() {
        let registry = Arc::new(Registry::new());
        assert!(MetricsCollector::with_registry(registry.clone()).is_ok());
        assert!(MetricsCollector::with_registry(registry).is_err());
    }
}
