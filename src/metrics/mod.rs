//! Metrics for the ladder service
//!
//! Prometheus counters, gauges and histograms covering recompute runs, store
//! latency and rejected inputs.

pub mod collector;

pub use collector::{LadderMetrics, MetricsCollector, RecomputeMetrics};
