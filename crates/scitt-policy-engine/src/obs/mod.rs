//! Lightweight in-process metrics for policy evaluation.
//!
//! Counters and histograms are stored as atomics behind `DashMap` and
//! rendered in Prometheus text format on demand. Nothing here feeds back
//! into a verdict.

pub mod metrics;

pub use metrics::EngineMetrics;
