//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring payment
//! calculations.
//!
//! # Metrics
//!
//! - `path_engine_calculations_total{class}` - Calculations by result class
//! - `path_engine_passes` - Histogram of passes per calculation
//! - `path_engine_increments_total` - Path increments evaluated
//! - `path_engine_offers_deleted_total` - Offers removed after success
//!
//! The prefix follows [`MetricsConfig::namespace`](crate::config::MetricsConfig).

use crate::ter::Ter;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Calculations by result class
    pub calculations_total: IntCounterVec,

    /// Passes per calculation
    pub passes: Histogram,

    /// Path increments evaluated
    pub increments_total: IntCounter,

    /// Offers deleted after a successful calculation
    pub offers_deleted_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector under the default namespace
    pub fn new() -> prometheus::Result<Self> {
        Self::with_namespace("path_engine")
    }

    /// Create new metrics collector under `namespace`
    pub fn with_namespace(namespace: &str) -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let calculations_total = IntCounterVec::new(
            Opts::new("calculations_total", "Total number of payment calculations")
                .namespace(namespace),
            &["class"],
        )?;
        registry.register(Box::new(calculations_total.clone()))?;

        let passes = Histogram::with_opts(
            HistogramOpts::new("passes", "Histogram of passes per calculation")
                .namespace(namespace)
                .buckets(vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0, 1000.0]),
        )?;
        registry.register(Box::new(passes.clone()))?;

        let increments_total = IntCounter::with_opts(
            Opts::new("increments_total", "Total number of path increments evaluated")
                .namespace(namespace),
        )?;
        registry.register(Box::new(increments_total.clone()))?;

        let offers_deleted_total = IntCounter::with_opts(
            Opts::new("offers_deleted_total", "Total number of offers deleted")
                .namespace(namespace),
        )?;
        registry.register(Box::new(offers_deleted_total.clone()))?;

        Ok(Self {
            calculations_total,
            passes,
            increments_total,
            offers_deleted_total,
            registry,
        })
    }

    /// Record a finished calculation
    pub fn record_calculation(&self, result: Ter, passes: usize) {
        self.calculations_total
            .with_label_values(&[result.class().label()])
            .inc();
        self.passes.observe(passes as f64);
    }

    /// Record evaluated increments
    pub fn record_increments(&self, count: u64) {
        self.increments_total.inc_by(count);
    }

    /// Record deleted offers
    pub fn record_offers_deleted(&self, count: u64) {
        self.offers_deleted_total.inc_by(count);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
