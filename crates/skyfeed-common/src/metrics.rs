//! ---
//! sky_section: "01-core-functionality"
//! sky_subsection: "module"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "Shared primitives and utilities for the SkyFeed runtime."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};

/// Shared registry type used across services.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Feed-level instrumentation recorded by the API layer after each batch.
#[derive(Debug, Clone)]
pub struct FeedMetrics {
    batches_total: IntCounter,
    points_emitted_total: IntCounter,
    batch_size: Histogram,
    backlog_depth: IntGauge,
    cursor_position: IntGauge,
    cycles_total: IntGauge,
}

impl FeedMetrics {
    pub fn new(registry: &Registry) -> Result<Self> {
        let batches_total = IntCounter::with_opts(Opts::new(
            "skyfeed_batches_total",
            "Telemetry batches served since startup.",
        ))?;
        let points_emitted_total = IntCounter::with_opts(Opts::new(
            "skyfeed_points_emitted_total",
            "Telemetry points delivered to clients since startup.",
        ))?;
        let batch_size = Histogram::with_opts(
            HistogramOpts::new(
                "skyfeed_batch_size",
                "Distribution of points per served batch.",
            )
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
        )?;
        let backlog_depth = IntGauge::with_opts(Opts::new(
            "skyfeed_backlog_depth",
            "Points currently withheld to simulate delayed delivery.",
        ))?;
        let cursor_position = IntGauge::with_opts(Opts::new(
            "skyfeed_cursor_position",
            "Current index into the trajectory.",
        ))?;
        let cycles_total = IntGauge::with_opts(Opts::new(
            "skyfeed_cycles_total",
            "Completed trajectory traversals.",
        ))?;

        registry.register(Box::new(batches_total.clone()))?;
        registry.register(Box::new(points_emitted_total.clone()))?;
        registry.register(Box::new(batch_size.clone()))?;
        registry.register(Box::new(backlog_depth.clone()))?;
        registry.register(Box::new(cursor_position.clone()))?;
        registry.register(Box::new(cycles_total.clone()))?;

        Ok(Self {
            batches_total,
            points_emitted_total,
            batch_size,
            backlog_depth,
            cursor_position,
            cycles_total,
        })
    }

    /// Record one served batch.
    pub fn observe_batch(&self, points: usize) {
        self.batches_total.inc();
        self.points_emitted_total.inc_by(points as u64);
        self.batch_size.observe(points as f64);
    }

    /// Mirror engine-owned gauges after a batch has been produced.
    pub fn update_engine_state(&self, cursor: usize, backlog: usize, cycles: u64) {
        self.cursor_position.set(cursor as i64);
        self.backlog_depth.set(backlog as i64);
        self.cycles_total.set(cycles as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_counts() {
        let registry = new_registry();
        let metrics = FeedMetrics::new(&registry).expect("register metrics");
        metrics.observe_batch(3);
        metrics.observe_batch(0);
        metrics.update_engine_state(4, 1, 2);

        let families = registry.gather();
        let batches = families
            .iter()
            .find(|family| family.get_name() == "skyfeed_batches_total")
            .expect("batches family present");
        assert_eq!(batches.get_metric()[0].get_counter().get_value(), 2.0);

        let backlog = families
            .iter()
            .find(|family| family.get_name() == "skyfeed_backlog_depth")
            .expect("backlog family present");
        assert_eq!(backlog.get_metric()[0].get_gauge().get_value(), 1.0);
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = new_registry();
        let _metrics = FeedMetrics::new(&registry).expect("first registration");
        assert!(FeedMetrics::new(&registry).is_err());
    }
}
