//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the minimal set of counters relevant to refresh runs.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{TelemetryError, TelemetryResult};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    refresh_steps_total: IntCounterVec,
    refresh_runs_total: IntCounterVec,
    session_cleanup_failures_total: IntCounter,
}

/// Snapshot of selected counters for report rendering.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Total count of session cleanup failures observed.
    pub session_cleanup_failures_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new();

        let refresh_steps_total = IntCounterVec::new(
            Opts::new(
                "refresh_steps_total",
                "Refresh pipeline steps executed by status",
            ),
            &["step", "status"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "refresh_steps_total",
            source,
        })?;
        let refresh_runs_total = IntCounterVec::new(
            Opts::new("refresh_runs_total", "Refresh runs finished by outcome"),
            &["outcome"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "refresh_runs_total",
            source,
        })?;
        let session_cleanup_failures_total = IntCounter::with_opts(Opts::new(
            "session_cleanup_failures_total",
            "Copy-session release attempts that failed",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "session_cleanup_failures_total",
            source,
        })?;

        register(&registry, "refresh_steps_total", refresh_steps_total.clone())?;
        register(&registry, "refresh_runs_total", refresh_runs_total.clone())?;
        register(
            &registry,
            "session_cleanup_failures_total",
            session_cleanup_failures_total.clone(),
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                refresh_steps_total,
                refresh_runs_total,
                session_cleanup_failures_total,
            }),
        })
    }

    /// Increment the step counter for the given step and status.
    pub fn inc_refresh_step(&self, step: &str, status: &str) {
        self.inner
            .refresh_steps_total
            .with_label_values(&[step, status])
            .inc();
    }

    /// Increment the run counter for the given terminal outcome.
    pub fn inc_run_outcome(&self, outcome: &str) {
        self.inner
            .refresh_runs_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record a failed copy-session release.
    pub fn inc_session_cleanup_failure(&self) {
        self.inner.session_cleanup_failures_total.inc();
    }

    /// Snapshot selected counters for report rendering.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            session_cleanup_failures_total: self.inner.session_cleanup_failures_total.get(),
        }
    }

    /// Render the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or are not valid
    /// UTF-8.
    pub fn render(&self) -> TelemetryResult<String> {
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }
}

fn register<C>(registry: &Registry, name: &'static str, collector: C) -> TelemetryResult<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_render_includes_incremented_counters() -> TelemetryResult<()> {
        let metrics = Metrics::new()?;
        metrics.inc_refresh_step("take_offline", "completed");
        metrics.inc_refresh_step("take_offline", "completed");
        metrics.inc_run_outcome("completed");

        let rendered = metrics.render()?;
        assert!(
            rendered.contains(r#"refresh_steps_total{status="completed",step="take_offline"} 2"#),
            "unexpected exposition output: {rendered}"
        );
        assert!(rendered.contains(r#"refresh_runs_total{outcome="completed"} 1"#));
        Ok(())
    }

    #[test]
    fn snapshot_tracks_cleanup_failures() -> TelemetryResult<()> {
        let metrics = Metrics::new()?;
        assert_eq!(metrics.snapshot().session_cleanup_failures_total, 0);
        metrics.inc_session_cleanup_failure();
        assert_eq!(metrics.snapshot().session_cleanup_failures_total, 1);
        Ok(())
    }
}
