//! Telemetry primitives shared across the Revolve workspace.
//!
//! This crate centralises logging setup and the Prometheus metrics registry so
//! the pipeline and the CLI adopt a consistent observability story.
//! Layout: `init.rs` (tracing subscriber installation), `metrics.rs`
//! (Prometheus registry), `error.rs` (typed telemetry errors).
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

/// Typed telemetry errors.
pub mod error;
/// Tracing subscriber installation and logging configuration.
pub mod init;
/// Prometheus-backed metrics registry.
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
pub use metrics::Metrics;
