//! # Design
//!
//! - Provide structured, constant-message errors for telemetry setup.
//! - Capture the metric identifier tied to a failure to make registration
//!   problems diagnosable without string parsing.

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// Building a Prometheus collector failed.
    #[error("failed to build metrics collector")]
    MetricsCollector {
        /// Metric identifier tied to the failure.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Registering a Prometheus collector failed.
    #[error("failed to register metrics collector")]
    MetricsRegister {
        /// Metric identifier tied to the failure.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Encoding Prometheus metrics failed.
    #[error("failed to encode metrics")]
    MetricsEncode {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Rendered metrics output was not valid UTF-8.
    #[error("metrics output was not valid utf-8")]
    MetricsUtf8 {
        /// Underlying UTF-8 conversion error.
        source: std::string::FromUtf8Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn telemetry_error_messages_are_constant() {
        let err = TelemetryError::MetricsEncode {
            source: PrometheusError::Msg("boom".to_string()),
        };
        assert_eq!(err.to_string(), "failed to encode metrics");
        assert!(err.source().is_some());
    }

    #[test]
    fn collector_errors_carry_metric_names() {
        let err = TelemetryError::MetricsCollector {
            name: "refresh_steps_total",
            source: PrometheusError::Msg("bad opts".to_string()),
        };
        assert!(matches!(
            err,
            TelemetryError::MetricsCollector {
                name: "refresh_steps_total",
                ..
            }
        ));
    }
}
