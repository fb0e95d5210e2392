//! # Design
//!
//! - Structured, constant-message errors for configuration loading.
//! - Field identifiers stay machine-readable so callers can map failures back
//!   to the offending setting without parsing prose.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("failed to read configuration file")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Parsing the configuration file failed.
    #[error("failed to parse configuration file")]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// A configuration value failed validation.
    #[error("invalid configuration value")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn config_error_messages_are_constant() {
        let err = ConfigError::InvalidField {
            field: "array.endpoint",
            reason: "empty",
            value: Some(String::new()),
        };
        assert_eq!(err.to_string(), "invalid configuration value");
        assert!(err.source().is_none());
    }

    #[test]
    fn io_error_preserves_source() {
        let err = ConfigError::Io {
            path: PathBuf::from("revolve.toml"),
            source: io::Error::other("io"),
        };
        assert!(err.source().is_some());
    }
}
