//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers deserialised from `revolve.toml`.
//! - Defaults mirror what the refresh operation overwhelmingly uses; anything
//!   environment-specific has no default and must be provided.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings consumed by the refresh tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Target database connection and identity.
    pub database: DatabaseSettings,
    /// Mount point backing the target database.
    pub mount: MountSettings,
    /// Storage array endpoint and volume pair.
    pub array: ArraySettings,
    /// Logging preferences.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Database controller settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Connection URL for the maintenance database the controller talks to.
    /// The target database itself must not be used here; it goes offline
    /// mid-run.
    pub admin_url: String,
    /// Name of the database being refreshed.
    pub name: String,
}

/// Mount manager settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MountSettings {
    /// Filesystem path bound to the target volume (must have an fstab entry).
    pub path: PathBuf,
    /// Binary invoked to mount the path.
    #[serde(default = "default_mount_bin")]
    pub mount_bin: String,
    /// Binary invoked to unmount the path.
    #[serde(default = "default_umount_bin")]
    pub umount_bin: String,
}

/// Storage array settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArraySettings {
    /// Base URL of the array's volume-management API.
    pub endpoint: String,
    /// API token presented on every request.
    pub api_token: String,
    /// Volume whose content is copied (typically the production volume).
    pub source_volume: String,
    /// Volume that receives the copy (the non-production volume).
    pub target_volume: String,
    /// Whether the target volume's existing content may be discarded.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log level directive (e.g. `info`, `debug`, `revolve=trace`).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (`json` or `pretty`); inferred from the build when unset.
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_mount_bin() -> String {
    "mount".to_string()
}

fn default_umount_bin() -> String {
    "umount".to_string()
}

const fn default_overwrite() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_settings_default_to_info() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert!(logging.format.is_none());
    }
}
