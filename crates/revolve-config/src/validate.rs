//! Field-level validation helpers.
//!
//! # Design
//! - Every check names the offending field and a static reason so the CLI can
//!   report configuration problems without guessing.

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

/// Validate a fully-assembled settings value.
///
/// # Errors
///
/// Returns the first field that fails validation.
pub fn validate(settings: &Settings) -> ConfigResult<()> {
    require_nonempty("database.admin_url", &settings.database.admin_url)?;
    require_nonempty("database.name", &settings.database.name)?;
    require_nonempty("array.endpoint", &settings.array.endpoint)?;
    require_nonempty("array.api_token", &settings.array.api_token)?;
    require_nonempty("array.source_volume", &settings.array.source_volume)?;
    require_nonempty("array.target_volume", &settings.array.target_volume)?;
    require_nonempty("mount.mount_bin", &settings.mount.mount_bin)?;
    require_nonempty("mount.umount_bin", &settings.mount.umount_bin)?;
    require_nonempty("logging.level", &settings.logging.level)?;

    if settings.mount.path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidField {
            field: "mount.path",
            reason: "empty",
            value: None,
        });
    }
    if settings.mount.path.is_relative() {
        return Err(ConfigError::InvalidField {
            field: "mount.path",
            reason: "not_absolute",
            value: Some(settings.mount.path.display().to_string()),
        });
    }

    if settings.array.source_volume == settings.array.target_volume {
        return Err(ConfigError::InvalidField {
            field: "array.target_volume",
            reason: "same_as_source",
            value: Some(settings.array.target_volume.clone()),
        });
    }

    Ok(())
}

fn require_nonempty(field: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            field,
            reason: "empty",
            value: Some(value.to_string()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArraySettings, DatabaseSettings, LoggingSettings, MountSettings};
    use std::path::PathBuf;

    fn sample_settings() -> Settings {
        Settings {
            database: DatabaseSettings {
                admin_url: "postgres://ops@db.internal/postgres".to_string(),
                name: "TestDB".to_string(),
            },
            mount: MountSettings {
                path: PathBuf::from("/data/TestDB"),
                mount_bin: "mount".to_string(),
                umount_bin: "umount".to_string(),
            },
            array: ArraySettings {
                endpoint: "https://array.internal".to_string(),
                api_token: "token".to_string(),
                source_volume: "prod-vol".to_string(),
                target_volume: "test-vol".to_string(),
                overwrite: true,
            },
            logging: LoggingSettings::default(),
        }
    }

    #[test]
    fn sample_settings_validate() {
        validate(&sample_settings()).expect("sample settings should be valid");
    }

    #[test]
    fn empty_database_name_is_rejected() {
        let mut settings = sample_settings();
        settings.database.name = "  ".to_string();
        let err = validate(&settings).expect_err("blank name should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "database.name",
                reason: "empty",
                ..
            }
        ));
    }

    #[test]
    fn relative_mount_path_is_rejected() {
        let mut settings = sample_settings();
        settings.mount.path = PathBuf::from("data/TestDB");
        let err = validate(&settings).expect_err("relative path should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "mount.path",
                reason: "not_absolute",
                ..
            }
        ));
    }

    #[test]
    fn identical_volume_pair_is_rejected() {
        let mut settings = sample_settings();
        settings.array.target_volume = settings.array.source_volume.clone();
        let err = validate(&settings).expect_err("identical volumes should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "array.target_volume",
                reason: "same_as_source",
                ..
            }
        ));
    }
}
