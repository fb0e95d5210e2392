//! Configuration loading from TOML files and the environment.
//!
//! # Design
//! - The file supplies the full structure; `REVOLVE_*` variables override
//!   individual values so automation can inject credentials without editing
//!   the file.
//! - Override resolution takes a lookup function, keeping tests free of
//!   process-global environment mutation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;
use crate::validate::validate;

/// Load, override, and validate settings from the given TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the resulting
/// settings fail validation.
pub fn load(path: &Path) -> ConfigResult<Settings> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut settings = parse(path, &raw)?;
    apply_overrides(&mut settings, |name| std::env::var(name).ok());
    validate(&settings)?;
    Ok(settings)
}

/// Parse settings from a TOML string without touching the environment.
///
/// # Errors
///
/// Returns an error if the document cannot be parsed or fails validation.
pub fn from_toml_str(raw: &str) -> ConfigResult<Settings> {
    let settings = parse(Path::new("<inline>"), raw)?;
    validate(&settings)?;
    Ok(settings)
}

fn parse(path: &Path, raw: &str) -> ConfigResult<Settings> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `REVOLVE_*` overrides resolved through `lookup`.
pub(crate) fn apply_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("REVOLVE_DATABASE_ADMIN_URL") {
        settings.database.admin_url = value;
    }
    if let Some(value) = lookup("REVOLVE_DATABASE_NAME") {
        settings.database.name = value;
    }
    if let Some(value) = lookup("REVOLVE_MOUNT_PATH") {
        settings.mount.path = PathBuf::from(value);
    }
    if let Some(value) = lookup("REVOLVE_ARRAY_ENDPOINT") {
        settings.array.endpoint = value;
    }
    if let Some(value) = lookup("REVOLVE_ARRAY_API_TOKEN") {
        settings.array.api_token = value;
    }
    if let Some(value) = lookup("REVOLVE_ARRAY_SOURCE_VOLUME") {
        settings.array.source_volume = value;
    }
    if let Some(value) = lookup("REVOLVE_ARRAY_TARGET_VOLUME") {
        settings.array.target_volume = value;
    }
    if let Some(value) = lookup("REVOLVE_OVERWRITE") {
        settings.array.overwrite = parse_flag(&value).unwrap_or(settings.array.overwrite);
    }
    if let Some(value) = lookup("REVOLVE_LOG_LEVEL") {
        settings.logging.level = value;
    }
    if let Some(value) = lookup("REVOLVE_LOG_FORMAT") {
        settings.logging.format = Some(value);
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
