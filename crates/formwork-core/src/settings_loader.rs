//! Loading [`Settings`] from configuration text, files, and the environment.
//!
//! A configuration document only needs the keys it changes: it is merged
//! key by key over [`Settings::default`], nested tables included. The
//! `FORMWORK_*` environment variables are applied last:
//!
//! | Variable | Setting |
//! |---|---|
//! | `FORMWORK_DEBUG` | `debug` |
//! | `FORMWORK_LOG_LEVEL` | `log_level` |
//! | `FORMWORK_UPLOAD_DIR` | `upload_dir` |
//! | `FORMWORK_MEDIA_URL` | `media_url` |
//! | `FORMWORK_MAX_UPLOAD_SIZE` | `max_upload_size` |

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{FormworkError, FormworkResult};
use crate::settings::Settings;

fn config_error(message: String) -> FormworkError {
    FormworkError::ConfigurationError(message)
}

/// Parses TOML settings.
///
/// # Examples
///
/// ```
/// use formwork_core::settings_loader::from_toml_str;
///
/// let settings = from_toml_str("media_url = \"/files/\"").unwrap();
/// assert_eq!(settings.media_url, "/files/");
/// assert_eq!(settings.log_level, "info");
/// ```
pub fn from_toml_str(text: &str) -> FormworkResult<Settings> {
    let table: toml::Table =
        toml::from_str(text).map_err(|e| config_error(format!("invalid TOML settings: {e}")))?;
    let overrides = serde_json::to_value(table)
        .map_err(|e| config_error(format!("unsupported TOML value in settings: {e}")))?;
    overlay_defaults(overrides, "TOML")
}

/// Reads and parses a TOML settings file.
pub fn from_toml_file(path: impl AsRef<Path>) -> FormworkResult<Settings> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_error(format!("cannot read settings file {}: {e}", path.display())))?;
    from_toml_str(&text)
}

/// [`from_toml_file`] followed by [`apply_env_overrides`].
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> FormworkResult<Settings> {
    from_toml_file(path).map(|mut settings| {
        apply_env_overrides(&mut settings);
        settings
    })
}

/// Parses JSON settings.
pub fn from_json_str(text: &str) -> FormworkResult<Settings> {
    let overrides: Value = serde_json::from_str(text)
        .map_err(|e| config_error(format!("invalid JSON settings: {e}")))?;
    overlay_defaults(overrides, "JSON")
}

/// The default settings with the environment applied.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Overwrites `settings` with any `FORMWORK_*` variable that is set.
///
/// A size that does not parse is ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    let var = |name: &str| std::env::var(name).ok();

    if let Some(debug) = var("FORMWORK_DEBUG") {
        settings.debug = debug.eq_ignore_ascii_case("true") || debug == "1";
    }
    if let Some(level) = var("FORMWORK_LOG_LEVEL") {
        settings.log_level = level;
    }
    if let Some(dir) = var("FORMWORK_UPLOAD_DIR") {
        settings.upload_dir = PathBuf::from(dir);
    }
    if let Some(url) = var("FORMWORK_MEDIA_URL") {
        settings.media_url = url;
    }
    if let Some(size) = var("FORMWORK_MAX_UPLOAD_SIZE").and_then(|s| s.parse().ok()) {
        settings.max_upload_size = size;
    }
}

fn overlay_defaults(overrides: Value, format: &str) -> FormworkResult<Settings> {
    let mut document = serde_json::to_value(Settings::default())?;
    overlay(&mut document, overrides);
    serde_json::from_value(document)
        .map_err(|e| config_error(format!("{format} settings do not match the schema: {e}")))
}

/// Writes `overrides` into `target`, descending into objects present on
/// both sides.
fn overlay(target: &mut Value, overrides: Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => overlay_map(target, overrides),
        (target, overrides) => *target = overrides,
    }
}

fn overlay_map(target: &mut Map<String, Value>, overrides: Map<String, Value>) {
    for (key, value) in overrides {
        match target.get_mut(&key) {
            Some(existing) => overlay(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}
