//! Settings for the formwork engine.
//!
//! [`Settings`] carries the handful of knobs the field engine needs at
//! runtime: logging, and where the filesystem upload provider stores files.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default maximum size of a single uploaded file (10 MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// The complete set of engine settings.
///
/// # Examples
///
/// ```
/// use formwork_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.media_url, "/cdn/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter (e.g. "info", "formwork_forms=debug").
    pub log_level: String,

    // ── Uploads ──────────────────────────────────────────────────────

    /// Directory where the filesystem upload provider stores files.
    pub upload_dir: PathBuf,
    /// URL prefix under which stored uploads are served.
    pub media_url: String,
    /// Largest accepted upload in bytes.
    pub max_upload_size: u64,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            upload_dir: PathBuf::from("public/cdn"),
            media_url: "/cdn/".to_string(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            extra: HashMap::new(),
        }
    }
}
