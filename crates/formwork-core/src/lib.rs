//! # formwork-core
//!
//! Core types, settings, and error types for the formwork field engine.
//! This crate has no framework dependencies and provides the foundation for
//! the request and forms crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`utils`] - Utility types (ordered `MultiValueDict`, text helpers)
//! - [`settings`] - Engine settings
//! - [`settings_loader`] - Loading settings from TOML/JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{FormworkError, FormworkResult, ValidationError};
pub use settings::Settings;
