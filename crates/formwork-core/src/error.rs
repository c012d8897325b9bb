//! Core error types for formwork.
//!
//! Two kinds of failure exist in the engine. Request-time problems (a missing
//! required value, a rejected validator, a failed upload) never escape as
//! `Err`; they are recorded on the field as error messages. [`FormworkError`]
//! covers everything else: construction-time misconfiguration, settings
//! loading, and collaborator IO.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A single validation failure produced by a validator or a type coercion.
///
/// # Examples
///
/// ```
/// use formwork_core::error::ValidationError;
///
/// let err = ValidationError::new("this field is required", "required");
/// assert_eq!(err.to_string(), "this field is required");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The message surfaced to the user.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
    /// Additional parameters describing the failure.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for formwork.
#[derive(Error, Debug)]
pub enum FormworkError {
    /// A value failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A field or form was declared inconsistently.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ValidationError> for FormworkError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

impl From<serde_json::Error> for FormworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormworkError>`.
pub type FormworkResult<T> = Result<T, FormworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("this field is required", "required");
        assert_eq!(err.to_string(), "this field is required");
        assert_eq!(err.code, "required");
    }

    #[test]
    fn test_validation_error_with_param() {
        let err = ValidationError::new("Too short.", "min_length").with_param("min", "8");
        assert_eq!(err.params.get("min").unwrap(), "8");
    }

    #[test]
    fn test_error_display() {
        let err = FormworkError::ImproperlyConfigured("reference target missing".into());
        assert_eq!(
            err.to_string(),
            "Improperly configured: reference target missing"
        );
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: FormworkError = ValidationError::new("bad", "invalid").into();
        assert!(matches!(err, FormworkError::ValidationError(_)));
        assert_eq!(err.to_string(), "Validation error: bad");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FormworkError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FormworkError = json_err.into();
        assert!(matches!(err, FormworkError::SerializationError(_)));
    }
}
