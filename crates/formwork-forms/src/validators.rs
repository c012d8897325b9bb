//! Reusable value validators.
//!
//! Validators run after a field has coerced its raw input. Each one either
//! accepts the value or returns a [`ValidationError`] whose message becomes
//! one of the field's error strings. Validators that do not apply to the
//! value's JSON type accept it.

use std::fmt;
use std::sync::Arc;

use formwork_core::ValidationError;
use regex::Regex;
use serde_json::Value;

/// A check applied to a cleaned field value.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the given value.
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;

    /// Returns the name of this validator, used in log output.
    fn name(&self) -> &str;
}

fn char_len(value: &Value) -> Option<usize> {
    value.as_str().map(|s| s.chars().count())
}

/// Validates that a string value does not exceed a maximum length.
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
    /// The maximum allowed length in characters.
    pub max_length: usize,
}

impl MaxLengthValidator {
    /// Creates a new `MaxLengthValidator` with the given limit.
    pub const fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Validator for MaxLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match char_len(value) {
            Some(len) if len > self.max_length => Err(ValidationError::new(
                format!(
                    "Ensure this value has at most {} characters (it has {len}).",
                    self.max_length
                ),
                "max_length",
            )
            .with_param("limit_value", self.max_length.to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "MaxLengthValidator"
    }
}

/// Validates that a string value meets a minimum length.
#[derive(Debug, Clone)]
pub struct MinLengthValidator {
    /// The minimum required length in characters.
    pub min_length: usize,
}

impl MinLengthValidator {
    /// Creates a new `MinLengthValidator` with the given minimum.
    pub const fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Validator for MinLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match char_len(value) {
            Some(len) if len < self.min_length => Err(ValidationError::new(
                format!(
                    "Ensure this value has at least {} characters (it has {len}).",
                    self.min_length
                ),
                "min_length",
            )
            .with_param("limit_value", self.min_length.to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "MinLengthValidator"
    }
}

/// Validates that a numeric value does not exceed a maximum.
#[derive(Debug, Clone)]
pub struct MaxValueValidator {
    /// The maximum allowed value.
    pub max_value: f64,
}

impl MaxValueValidator {
    /// Creates a new `MaxValueValidator` with the given limit.
    pub const fn new(max_value: f64) -> Self {
        Self { max_value }
    }
}

impl Validator for MaxValueValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value.as_f64() {
            Some(n) if n > self.max_value => Err(ValidationError::new(
                format!(
                    "Ensure this value is less than or equal to {}.",
                    self.max_value
                ),
                "max_value",
            )),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "MaxValueValidator"
    }
}

/// Validates that a numeric value meets a minimum.
#[derive(Debug, Clone)]
pub struct MinValueValidator {
    /// The minimum required value.
    pub min_value: f64,
}

impl MinValueValidator {
    /// Creates a new `MinValueValidator` with the given minimum.
    pub const fn new(min_value: f64) -> Self {
        Self { min_value }
    }
}

impl Validator for MinValueValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value.as_f64() {
            Some(n) if n < self.min_value => Err(ValidationError::new(
                format!(
                    "Ensure this value is greater than or equal to {}.",
                    self.min_value
                ),
                "min_value",
            )),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "MinValueValidator"
    }
}

/// Validates that a string value matches a regular expression.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    regex: Regex,
    message: String,
}

impl RegexValidator {
    /// Creates a new `RegexValidator` with the given pattern and error message.
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value.as_str() {
            Some(s) if !self.regex.is_match(s) => {
                Err(ValidationError::new(self.message.clone(), "invalid"))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "RegexValidator"
    }
}

type CheckFn = dyn Fn(&Value) -> Result<(), String> + Send + Sync;

/// A validator backed by a closure returning an error description on failure.
///
/// # Examples
///
/// ```
/// use formwork_forms::validators::{FnValidator, Validator};
/// use serde_json::json;
///
/// let even = FnValidator::new("even", |v| match v.as_i64() {
///     Some(n) if n % 2 != 0 => Err(format!("{n} is odd")),
///     _ => Ok(()),
/// });
/// assert!(even.validate(&json!(4)).is_ok());
/// assert_eq!(even.validate(&json!(3)).unwrap_err().message, "3 is odd");
/// ```
#[derive(Clone)]
pub struct FnValidator {
    name: String,
    check: Arc<CheckFn>,
}

impl FnValidator {
    /// Creates a new closure-backed validator.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }
}

impl fmt::Debug for FnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Validator for FnValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        (self.check)(value).map_err(|message| ValidationError::new(message, "invalid"))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_max_length() {
        let v = MaxLengthValidator::new(3);
        assert!(v.validate(&json!("abc")).is_ok());
        let err = v.validate(&json!("toolong")).unwrap_err();
        assert_eq!(err.code, "max_length");
        assert_eq!(err.params.get("limit_value").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_length_counts_characters() {
        let v = MaxLengthValidator::new(2);
        assert!(v.validate(&json!("øæ")).is_ok());
    }

    #[test]
    fn test_min_length() {
        let v = MinLengthValidator::new(5);
        assert!(v.validate(&json!("hello")).is_ok());
        assert!(v.validate(&json!("hi")).is_err());
    }

    #[test]
    fn test_length_ignores_non_strings() {
        assert!(MaxLengthValidator::new(1).validate(&json!(12345)).is_ok());
        assert!(MinLengthValidator::new(3).validate(&json!(null)).is_ok());
    }

    #[test]
    fn test_value_bounds() {
        let max = MaxValueValidator::new(100.0);
        assert!(max.validate(&json!(50)).is_ok());
        assert!(max.validate(&json!(100.1)).is_err());

        let min = MinValueValidator::new(0.0);
        assert!(min.validate(&json!(0)).is_ok());
        assert!(min.validate(&json!(-1)).is_err());
        assert!(min.validate(&json!("-1")).is_ok());
    }

    #[test]
    fn test_regex() {
        let v = RegexValidator::new(r"^[a-z]+$", "lowercase only").unwrap();
        assert!(v.validate(&json!("abc")).is_ok());
        let err = v.validate(&json!("ABC")).unwrap_err();
        assert_eq!(err.message, "lowercase only");
        assert!(RegexValidator::new("(", "broken").is_err());
    }

    #[test]
    fn test_validator_names() {
        assert_eq!(MaxLengthValidator::new(5).name(), "MaxLengthValidator");
        assert_eq!(MinValueValidator::new(5.0).name(), "MinValueValidator");
        assert_eq!(FnValidator::new("custom", |_| Ok(())).name(), "custom");
    }
}
