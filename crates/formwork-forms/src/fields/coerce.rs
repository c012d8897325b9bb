//! Type coercion of raw field input.
//!
//! Each function rewrites a field value in place. Coercion failures null the
//! value and append a descriptive message to the field's errors.

use chrono::{DateTime, NaiveDate};
use serde_json::{json, Map, Number, Value};

use crate::validators::{MaxValueValidator, MinValueValidator, Validator};
use crate::widgets::{display_value, Choice};

/// Returns true when `value` counts as missing for the required check.
pub(super) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Interprets a posted checkbox value.
pub(super) fn checkbox(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| !v.is_empty() && !matches!(v, "false" | "0" | "off"))
}

pub(super) fn empty_to_null(value: &mut Value) {
    if value.as_str().is_some_and(str::is_empty) {
        *value = Value::Null;
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(int.into());
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

pub(super) fn number(
    value: &mut Value,
    errors: &mut Vec<String>,
    min: Option<f64>,
    max: Option<f64>,
) {
    let parsed = match &*value {
        Value::Null => return,
        Value::String(s) if s.trim().is_empty() => {
            *value = Value::Null;
            return;
        }
        Value::String(s) => parse_number(s.trim()),
        Value::Number(n) => Some(n.clone()),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    };

    let Some(parsed) = parsed else {
        tracing::debug!(value = %value, "number coercion failed");
        errors.push(format!("value {} is not a number", display_value(value)));
        *value = Value::Null;
        return;
    };

    *value = Value::Number(parsed);
    let below = min.and_then(|m| MinValueValidator::new(m).validate(value).err());
    let above = max.and_then(|m| MaxValueValidator::new(m).validate(value).err());
    errors.extend(below.into_iter().chain(above).map(|e| e.message));
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

pub(super) fn date(value: &mut Value, errors: &mut Vec<String>) {
    let text = match &*value {
        Value::Null | Value::Bool(false) => {
            *value = Value::Null;
            return;
        }
        Value::String(s) if s.trim().is_empty() => {
            *value = Value::Null;
            return;
        }
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    match parse_date(&text) {
        Some(date) => *value = Value::String(date.format("%Y-%m-%d").to_string()),
        None => {
            tracing::debug!(value = %text, "date coercion failed");
            errors.push(format!("value {text} is not a valid date"));
            *value = Value::Null;
        }
    }
}

fn check_choice(entry: &Value, choices: &[Choice], errors: &mut Vec<String>) -> Option<Value> {
    let text = display_value(entry);
    if choices.iter().any(|(val, _)| *val == text) {
        Some(Value::String(text))
    } else {
        errors.push(format!("value {text} is not a valid choice"));
        None
    }
}

pub(super) fn choice(value: &mut Value, errors: &mut Vec<String>, choices: &[Choice]) {
    empty_to_null(value);
    if value.is_null() {
        return;
    }
    *value = check_choice(value, choices, errors).unwrap_or(Value::Null);
}

pub(super) fn choice_multi(value: &mut Value, errors: &mut Vec<String>, choices: &[Choice]) {
    let entries = match std::mem::take(value) {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        scalar => vec![scalar],
    };
    *value = Value::Array(
        entries
            .iter()
            .filter(|entry| !is_blank(entry))
            .filter_map(|entry| check_choice(entry, choices, errors))
            .collect(),
    );
}

fn parse_coordinates(text: &str) -> Option<(Number, Number)> {
    let (lat, lng) = text.split_once(',')?;
    if lng.contains(',') {
        return None;
    }
    let lat = lat.trim().parse::<f64>().ok().and_then(Number::from_f64)?;
    let lng = lng.trim().parse::<f64>().ok().and_then(Number::from_f64)?;
    Some((lat, lng))
}

pub(super) fn geo(value: &mut Value, address: Option<&str>) {
    let mut location = match &*value {
        Value::String(text) => match parse_coordinates(text) {
            Some((lat, lng)) => {
                let mut location = Map::new();
                location.insert("geometry".into(), json!({"lat": lat, "lng": lng}));
                location
            }
            None => {
                *value = Value::Null;
                return;
            }
        },
        Value::Object(existing) if existing.contains_key("geometry") => existing.clone(),
        _ => {
            *value = Value::Null;
            return;
        }
    };
    if let Some(address) = address.filter(|a| !a.is_empty()) {
        location.insert("address".into(), Value::String(address.to_string()));
    }
    *value = Value::Object(location);
}

pub(super) fn dict(value: &mut Value, errors: &mut Vec<String>) {
    let Value::String(text) = &*value else {
        return;
    };
    if text.trim().is_empty() {
        *value = Value::Null;
        return;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(parsed) => *value = parsed,
        Err(e) => {
            tracing::debug!(error = %e, "dict coercion failed");
            errors.push("value is not valid JSON".to_string());
            *value = Value::Null;
        }
    }
}
