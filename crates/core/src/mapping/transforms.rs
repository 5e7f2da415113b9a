//! Field transforms shared by the entity catalogue
//!
//! Every function here is pure. `None` omits the column from the mapped
//! record; `Some(Value::Null)` writes an explicit null.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Number, Value};

/// Trimmed text, with blank strings treated as null
pub fn trimmed_string(value: &Value) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Null),
        Value::String(s) => {
            let trimmed = s.trim();
            Some(if trimmed.is_empty() { Value::Null } else { Value::String(trimmed.to_string()) })
        }
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Identifier as text; vendor ids arrive as either strings or numbers
pub fn id_string(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(Value::String(s.trim().to_string())),
        Value::Number(n) => Some(Value::String(n.to_string())),
        _ => None,
    }
}

/// Floating point number, accepting numeric strings such as `"1,250.50"`
pub fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Null),
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return Some(Value::Null);
            }
            cleaned.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whole number; fractional input is truncated toward zero
#[allow(clippy::cast_possible_truncation)]
pub fn to_integer(value: &Value) -> Option<Value> {
    match to_number(value)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(Value::from),
        other => Some(other),
    }
}

/// Boolean, accepting `"true"`/`"false"`, `"yes"`/`"no"` and `0`/`1`
pub fn to_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Null | Value::Bool(_) => Some(value.clone()),
        Value::Number(n) => n.as_i64().map(|n| Value::Bool(n != 0)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(Value::Bool(true)),
            "false" | "no" | "0" => Some(Value::Bool(false)),
            "" => Some(Value::Null),
            _ => None,
        },
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Calendar date normalized to `YYYY-MM-DD`
pub fn to_date(value: &Value) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Null),
        Value::String(s) if s.trim().is_empty() => Some(Value::Null),
        Value::String(s) => {
            let s = s.trim();
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| parse_timestamp(s).map(|ts| ts.date_naive()))?;
            Some(Value::String(date.format("%Y-%m-%d").to_string()))
        }
        _ => None,
    }
}

/// Timestamp normalized to RFC 3339 UTC
pub fn to_timestamp(value: &Value) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Null),
        Value::String(s) if s.trim().is_empty() => Some(Value::Null),
        Value::String(s) => parse_timestamp(s.trim()).map(|ts| Value::String(ts.to_rfc3339())),
        _ => None,
    }
}

/// Lowercased text
pub fn lowercase(value: &Value) -> Option<Value> {
    match trimmed_string(value)? {
        Value::String(s) => Some(Value::String(s.to_lowercase())),
        other => Some(other),
    }
}

/// Status text; vendor statuses are lowercased and blank becomes `active`
pub fn status(value: &Value) -> Option<Value> {
    match lowercase(value)? {
        Value::Null => Some(Value::String(suitelink_domain::constants::DEFAULT_ITEM_STATUS.into())),
        other => Some(other),
    }
}

/// Email address, lowercased, only when it looks like one
pub fn email(value: &Value) -> Option<Value> {
    match lowercase(value)? {
        Value::String(s) if s.contains('@') => Some(Value::String(s)),
        Value::String(_) => None,
        other => Some(other),
    }
}

/// Nested structure serialized to JSON text
pub fn to_json_text(value: &Value) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Null),
        Value::Array(_) | Value::Object(_) => Some(Value::String(value.to_string())),
        _ => None,
    }
}

/// `name` of a nested lookup object such as `{"id": "1", "name": "Acme"}`
pub fn nested_name(value: &Value) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Null),
        Value::Object(map) => map.get("name").and_then(trimmed_string),
        Value::String(_) => trimmed_string(value),
        _ => None,
    }
}

/// `id` of a nested lookup object
pub fn nested_id(value: &Value) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Null),
        Value::Object(map) => map.get("id").and_then(id_string),
        _ => id_string(value),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
