//! Column encodings shared by the SQLite repositories

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use serde_json::{Map, Value};

/// Epoch milliseconds stored in INTEGER timestamp columns.
pub(crate) fn to_millis(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn from_millis(index: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Integer,
            format!("timestamp out of range: {millis}").into(),
        )
    })
}

pub(crate) fn opt_from_millis(
    index: usize,
    millis: Option<i64>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    millis.map(|ms| from_millis(index, ms)).transpose()
}

/// ISO-8601 calendar dates stored in TEXT columns compare lexicographically.
pub(crate) fn to_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn from_iso_date(index: usize, text: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

pub(crate) fn json_object(index: usize, text: &str) -> rusqlite::Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(err) => Err(rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))),
    }
}
