//! Response envelope normalization
//!
//! Sub-services answer in different shapes: `{code, <module>: [...]}`,
//! `{data: [...]}` or a bare array. Every shape is reshaped into an object
//! carrying a `data` member next to the original top-level fields.

use serde_json::{Map, Value};
use suitelink_core::mapping::inflection::singularize;

/// Normalize a successful response body read from `endpoint`.
///
/// Returns `None` when the body is not valid JSON.
pub fn normalize(endpoint: &str, body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return Some(data_only(Value::Null));
    }

    let value: Value = serde_json::from_str(body).ok()?;
    Some(match value {
        Value::Object(map) => normalize_object(endpoint, map),
        other => data_only(other),
    })
}

fn normalize_object(endpoint: &str, mut map: Map<String, Value>) -> Value {
    if map.contains_key("data") {
        return Value::Object(map);
    }

    let data = module_key(endpoint, &map)
        .and_then(|key| map.get(&key).cloned())
        .unwrap_or_else(|| Value::Object(map.clone()));
    map.insert("data".into(), data);
    Value::Object(map)
}

/// Guess the key holding the payload from the endpoint path.
///
/// `salesorders/123` tries `123`, `salesorder`, `salesorders`, then the
/// singular form of each segment walking back towards the root.
fn module_key(endpoint: &str, map: &Map<String, Value>) -> Option<String> {
    let path = endpoint.split('?').next().unwrap_or_default();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .rev()
        .flat_map(|segment| {
            let lower = segment.to_ascii_lowercase();
            [lower.clone(), singularize(&lower)]
        })
        .find(|candidate| map.contains_key(candidate))
}

fn data_only(data: Value) -> Value {
    let mut map = Map::new();
    map.insert("data".into(), data);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn module_arrays_are_copied_into_data() {
        let body = r#"{"code":0,"message":"success","items":[{"item_id":"1"}]}"#;
        let value = normalize("items", body).unwrap();
        assert_eq!(value["data"], json!([{"item_id": "1"}]));
        assert_eq!(value["code"], 0);
        assert_eq!(value["items"][0]["item_id"], "1");
    }

    #[test]
    fn single_records_use_the_singular_key() {
        let body = r#"{"code":0,"salesorder":{"salesorder_id":"9"}}"#;
        let value = normalize("salesorders/9", body).unwrap();
        assert_eq!(value["data"]["salesorder_id"], "9");
    }

    #[test]
    fn existing_data_member_is_kept() {
        let value = normalize("Leads", r#"{"data":[{"id":"1"}],"info":{"more_records":false}}"#).unwrap();
        assert_eq!(value["data"][0]["id"], "1");
        assert_eq!(value["info"]["more_records"], false);
    }

    #[test]
    fn bare_arrays_and_empty_bodies() {
        assert_eq!(normalize("tickets", "[1,2]").unwrap(), json!({"data": [1, 2]}));
        assert_eq!(normalize("items/1", "").unwrap(), json!({"data": null}));
        assert!(normalize("items", "<html>").is_none());
    }

    #[test]
    fn unknown_shapes_fall_back_to_the_whole_object() {
        let value = normalize("settings/preferences", r#"{"code":0,"theme":"dark"}"#).unwrap();
        assert_eq!(value["data"]["theme"], "dark");
    }
}
