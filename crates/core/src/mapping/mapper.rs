//! Generic schema-driven mapper

use serde_json::{Map, Value};
use suitelink_domain::Result;

use super::catalog::EntityKind;
use super::schema::{EntitySchema, FieldMapping};

/// Outcome of [`EntityMapper::validate_record`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordValidation {
    /// Required store columns that are absent or null
    pub missing: Vec<String>,
}

impl RecordValidation {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Converts vendor records to store rows and back for one entity kind
#[derive(Debug, Clone)]
pub struct EntityMapper {
    schema: EntitySchema,
}

impl EntityMapper {
    pub const fn new(schema: EntitySchema) -> Self {
        Self { schema }
    }

    /// Mapper for a catalogue entity kind
    ///
    /// # Errors
    /// Fails only if the catalogue schema itself is malformed.
    pub fn for_kind(kind: EntityKind) -> Result<Self> {
        Ok(Self::new(kind.schema()?))
    }

    pub const fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Map a vendor record onto store columns.
    ///
    /// Fields absent from the input are skipped. A transform returning
    /// `None` omits the column, so a partial payload never overwrites stored
    /// values with nulls it did not send.
    pub fn transform_to_db_record(&self, external: &Map<String, Value>) -> Map<String, Value> {
        self.schema.rules().fold(Map::new(), |mut record, (name, rule)| {
            if let Some(raw) = external.get(name) {
                let mapped = match rule.transform {
                    Some(transform) => transform(raw),
                    None => Some(raw.clone()),
                };
                if let Some(value) = mapped {
                    record.insert(rule.target.to_string(), value);
                }
            }
            record
        })
    }

    /// Map a store row back to vendor field names. Values are copied as-is.
    pub fn transform_to_external(&self, record: &Map<String, Value>) -> Map<String, Value> {
        let mut external = Map::new();
        for (name, rule) in self.schema.rules() {
            if let Some(value) = record.get(rule.target) {
                if !value.is_null() {
                    external.insert(name.to_string(), value.clone());
                }
            }
        }
        external
    }

    /// Report required store columns that are missing or null
    pub fn validate_record(&self, record: &Map<String, Value>) -> RecordValidation {
        let missing = self
            .schema
            .rules()
            .filter(|(_, rule)| rule.required)
            .filter(|(_, rule)| record.get(rule.target).is_none_or(Value::is_null))
            .map(|(_, rule)| rule.target.to_string())
            .collect();
        RecordValidation { missing }
    }

    /// Pull records out of a vendor envelope.
    ///
    /// List calls answer under the plural key and single fetches under the
    /// singular key; both are tried before a generic `data` member.
    pub fn extract_from_response(&self, response: &Value) -> Vec<Map<String, Value>> {
        let Some(envelope) = response.as_object() else {
            return Vec::new();
        };

        if let Some(Value::Array(items)) = envelope.get(self.schema.list_key()) {
            return objects(items);
        }
        if let Some(Value::Object(item)) = envelope.get(self.schema.single_key()) {
            return vec![item.clone()];
        }
        match envelope.get("data") {
            Some(Value::Array(items)) => objects(items),
            Some(Value::Object(item)) => vec![item.clone()],
            _ => Vec::new(),
        }
    }

    /// Names of the external fields the schema knows about, mapped or not
    pub fn known_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.schema.fields().map(|(name, _)| name)
    }

    /// Whether `external` is declared but deliberately not stored
    pub fn is_ignored(&self, external: &str) -> bool {
        self.schema
            .fields()
            .any(|(name, mapping)| name == external && matches!(mapping, FieldMapping::Ignored))
    }
}

fn objects(items: &[Value]) -> Vec<Map<String, Value>> {
    items.iter().filter_map(Value::as_object).cloned().collect()
}
