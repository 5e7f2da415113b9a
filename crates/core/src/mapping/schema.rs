//! Entity schema values
//!
//! A schema maps each external field name either to nothing (the field is
//! known but ignored) or to a [`FieldRule`] naming the store column, whether
//! the column is required, and an optional pure transform.

use serde_json::Value;
use suitelink_domain::SuiteLinkError;
use thiserror::Error;

use super::inflection::{pluralize, singularize};

/// Pure normalization applied to a raw external value.
///
/// Returning `None` means "omit from the output", which is different from
/// returning `Some(Value::Null)` ("explicitly null").
pub type Transform = fn(&Value) -> Option<Value>;

/// Mapping rule for one external field
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub target: &'static str,
    pub required: bool,
    /// Marks the external primary identifier
    pub primary: bool,
    pub transform: Option<Transform>,
}

impl FieldRule {
    pub const fn new(target: &'static str) -> Self {
        Self { target, required: false, primary: false, transform: None }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self.required = true;
        self
    }

    #[must_use]
    pub const fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Entry of a schema: ignored or mapped
#[derive(Debug, Clone, Copy)]
pub enum FieldMapping {
    Ignored,
    Mapped(FieldRule),
}

/// Errors raised while building a schema
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema '{entity}' has no primary identifier")]
    MissingPrimaryKey { entity: String },

    #[error("schema '{entity}' has more than one primary identifier: {fields:?}")]
    MultiplePrimaryKeys { entity: String, fields: Vec<String> },

    #[error("schema '{entity}' primary identifier '{field}' must be required")]
    OptionalPrimaryKey { entity: String, field: String },

    #[error("schema '{entity}' maps external field '{field}' twice")]
    DuplicateField { entity: String, field: String },

    #[error("schema '{entity}' maps more than one field to column '{target}'")]
    DuplicateTarget { entity: String, target: String },
}

impl From<SchemaError> for SuiteLinkError {
    fn from(err: SchemaError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Declarative description of one vendor entity kind
#[derive(Debug, Clone)]
pub struct EntitySchema {
    entity: &'static str,
    list_key: String,
    single_key: String,
    endpoint: String,
    fields: Vec<(&'static str, FieldMapping)>,
    primary: (&'static str, FieldRule),
}

impl EntitySchema {
    /// Start a schema for the resource named `entity` (singular, lowercase)
    pub fn builder(entity: &'static str) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            entity,
            list_key: None,
            single_key: None,
            endpoint: None,
            fields: Vec::new(),
        }
    }

    pub const fn entity(&self) -> &'static str {
        self.entity
    }

    /// Envelope key of list payloads
    pub fn list_key(&self) -> &str {
        &self.list_key
    }

    /// Envelope key of single-record payloads
    pub fn single_key(&self) -> &str {
        &self.single_key
    }

    /// Path of the list endpoint relative to the service base URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// All entries in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldMapping)> {
        self.fields.iter().map(|(name, mapping)| (*name, mapping))
    }

    /// Mapped entries in declaration order
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &FieldRule)> {
        self.fields.iter().filter_map(|(name, mapping)| match mapping {
            FieldMapping::Mapped(rule) => Some((*name, rule)),
            FieldMapping::Ignored => None,
        })
    }

    /// Rule for an external field, if mapped
    pub fn rule(&self, external: &str) -> Option<&FieldRule> {
        self.rules().find(|(name, _)| *name == external).map(|(_, rule)| rule)
    }

    /// External primary identifier and its rule
    pub const fn primary_field(&self) -> (&'static str, &FieldRule) {
        (self.primary.0, &self.primary.1)
    }
}

/// Builder enforcing the schema invariants
#[derive(Debug, Clone)]
pub struct EntitySchemaBuilder {
    entity: &'static str,
    list_key: Option<String>,
    single_key: Option<String>,
    endpoint: Option<String>,
    fields: Vec<(&'static str, FieldMapping)>,
}

impl EntitySchemaBuilder {
    /// Override the list envelope key (defaults to the plural of the entity)
    #[must_use]
    pub fn list_key(mut self, key: &str) -> Self {
        self.list_key = Some(key.to_string());
        self
    }

    /// Override the single-record envelope key (defaults to the singular of
    /// the list key)
    #[must_use]
    pub fn single_key(mut self, key: &str) -> Self {
        self.single_key = Some(key.to_string());
        self
    }

    /// Override the list endpoint path (defaults to the list key)
    #[must_use]
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Required external primary identifier
    #[must_use]
    pub fn primary(self, external: &'static str, target: &'static str, transform: Transform) -> Self {
        self.rule(external, FieldRule::new(target).primary().transform(transform))
    }

    /// Required field without transform
    #[must_use]
    pub fn required(self, external: &'static str, target: &'static str) -> Self {
        self.rule(external, FieldRule::new(target).required())
    }

    /// Required field with transform
    #[must_use]
    pub fn required_with(
        self,
        external: &'static str,
        target: &'static str,
        transform: Transform,
    ) -> Self {
        self.rule(external, FieldRule::new(target).required().transform(transform))
    }

    /// Optional field copied verbatim
    #[must_use]
    pub fn field(self, external: &'static str, target: &'static str) -> Self {
        self.rule(external, FieldRule::new(target))
    }

    /// Optional field with transform
    #[must_use]
    pub fn with(self, external: &'static str, target: &'static str, transform: Transform) -> Self {
        self.rule(external, FieldRule::new(target).transform(transform))
    }

    /// Known field that is never stored
    #[must_use]
    pub fn ignore(mut self, external: &'static str) -> Self {
        self.fields.push((external, FieldMapping::Ignored));
        self
    }

    /// Arbitrary rule
    #[must_use]
    pub fn rule(mut self, external: &'static str, rule: FieldRule) -> Self {
        self.fields.push((external, FieldMapping::Mapped(rule)));
        self
    }

    /// Validate and build the schema
    ///
    /// # Errors
    /// Returns a [`SchemaError`] unless exactly one required primary
    /// identifier exists and every external field and target is unique.
    pub fn build(self) -> Result<EntitySchema, SchemaError> {
        let entity = self.entity.to_string();

        for (index, (name, _)) in self.fields.iter().enumerate() {
            if self.fields[..index].iter().any(|(other, _)| other == name) {
                return Err(SchemaError::DuplicateField { entity, field: (*name).to_string() });
            }
        }

        let mut targets: Vec<&str> = Vec::new();
        let mut primaries = Vec::new();
        for (name, mapping) in &self.fields {
            let FieldMapping::Mapped(rule) = mapping else { continue };
            if targets.contains(&rule.target) {
                return Err(SchemaError::DuplicateTarget { entity, target: rule.target.to_string() });
            }
            targets.push(rule.target);
            if rule.primary {
                if !rule.required {
                    return Err(SchemaError::OptionalPrimaryKey {
                        entity,
                        field: (*name).to_string(),
                    });
                }
                primaries.push((*name, *rule));
            }
        }

        let primary = match primaries.as_slice() {
            [] => return Err(SchemaError::MissingPrimaryKey { entity }),
            [single] => *single,
            many => {
                return Err(SchemaError::MultiplePrimaryKeys {
                    entity,
                    fields: many.iter().map(|(name, _)| (*name).to_string()).collect(),
                })
            }
        };

        let list_key = self.list_key.unwrap_or_else(|| pluralize(self.entity));
        let single_key = self.single_key.unwrap_or_else(|| singularize(&list_key));
        let endpoint = self.endpoint.unwrap_or_else(|| list_key.clone());

        Ok(EntitySchema { entity: self.entity, list_key, single_key, endpoint, fields: self.fields, primary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::transforms::id_string;

    #[test]
    fn derives_envelope_keys_from_entity() {
        let schema = EntitySchema::builder("item")
            .primary("item_id", "zoho_item_id", id_string)
            .field("name", "name")
            .build()
            .unwrap();
        assert_eq!(schema.list_key(), "items");
        assert_eq!(schema.single_key(), "item");
        assert_eq!(schema.endpoint(), "items");
        assert_eq!(schema.primary_field().0, "item_id");
        assert!(schema.primary_field().1.required);
    }

    #[test]
    fn overrides_take_precedence() {
        let schema = EntitySchema::builder("contact_person")
            .list_key("contact_persons")
            .endpoint("contacts/contactpersons")
            .primary("contact_person_id", "zoho_contact_person_id", id_string)
            .build()
            .unwrap();
        assert_eq!(schema.single_key(), "contact_person");
        assert_eq!(schema.endpoint(), "contacts/contactpersons");
    }

    #[test]
    fn rejects_missing_primary() {
        let err = EntitySchema::builder("item").field("name", "name").build().unwrap_err();
        assert_eq!(err, SchemaError::MissingPrimaryKey { entity: "item".into() });
    }

    #[test]
    fn rejects_two_primaries() {
        let err = EntitySchema::builder("item")
            .primary("item_id", "zoho_item_id", id_string)
            .primary("sku", "sku", id_string)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::MultiplePrimaryKeys { ref fields, .. } if fields.len() == 2));
    }

    #[test]
    fn rejects_optional_primary() {
        let rule = FieldRule { primary: true, ..FieldRule::new("zoho_item_id") };
        let err = EntitySchema::builder("item").rule("item_id", rule).build().unwrap_err();
        assert!(matches!(err, SchemaError::OptionalPrimaryKey { .. }));
    }

    #[test]
    fn rejects_duplicate_fields_and_targets() {
        let err = EntitySchema::builder("item")
            .primary("item_id", "zoho_item_id", id_string)
            .field("name", "name")
            .ignore("name")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));

        let err = EntitySchema::builder("item")
            .primary("item_id", "zoho_item_id", id_string)
            .field("name", "name")
            .field("item_name", "name")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTarget { .. }));
    }

    #[test]
    fn ignored_fields_are_not_rules() {
        let schema = EntitySchema::builder("item")
            .primary("item_id", "zoho_item_id", id_string)
            .ignore("image_name")
            .build()
            .unwrap();
        assert_eq!(schema.fields().count(), 2);
        assert_eq!(schema.rules().count(), 1);
        assert!(schema.rule("image_name").is_none());
    }
}
