//! Declarative entity mapping
//!
//! One generic [`EntityMapper`] converts vendor payloads into store rows and
//! back, parameterized by an [`EntitySchema`] value (external field to rule).
//! The [`catalog`] holds the schema of every mirrored entity kind.

pub mod catalog;
pub mod inflection;
pub mod mapper;
pub mod schema;
pub mod transforms;

pub use mapper::{EntityMapper, RecordValidation};
pub use schema::{EntitySchema, EntitySchemaBuilder, FieldMapping, FieldRule, SchemaError, Transform};
