//! cfnbind-core - typed record generation from CloudFormation schemas
//!
//! Reads resource specifications or registry schemas, resolves every field
//! kind, and emits one record description per resource and property type.
//! The records are collected into a [`Catalog`] keyed by type name.

pub mod catalog;
pub mod config;
pub mod emit;
pub mod error;
pub mod kind;
pub mod name;
pub mod pipeline;
pub mod schema;

pub use catalog::{Catalog, CatalogBuilder, CatalogEntry, CatalogIndex};
pub use config::GeneratorConfig;
pub use emit::{EmittedField, RecordArtifact, emit_record};
pub use error::{EntryFailure, SchemaError, SchemaResult};
pub use kind::{KindResolver, Primitive, ValueKind};
pub use name::ResourceTypeName;
pub use pipeline::{GenerationReport, Generator};
pub use schema::{
    FieldDefinition, FormatParseError, ParsedSchema, ResourceTypeDefinition, SchemaFormat,
    TypeKind, parse_schema,
};

/// Parse one document and generate its catalog on the calling thread
pub fn generate_from_str(input: &str, config: &GeneratorConfig) -> SchemaResult<GenerationReport> {
    let generator = Generator::new(config.clone());
    let schema = generator.read([input])?;
    generator.generate(schema)
}
