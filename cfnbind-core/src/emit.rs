//! Record emitter - typed record descriptions ready for rendering
//!
//! A `RecordArtifact` lists the schema fields in definition order, then the
//! fixed lifecycle block, then the type-name accessor. Rendering it into a
//! target language is left to the consumer.

use cfnbind_types::{LIFECYCLE_FIELDS, LifecycleField};
use heck::ToSnakeCase;
use serde::Serialize;

use crate::kind::{ResolvedType, ValueKind};
use crate::name::ResourceTypeName;
use crate::schema::TypeKind;

/// Name of the generated method returning the CloudFormation type name
pub const TYPE_ACCESSOR: &str = "aws_cloudformation_type";

const RESERVED: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// snake_case binding for a schema field, suffixed with `_` when it is a keyword
pub fn binding_name(field_name: &str) -> String {
    let snake = field_name.to_snake_case();
    if RESERVED.contains(&snake.as_str()) {
        format!("{}_", snake)
    } else {
        snake
    }
}

/// One schema-derived field of a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmittedField {
    /// Name as it appears in templates
    pub name: String,
    pub binding_name: String,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    pub required: bool,
    /// Optional fields are nullable, required ones are not
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_type: Option<String>,
}

/// Method returning the type name verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAccessor {
    pub name: &'static str,
    pub returns: String,
}

/// Structural description of one generated record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordArtifact {
    pub type_name: ResourceTypeName,
    pub record_name: String,
    pub package: String,
    pub file_stem: String,
    pub kind: TypeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub fields: Vec<EmittedField>,
    pub lifecycle: Vec<LifecycleField>,
    pub type_accessor: TypeAccessor,
}

impl RecordArtifact {
    /// Field names in emission order: schema fields, then lifecycle template keys
    pub fn member_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.lifecycle.iter().map(|f| f.template_key))
            .collect()
    }

    /// Pretty JSON with a trailing newline
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Relative artifact path, `<package>/<file_stem>.json`
    pub fn relative_path(&self) -> String {
        format!("{}/{}.json", self.package, self.file_stem)
    }
}

/// Emit the record description for a resolved type
pub fn emit_record(resolved: &ResolvedType) -> RecordArtifact {
    let definition = resolved.definition();
    let name = definition.name();

    let fields = resolved
        .fields()
        .map(|(field, kind)| EmittedField {
            name: field.name.clone(),
            binding_name: binding_name(&field.name),
            kind: kind.clone(),
            required: field.required,
            nullable: !field.required,
            documentation: field.documentation.clone(),
            update_type: field.update_type.clone(),
        })
        .collect();

    RecordArtifact {
        type_name: name.clone(),
        record_name: name.record_name(),
        package: name.package(),
        file_stem: name.file_stem(),
        kind: definition.kind(),
        documentation: definition.documentation().map(str::to_string),
        fields,
        lifecycle: LIFECYCLE_FIELDS.to_vec(),
        type_accessor: TypeAccessor {
            name: TYPE_ACCESSOR,
            returns: name.as_str().to_string(),
        },
    }
}
