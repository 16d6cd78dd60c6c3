//! Schema - in-memory model of CloudFormation resource and property types
//!
//! Two source formats are understood:
//! - the resource specification (`CloudFormationResourceSpecification.json`)
//! - registry schemas as returned by `aws cloudformation describe-type`
//!
//! Every entry is parsed on its own; a malformed entry is reported as an
//! `EntryFailure` and the remaining entries are still returned.

mod registry;
mod specification;

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{EntryFailure, SchemaError, SchemaResult};
use crate::name::ResourceTypeName;

/// Whether a definition is a top-level resource or a nested property type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Resource,
    Property,
}

impl TypeKind {
    /// Top-level types can be declared on their own in a template
    pub fn is_top_level(&self) -> bool {
        matches!(self, TypeKind::Resource)
    }
}

/// One named field of a resource or property type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    /// Canonical kind string, e.g. `String`, `List<Listener>`, `Map<Integer>`
    pub kind: String,
    pub required: bool,
    pub documentation: Option<String>,
    /// `Mutable`, `Immutable` or `Conditional` when the source says so
    pub update_type: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            required: false,
            documentation: None,
            update_type: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn with_update_type(mut self, update_type: impl Into<String>) -> Self {
        self.update_type = Some(update_type.into());
        self
    }
}

/// A resource or property type with its ordered fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeDefinition {
    name: ResourceTypeName,
    kind: TypeKind,
    fields: Vec<FieldDefinition>,
    documentation: Option<String>,
}

impl ResourceTypeDefinition {
    /// Field order is kept as given. Fails if two fields share a name, or if
    /// the kind disagrees with the shape of the name (`A::B::C` is a resource,
    /// `A::B::C.D` and `Tag` are property types).
    pub fn new(
        name: ResourceTypeName,
        kind: TypeKind,
        fields: Vec<FieldDefinition>,
    ) -> SchemaResult<Self> {
        if kind.is_top_level() == name.is_property_type() {
            let expected = if name.is_property_type() {
                "a property type"
            } else {
                "a resource type"
            };
            return Err(SchemaError::parse(
                name.as_str(),
                format!("declared as {:?} but the name denotes {}", kind, expected),
            ));
        }
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::parse(
                    name.as_str(),
                    format!("field '{}' is declared more than once", field.name),
                ));
            }
        }
        Ok(Self {
            name,
            kind,
            fields,
            documentation: None,
        })
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn name(&self) -> &ResourceTypeName {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Input format of a schema source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFormat {
    /// CloudFormation resource specification (`PropertyTypes` / `ResourceTypes`)
    #[default]
    Specification,
    /// Registry schema (`typeName` / `properties` / `definitions`)
    Registry,
}

impl SchemaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFormat::Specification => "specification",
            SchemaFormat::Registry => "registry",
        }
    }
}

impl fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognized schema format name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown schema format '{0}', expected 'specification' or 'registry'")]
pub struct FormatParseError(pub String);

impl FromStr for SchemaFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "specification" | "spec" => Ok(SchemaFormat::Specification),
            "registry" => Ok(SchemaFormat::Registry),
            other => Err(FormatParseError(other.to_string())),
        }
    }
}

/// Definitions read from one or more schema sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSchema {
    pub definitions: Vec<ResourceTypeDefinition>,
    /// Entries that could not be read
    pub failures: Vec<EntryFailure>,
}

impl ParsedSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append another source. Name collisions are reported by `check_unique_names`.
    pub fn merge(&mut self, other: ParsedSchema) {
        self.definitions.extend(other.definitions);
        self.failures.extend(other.failures);
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.failures.is_empty()
    }

    /// Fails on the first type name that appears twice, counting entries
    /// that failed to parse as well as parsed definitions
    pub fn check_unique_names(&self) -> SchemaResult<()> {
        let names = self
            .definitions
            .iter()
            .map(|d| d.name().as_str())
            .chain(self.failures.iter().map(|f| f.type_name.as_str()));
        match first_repeated(names) {
            Some(name) => Err(SchemaError::duplicate(name)),
            None => Ok(()),
        }
    }
}

pub(crate) fn first_repeated<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}

/// A JSON object read as ordered key/value pairs. Unlike a map, a repeated
/// key is kept so readers can report it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entries<V>(pub(crate) Vec<(String, V)>);

impl<V> Default for Entries<V> {
    fn default() -> Self {
        Entries(Vec::new())
    }
}

impl<V> Entries<V> {
    pub(crate) fn first_repeated_key(&self) -> Option<&str> {
        first_repeated(self.0.iter().map(|(key, _)| key.as_str()))
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub(crate) fn into_vec(self) -> Vec<(String, V)> {
        self.0
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Parse one schema document.
///
/// Fails only when the document as a whole is unusable (not JSON, or without
/// any type section); entry-level problems end up in `ParsedSchema::failures`.
pub fn parse_schema(input: &str, format: SchemaFormat) -> SchemaResult<ParsedSchema> {
    match format {
        SchemaFormat::Specification => specification::parse(input),
        SchemaFormat::Registry => registry::parse(input),
    }
}

/// Build a definition with fields sorted by name, turning any error into an
/// entry failure. The sort is stable so repeated field names stay adjacent.
pub(crate) fn entry(
    type_name: &str,
    kind: TypeKind,
    documentation: Option<String>,
    fields: Result<Vec<FieldDefinition>, String>,
) -> Result<ResourceTypeDefinition, EntryFailure> {
    let build = || -> SchemaResult<ResourceTypeDefinition> {
        let name = ResourceTypeName::parse(type_name)?;
        let mut fields = fields.map_err(|message| SchemaError::parse(type_name, message))?;
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        let definition = ResourceTypeDefinition::new(name, kind, fields)?;
        Ok(match documentation {
            Some(doc) => definition.with_documentation(doc),
            None => definition,
        })
    };
    build().map_err(|error| EntryFailure::new(type_name, error))
}
