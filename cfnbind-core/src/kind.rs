//! Value kinds - resolving declared field kinds into structural types
//!
//! Kind strings follow `Kind := Primitive | List<Kind> | Map<Kind> | Name`.
//! Names are looked up among the known property types, first relative to the
//! owning resource and then as a global type such as `Tag`.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::{SchemaError, SchemaResult};
use crate::name::ResourceTypeName;
use crate::schema::{FieldDefinition, ResourceTypeDefinition, TypeKind};

/// Scalar value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Boolean,
    Integer,
    Float,
    String,
}

impl Primitive {
    /// Map a CloudFormation primitive spelling
    pub fn from_spelling(s: &str) -> Option<Self> {
        match s {
            "String" | "Timestamp" => Some(Primitive::String),
            "Integer" | "Long" => Some(Primitive::Integer),
            "Double" => Some(Primitive::Float),
            "Boolean" => Some(Primitive::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Integer => "Integer",
            Primitive::Float => "Float",
            Primitive::String => "String",
        }
    }
}

/// Structural representation of a field's value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum ValueKind {
    Primitive(Primitive),
    /// Arbitrary JSON document
    Json,
    ListOf(Box<ValueKind>),
    /// Keys are always strings
    MapOf(Box<ValueKind>),
    NestedReference(ResourceTypeName),
    /// A literal of the inner kind or an intrinsic function
    WrappedValue(Box<ValueKind>),
}

impl ValueKind {
    pub fn is_wrapped(&self) -> bool {
        matches!(self, ValueKind::WrappedValue(_))
    }

    /// Every nested type this kind refers to
    pub fn references(&self) -> Vec<&ResourceTypeName> {
        match self {
            ValueKind::NestedReference(name) => vec![name],
            ValueKind::ListOf(inner) | ValueKind::MapOf(inner) | ValueKind::WrappedValue(inner) => {
                inner.references()
            }
            ValueKind::Primitive(_) | ValueKind::Json => Vec::new(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Primitive(p) => f.write_str(p.as_str()),
            ValueKind::Json => f.write_str("Json"),
            ValueKind::ListOf(inner) => write!(f, "List<{}>", inner),
            ValueKind::MapOf(inner) => write!(f, "Map<String, {}>", inner),
            ValueKind::NestedReference(name) => write!(f, "{}", name),
            ValueKind::WrappedValue(inner) => write!(f, "Value<{}>", inner),
        }
    }
}

/// Kind string before names are resolved
#[derive(Debug, PartialEq)]
enum KindExpr<'a> {
    Name(&'a str),
    List(Box<KindExpr<'a>>),
    Map(Box<KindExpr<'a>>),
}

fn parse_kind(s: &str) -> Option<KindExpr<'_>> {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix("List<").and_then(|r| r.strip_suffix('>')) {
        return parse_kind(inner).map(|k| KindExpr::List(Box::new(k)));
    }
    if let Some(inner) = s.strip_prefix("Map<").and_then(|r| r.strip_suffix('>')) {
        return parse_kind(inner).map(|k| KindExpr::Map(Box::new(k)));
    }
    let is_name = !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_name.then_some(KindExpr::Name(s))
}

/// A definition whose field kinds all resolved, in field order
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    definition: ResourceTypeDefinition,
    kinds: Vec<ValueKind>,
}

impl ResolvedType {
    pub fn definition(&self) -> &ResourceTypeDefinition {
        &self.definition
    }

    /// Fields paired with their resolved kinds
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDefinition, &ValueKind)> {
        self.definition.fields().iter().zip(self.kinds.iter())
    }

    pub fn into_definition(self) -> ResourceTypeDefinition {
        self.definition
    }
}

/// Resolves kind strings against a fixed set of known property types
#[derive(Debug, Clone, Default)]
pub struct KindResolver {
    property_types: BTreeSet<String>,
}

impl KindResolver {
    pub fn new(property_types: BTreeSet<String>) -> Self {
        Self { property_types }
    }

    /// Index every property type among `definitions`
    pub fn from_definitions<'a>(
        definitions: impl IntoIterator<Item = &'a ResourceTypeDefinition>,
    ) -> Self {
        let property_types = definitions
            .into_iter()
            .filter(|d| d.kind() == TypeKind::Property)
            .map(|d| d.name().as_str().to_string())
            .collect();
        Self::new(property_types)
    }

    pub fn knows(&self, type_name: &str) -> bool {
        self.property_types.contains(type_name)
    }

    /// Resolve one field of `owner`
    pub fn resolve(
        &self,
        owner: &ResourceTypeName,
        field: &FieldDefinition,
    ) -> SchemaResult<ValueKind> {
        let unknown = || SchemaError::unknown_kind(owner.as_str(), &field.name, &field.kind);
        let expr = parse_kind(&field.kind).ok_or_else(unknown)?;
        self.resolve_expr(owner, &expr).ok_or_else(unknown)
    }

    /// Resolve every field of a definition; the first failure wins
    pub fn resolve_definition(
        &self,
        definition: ResourceTypeDefinition,
    ) -> SchemaResult<ResolvedType> {
        let kinds = definition
            .fields()
            .iter()
            .map(|field| self.resolve(definition.name(), field))
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(ResolvedType { definition, kinds })
    }

    fn resolve_expr(&self, owner: &ResourceTypeName, expr: &KindExpr<'_>) -> Option<ValueKind> {
        match expr {
            KindExpr::List(inner) => Some(ValueKind::ListOf(Box::new(
                self.resolve_expr(owner, inner)?,
            ))),
            KindExpr::Map(inner) => Some(ValueKind::MapOf(Box::new(
                self.resolve_expr(owner, inner)?,
            ))),
            KindExpr::Name("Json") => Some(ValueKind::Json),
            KindExpr::Name(name) => {
                if let Some(primitive) = Primitive::from_spelling(name) {
                    return Some(ValueKind::WrappedValue(Box::new(ValueKind::Primitive(
                        primitive,
                    ))));
                }
                self.resolve_name(owner, name)
                    .map(ValueKind::NestedReference)
            }
        }
    }

    fn resolve_name(&self, owner: &ResourceTypeName, name: &str) -> Option<ResourceTypeName> {
        let local = owner.qualify(name).filter(|q| self.knows(q));
        let candidate = local.or_else(|| self.knows(name).then(|| name.to_string()))?;
        ResourceTypeName::parse(&candidate).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> KindResolver {
        KindResolver::new(
            ["AWS::ECS::Service.Listener", "AWS::ECS::Service.LoadBalancer", "Tag"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    fn owner() -> ResourceTypeName {
        ResourceTypeName::parse("AWS::ECS::Service.LoadBalancer").unwrap()
    }

    fn resolve(kind: &str) -> SchemaResult<ValueKind> {
        resolver().resolve(&owner(), &FieldDefinition::new("Field", kind))
    }

    fn wrapped(p: Primitive) -> ValueKind {
        ValueKind::WrappedValue(Box::new(ValueKind::Primitive(p)))
    }

    #[test]
    fn primitives_are_wrapped() {
        assert_eq!(resolve("String").unwrap(), wrapped(Primitive::String));
        assert_eq!(resolve("Timestamp").unwrap(), wrapped(Primitive::String));
        assert_eq!(resolve("Long").unwrap(), wrapped(Primitive::Integer));
        assert_eq!(resolve("Double").unwrap(), wrapped(Primitive::Float));
        assert_eq!(resolve("Boolean").unwrap(), wrapped(Primitive::Boolean));
        assert_eq!(resolve("Json").unwrap(), ValueKind::Json);
    }

    #[test]
    fn containers() {
        assert_eq!(
            resolve("List<String>").unwrap(),
            ValueKind::ListOf(Box::new(wrapped(Primitive::String)))
        );
        assert_eq!(
            resolve("Map<Integer>").unwrap().to_string(),
            "Map<String, Value<Integer>>"
        );
        assert_eq!(
            resolve("List<Map<Json>>").unwrap().to_string(),
            "List<Map<String, Json>>"
        );
    }

    #[test]
    fn nested_references_resolve_locally_first() {
        let kind = resolve("List<Listener>").unwrap();
        assert_eq!(kind.to_string(), "List<AWS::ECS::Service.Listener>");
        assert_eq!(kind.references()[0].as_str(), "AWS::ECS::Service.Listener");

        let tag = resolve("Tag").unwrap();
        assert_eq!(tag, ValueKind::NestedReference(ResourceTypeName::parse("Tag").unwrap()));
    }

    #[test]
    fn unknown_kind_names_field_and_owner() {
        let err = resolve("Frobnicator").unwrap_err();
        assert_eq!(
            err,
            SchemaError::unknown_kind("AWS::ECS::Service.LoadBalancer", "Field", "Frobnicator")
        );
    }

    #[test]
    fn malformed_kind_strings_are_unknown() {
        for bad in ["", "List<", "List<String", "Map<>", "List<Str ing>", "Set<String>"] {
            assert!(
                matches!(resolve(bad), Err(SchemaError::UnknownValueKind { .. })),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let a = resolve("List<Listener>").unwrap();
        let b = resolve("List<Listener>").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn resolve_definition_keeps_order_and_fails_whole_entry() {
        let def = ResourceTypeDefinition::new(
            owner(),
            TypeKind::Property,
            vec![
                FieldDefinition::new("ContainerPort", "Integer"),
                FieldDefinition::new("Listeners", "List<Listener>"),
            ],
        )
        .unwrap();
        let resolved = resolver().resolve_definition(def.clone()).unwrap();
        let names: Vec<&str> = resolved.fields().map(|(f, _)| f.name.as_str()).collect();
        assert_eq!(names, vec!["ContainerPort", "Listeners"]);

        let broken = ResourceTypeDefinition::new(
            owner(),
            TypeKind::Property,
            vec![
                FieldDefinition::new("ContainerPort", "Integer"),
                FieldDefinition::new("Widget", "Frobnicator"),
            ],
        )
        .unwrap();
        let err = resolver().resolve_definition(broken).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownValueKind { ref field, .. } if field == "Widget"));
    }

    #[test]
    fn kind_serializes_with_tag() {
        let json = serde_json::to_value(resolve("List<String>").unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "list_of",
                "of": {"kind": "wrapped_value", "of": {"kind": "primitive", "of": "string"}}
            })
        );
        assert_eq!(
            serde_json::to_value(ValueKind::Json).unwrap(),
            serde_json::json!({"kind": "json"})
        );
    }
}
