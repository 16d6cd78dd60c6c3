//! Reader for CloudFormation registry schemas
//!
//! Usage:
//!   aws cloudformation describe-type --type RESOURCE --type-name AWS::EC2::VPC \
//!     --query 'Schema' --output text > vpc.json
//!
//! The root object becomes one resource type; every object definition under
//! `definitions` becomes a property type named `TypeName.DefinitionName`.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use super::{Entries, FieldDefinition, ParsedSchema, TypeKind, entry};
use crate::error::{DOCUMENT, SchemaError, SchemaResult};

/// Definitions referencing non-object definitions are inlined up to this depth
const MAX_REF_DEPTH: usize = 16;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrySchema {
    type_name: Option<String>,
    documentation_url: Option<String>,
    properties: Option<Entries<Value>>,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    read_only_properties: Vec<String>,
    #[serde(default)]
    definitions: Entries<RegistryProperty>,
}

/// Type can be a string or an array of strings in JSON Schema
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TypeValue {
    Single(String),
    Multiple(Vec<String>),
}

impl TypeValue {
    fn as_str(&self) -> Option<&str> {
        match self {
            TypeValue::Single(s) => Some(s),
            TypeValue::Multiple(v) => v.first().map(|s| s.as_str()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryProperty {
    #[serde(rename = "type")]
    prop_type: Option<TypeValue>,
    description: Option<String>,
    items: Option<Box<RegistryProperty>>,
    #[serde(rename = "$ref")]
    ref_path: Option<String>,
    properties: Option<Entries<Value>>,
    pattern_properties: Option<BTreeMap<String, RegistryProperty>>,
    #[serde(default)]
    required: Vec<String>,
}

impl RegistryProperty {
    fn is_object_definition(&self) -> bool {
        self.properties.is_some()
    }
}

struct KindMapper<'a> {
    definitions: &'a BTreeMap<String, RegistryProperty>,
}

impl KindMapper<'_> {
    fn kind(&self, prop: &RegistryProperty, depth: usize) -> Result<String, String> {
        if depth > MAX_REF_DEPTH {
            return Err("definition references nest too deeply".to_string());
        }

        if let Some(ref_path) = &prop.ref_path {
            let target = ref_path
                .strip_prefix("#/definitions/")
                .ok_or_else(|| format!("unsupported $ref '{}'", ref_path))?;
            let definition = self
                .definitions
                .get(target)
                .ok_or_else(|| format!("$ref to missing definition '{}'", target))?;
            if definition.is_object_definition() {
                return Ok(target.to_string());
            }
            return self.kind(definition, depth + 1);
        }

        match prop.prop_type.as_ref().and_then(|t| t.as_str()) {
            Some("string") => Ok("String".to_string()),
            Some("integer") => Ok("Integer".to_string()),
            Some("number") => Ok("Double".to_string()),
            Some("boolean") => Ok("Boolean".to_string()),
            Some("array") => match &prop.items {
                Some(items) => Ok(format!("List<{}>", self.kind(items, depth + 1)?)),
                None => Ok("List<Json>".to_string()),
            },
            Some("object") => match &prop.pattern_properties {
                Some(patterns) if patterns.len() == 1 => {
                    let value = patterns.values().next().map(|p| self.kind(p, depth + 1));
                    match value {
                        Some(kind) => Ok(format!("Map<{}>", kind?)),
                        None => Ok("Json".to_string()),
                    }
                }
                _ => Ok("Json".to_string()),
            },
            // Left for the resolver to reject with field context
            Some(other) => Ok(other.to_string()),
            // oneOf/anyOf and untyped schemas accept any JSON
            None => Ok("Json".to_string()),
        }
    }

    fn fields(
        &self,
        properties: &Entries<Value>,
        required: &HashSet<&str>,
        read_only: &HashSet<&str>,
    ) -> Result<Vec<FieldDefinition>, String> {
        properties
            .0
            .iter()
            .map(|(name, raw)| {
                let prop: RegistryProperty = serde_json::from_value(raw.clone())
                    .map_err(|e| format!("malformed property '{}': {}", name, e))?;
                let kind = self.kind(&prop, 0)?;
                // Read-only values come from AWS, never from the template author
                let is_required =
                    required.contains(name.as_str()) && !read_only.contains(name.as_str());
                let mut field = FieldDefinition::new(name, kind).with_required(is_required);
                if let Some(desc) = prop.description {
                    field = field.with_documentation(desc);
                }
                Ok(field)
            })
            .collect()
    }
}

pub(super) fn parse(input: &str) -> SchemaResult<ParsedSchema> {
    let schema: RegistrySchema = serde_json::from_str(input)
        .map_err(|e| SchemaError::parse(DOCUMENT, format!("invalid registry schema: {}", e)))?;

    let type_name = schema
        .type_name
        .ok_or_else(|| SchemaError::parse(DOCUMENT, "registry schema has no typeName"))?;

    if let Some(def_name) = schema.definitions.first_repeated_key() {
        return Err(SchemaError::duplicate(format!("{}.{}", type_name, def_name)));
    }
    let definitions: BTreeMap<String, RegistryProperty> =
        schema.definitions.into_vec().into_iter().collect();

    let mapper = KindMapper {
        definitions: &definitions,
    };
    let read_only: HashSet<&str> = schema
        .read_only_properties
        .iter()
        .map(|p| p.trim_start_matches("/properties/"))
        .collect();
    let no_read_only = HashSet::new();

    let mut parsed = ParsedSchema::new();

    for (def_name, definition) in &definitions {
        let Some(properties) = &definition.properties else {
            continue;
        };
        let required: HashSet<&str> = definition.required.iter().map(String::as_str).collect();
        let result = entry(
            &format!("{}.{}", type_name, def_name),
            TypeKind::Property,
            definition.description.clone(),
            mapper.fields(properties, &required, &no_read_only),
        );
        match result {
            Ok(def) => parsed.definitions.push(def),
            Err(failure) => parsed.failures.push(failure),
        }
    }

    let root_fields = match &schema.properties {
        Some(properties) => {
            let required: HashSet<&str> = schema.required.iter().map(String::as_str).collect();
            mapper.fields(properties, &required, &read_only)
        }
        None => Err("registry schema has no properties".to_string()),
    };
    match entry(
        &type_name,
        TypeKind::Resource,
        schema.documentation_url.clone(),
        root_fields,
    ) {
        Ok(def) => parsed.definitions.push(def),
        Err(failure) => parsed.failures.push(failure),
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VPC: &str = r##"{
        "typeName": "AWS::EC2::VPC",
        "description": "Specifies a virtual private cloud (VPC).",
        "documentationUrl": "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/aws-resource-ec2-vpc.html",
        "definitions": {
            "Tag": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "Key": {"type": "string"},
                    "Value": {"type": "string"}
                },
                "required": ["Value", "Key"]
            },
            "Tenancy": {"type": "string", "enum": ["default", "dedicated", "host"]}
        },
        "properties": {
            "VpcId": {"type": "string", "description": "The ID of the VPC."},
            "CidrBlock": {"type": "string"},
            "EnableDnsSupport": {"type": ["boolean", "string"]},
            "InstanceTenancy": {"$ref": "#/definitions/Tenancy"},
            "Ipv4NetmaskLength": {"type": "integer"},
            "CidrBlockAssociations": {"type": "array", "items": {"type": "string"}},
            "Tags": {"type": "array", "insertionOrder": false, "items": {"$ref": "#/definitions/Tag"}}
        },
        "required": ["VpcId", "CidrBlock"],
        "readOnlyProperties": ["/properties/VpcId", "/properties/CidrBlockAssociations"]
    }"##;

    #[test]
    fn parse_vpc_schema() {
        let parsed = parse(VPC).unwrap();
        assert!(parsed.failures.is_empty(), "{:?}", parsed.failures);
        assert_eq!(parsed.definitions.len(), 2);

        let tag = &parsed.definitions[0];
        assert_eq!(tag.name().as_str(), "AWS::EC2::VPC.Tag");
        assert_eq!(tag.kind(), TypeKind::Property);
        assert!(tag.field("Key").unwrap().required);

        let vpc = &parsed.definitions[1];
        assert_eq!(vpc.kind(), TypeKind::Resource);
        assert_eq!(vpc.field("Tags").unwrap().kind, "List<Tag>");
        assert_eq!(vpc.field("InstanceTenancy").unwrap().kind, "String");
        assert_eq!(vpc.field("EnableDnsSupport").unwrap().kind, "Boolean");
        assert_eq!(vpc.field("Ipv4NetmaskLength").unwrap().kind, "Integer");
        assert_eq!(vpc.field("CidrBlockAssociations").unwrap().kind, "List<String>");
        assert_eq!(
            vpc.field("VpcId").unwrap().documentation.as_deref(),
            Some("The ID of the VPC.")
        );
    }

    #[test]
    fn read_only_required_property_is_optional() {
        let parsed = parse(VPC).unwrap();
        let vpc = &parsed.definitions[1];
        assert!(!vpc.field("VpcId").unwrap().required);
        assert!(vpc.field("CidrBlock").unwrap().required);
    }

    #[test]
    fn missing_type_name_is_document_error() {
        let err = parse(r#"{"properties": {}}"#).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn dangling_ref_fails_entry() {
        let input = r##"{
            "typeName": "AWS::X::Y",
            "properties": {"Thing": {"$ref": "#/definitions/Missing"}}
        }"##;
        let parsed = parse(input).unwrap();
        assert!(parsed.definitions.is_empty());
        assert_eq!(parsed.failures[0].type_name, "AWS::X::Y");
    }

    #[test]
    fn pattern_properties_become_maps() {
        let input = r#"{
            "typeName": "AWS::X::Y",
            "properties": {
                "Labels": {"type": "object", "patternProperties": {"^[a-z]+$": {"type": "string"}}},
                "Settings": {"type": "object"}
            }
        }"#;
        let parsed = parse(input).unwrap();
        let def = &parsed.definitions[0];
        assert_eq!(def.field("Labels").unwrap().kind, "Map<String>");
        assert_eq!(def.field("Settings").unwrap().kind, "Json");
    }

    #[test]
    fn repeated_definition_is_duplicate() {
        let input = r#"{
            "typeName": "AWS::X::Y",
            "definitions": {
                "Rule": {"type": "object", "properties": {"A": {"type": "string"}}},
                "Rule": {"type": "object", "properties": {"B": {"type": "string"}}}
            },
            "properties": {}
        }"#;
        assert_eq!(parse(input).unwrap_err(), SchemaError::duplicate("AWS::X::Y.Rule"));
    }

    #[test]
    fn repeated_property_fails_entry() {
        let input = r#"{
            "typeName": "AWS::X::Y",
            "definitions": {
                "Rule": {"type": "object", "properties": {"A": {"type": "string"}, "A": {"type": "integer"}}}
            },
            "properties": {"Name": {"type": "string"}, "Name": {"type": "integer"}}
        }"#;
        let parsed = parse(input).unwrap();
        assert!(parsed.definitions.is_empty());
        let failed: Vec<&str> = parsed.failures.iter().map(|f| f.type_name.as_str()).collect();
        assert_eq!(failed, vec!["AWS::X::Y.Rule", "AWS::X::Y"]);
        assert!(parsed.failures[1].error.to_string().contains("'Name' is declared more than once"));
    }

    #[test]
    fn unknown_json_type_is_passed_through() {
        let input = r#"{"typeName": "AWS::X::Y", "properties": {"Odd": {"type": "frobnicator"}}}"#;
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.definitions[0].field("Odd").unwrap().kind, "frobnicator");
    }
}
