//! Reader for the CloudFormation resource specification format
//!
//! ```json
//! {
//!   "PropertyTypes": {
//!     "AWS::MediaLive::Channel.MediaPackageOutputDestinationSettings": {
//!       "Documentation": "http://docs.aws.amazon.com/...",
//!       "Properties": {
//!         "ChannelId": { "PrimitiveType": "String", "Required": false, "UpdateType": "Mutable" }
//!       }
//!     }
//!   },
//!   "ResourceTypes": { ... }
//! }
//! ```

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use super::{Entries, FieldDefinition, ParsedSchema, TypeKind, entry, first_repeated};
use crate::error::{DOCUMENT, SchemaError, SchemaResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SpecDocument {
    resource_specification_version: Option<String>,
    // Per-resource files use the singular keys
    #[serde(alias = "PropertyType")]
    property_types: Option<Entries<RawEntry>>,
    #[serde(alias = "ResourceType")]
    resource_types: Option<Entries<RawEntry>>,
}

/// A section value; anything that is not a type entry fails on its own
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Entry(SpecEntry),
    Malformed(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SpecEntry {
    documentation: Option<String>,
    properties: Option<Entries<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SpecProperty {
    documentation: Option<String>,
    #[serde(default)]
    required: bool,
    primitive_type: Option<String>,
    #[serde(rename = "Type")]
    type_name: Option<String>,
    primitive_item_type: Option<String>,
    item_type: Option<String>,
    update_type: Option<String>,
}

impl SpecProperty {
    /// Canonical kind string for the property
    fn kind(&self, name: &str) -> Result<String, String> {
        if let Some(primitive) = &self.primitive_type {
            return Ok(primitive.clone());
        }
        match self.type_name.as_deref() {
            Some(container @ ("List" | "Map")) => {
                let item = self
                    .primitive_item_type
                    .as_ref()
                    .or(self.item_type.as_ref())
                    .ok_or_else(|| {
                        format!(
                            "property '{}' is a {} without PrimitiveItemType or ItemType",
                            name, container
                        )
                    })?;
                Ok(format!("{}<{}>", container, item))
            }
            Some(nested) => Ok(nested.to_string()),
            None => Err(format!(
                "property '{}' declares neither PrimitiveType nor Type",
                name
            )),
        }
    }

    fn into_field(self, name: &str) -> Result<FieldDefinition, String> {
        let mut field = FieldDefinition::new(name, self.kind(name)?).with_required(self.required);
        if let Some(doc) = self.documentation {
            field = field.with_documentation(doc);
        }
        if let Some(update_type) = self.update_type {
            field = field.with_update_type(update_type);
        }
        Ok(field)
    }
}

/// Repeated property names are kept; building the definition rejects them
fn parse_fields(raw: RawEntry) -> (Option<String>, Result<Vec<FieldDefinition>, String>) {
    let spec_entry = match raw {
        RawEntry::Entry(e) => e,
        RawEntry::Malformed(value) => {
            return (None, Err(format!("malformed type entry: {}", value)));
        }
    };
    let Some(properties) = spec_entry.properties else {
        return (spec_entry.documentation, Err("missing Properties".to_string()));
    };
    let fields = properties
        .into_vec()
        .into_iter()
        .map(|(name, raw)| {
            let prop: SpecProperty = serde_json::from_value(raw)
                .map_err(|e| format!("malformed property '{}': {}", name, e))?;
            prop.into_field(&name)
        })
        .collect();
    (spec_entry.documentation, fields)
}

pub(super) fn parse(input: &str) -> SchemaResult<ParsedSchema> {
    let document: SpecDocument = serde_json::from_str(input)
        .map_err(|e| SchemaError::parse(DOCUMENT, format!("invalid resource specification: {}", e)))?;

    if document.property_types.is_none() && document.resource_types.is_none() {
        return Err(SchemaError::parse(
            DOCUMENT,
            "resource specification has neither PropertyTypes nor ResourceTypes",
        ));
    }
    if let Some(version) = &document.resource_specification_version {
        debug!("Reading resource specification version {}", version);
    }

    let sections = [
        (TypeKind::Property, document.property_types.unwrap_or_default()),
        (TypeKind::Resource, document.resource_types.unwrap_or_default()),
    ];
    let names = sections.iter().flat_map(|(_, section)| section.keys());
    if let Some(name) = first_repeated(names) {
        return Err(SchemaError::duplicate(name));
    }

    let mut parsed = ParsedSchema::new();
    for (kind, section) in sections {
        for (type_name, raw) in section.into_vec() {
            let (documentation, fields) = parse_fields(raw);
            match entry(&type_name, kind, documentation, fields) {
                Ok(definition) => parsed.definitions.push(definition),
                Err(failure) => parsed.failures.push(failure),
            }
        }
    }
    Ok(parsed)
}
