//! Catalog - emitted records keyed by fully-qualified type name
//!
//! Built once per generation run and read-only afterwards. Two entries with
//! the same type name, or whose artifacts land on the same path, abort the
//! build; no partial catalog is handed out.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::emit::RecordArtifact;
use crate::error::{SchemaError, SchemaResult};
use crate::name::ResourceTypeName;
use crate::schema::{ResourceTypeDefinition, TypeKind};

/// A definition together with its emitted record
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub definition: ResourceTypeDefinition,
    pub record: RecordArtifact,
}

impl CatalogEntry {
    pub fn new(definition: ResourceTypeDefinition, record: RecordArtifact) -> Self {
        Self { definition, record }
    }

    pub fn name(&self) -> &ResourceTypeName {
        self.definition.name()
    }

    pub fn is_top_level(&self) -> bool {
        self.definition.kind().is_top_level()
    }
}

/// Collects entries, rejecting duplicate type names and artifact paths
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: BTreeMap<ResourceTypeName, CatalogEntry>,
    /// Relative artifact path -> type name written there
    paths: HashMap<String, ResourceTypeName>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: CatalogEntry) -> SchemaResult<()> {
        let slot = match self.entries.entry(entry.name().clone()) {
            Entry::Occupied(existing) => {
                return Err(SchemaError::duplicate(existing.key().as_str()));
            }
            Entry::Vacant(slot) => slot,
        };
        let path = entry.record.relative_path();
        if let Some(other) = self.paths.get(&path) {
            return Err(SchemaError::ArtifactCollision {
                type_name: entry.name().to_string(),
                other: other.to_string(),
                path,
            });
        }
        self.paths.insert(path, entry.name().clone());
        slot.insert(entry);
        Ok(())
    }

    pub fn build(self) -> Catalog {
        Catalog {
            entries: self.entries,
        }
    }

    /// Assemble a catalog from all entries at once
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> SchemaResult<Catalog> {
        let mut builder = Self::new();
        for entry in entries {
            builder.insert(entry)?;
        }
        Ok(builder.build())
    }
}

/// Read-only lookup of generated records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<ResourceTypeName, CatalogEntry>,
}

impl Catalog {
    pub fn get(&self, type_name: &str) -> Option<&CatalogEntry> {
        let name = ResourceTypeName::parse(type_name).ok()?;
        self.entries.get(&name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.get(type_name).is_some()
    }

    /// `Some(true)` for resource types, `Some(false)` for property types
    pub fn is_top_level(&self, type_name: &str) -> Option<bool> {
        self.get(type_name).map(CatalogEntry::is_top_level)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, ordered by type name
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn records(&self) -> impl Iterator<Item = &RecordArtifact> {
        self.entries.values().map(|e| &e.record)
    }

    pub fn resources(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.iter().filter(|e| e.is_top_level())
    }

    pub fn property_types(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.iter().filter(|e| !e.is_top_level())
    }

    /// Property types nested under one resource type
    pub fn property_types_of<'a>(
        &'a self,
        resource: &'a str,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.property_types().filter(move |e| {
            e.name()
                .parent_resource()
                .is_some_and(|parent| parent.as_str() == resource)
        })
    }

    /// Summary document listing every record
    pub fn index(&self) -> CatalogIndex {
        CatalogIndex {
            entries: self
                .records()
                .map(|r| IndexEntry {
                    type_name: r.type_name.clone(),
                    kind: r.kind,
                    record_name: r.record_name.clone(),
                    file_stem: r.file_stem.clone(),
                    path: r.relative_path(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub type_name: ResourceTypeName,
    pub kind: TypeKind,
    pub record_name: String,
    pub file_stem: String,
    /// Relative to the output directory
    pub path: String,
}

/// Serialized form of the catalog, written as `catalog.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogIndex {
    pub entries: Vec<IndexEntry>,
}

impl CatalogIndex {
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::emit_record;
    use crate::kind::KindResolver;
    use crate::schema::FieldDefinition;

    fn entry(type_name: &str, kind: TypeKind) -> CatalogEntry {
        let def = ResourceTypeDefinition::new(
            ResourceTypeName::parse(type_name).unwrap(),
            kind,
            vec![FieldDefinition::new("Name", "String")],
        )
        .unwrap();
        let resolved = KindResolver::default().resolve_definition(def).unwrap();
        let record = emit_record(&resolved);
        CatalogEntry::new(resolved.into_definition(), record)
    }

    #[test]
    fn duplicate_type_name_aborts_build() {
        let err = CatalogBuilder::from_entries(vec![
            entry("AWS::S3::Bucket", TypeKind::Resource),
            entry("AWS::S3::Bucket.Rule", TypeKind::Property),
            entry("AWS::S3::Bucket", TypeKind::Resource),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::duplicate("AWS::S3::Bucket"));
    }

    #[test]
    fn colliding_artifact_paths_abort_build() {
        let mut builder = CatalogBuilder::new();
        builder.insert(entry("AWS::A::B_C", TypeKind::Resource)).unwrap();
        let err = builder.insert(entry("AWS::A::B.C", TypeKind::Property)).unwrap_err();
        assert_eq!(
            err,
            SchemaError::ArtifactCollision {
                type_name: "AWS::A::B.C".to_string(),
                other: "AWS::A::B_C".to_string(),
                path: "a/aws-a-b_c.json".to_string(),
            }
        );

        // Stems are lowercased, so names differing only in case collide too
        let err = CatalogBuilder::from_entries(vec![
            entry("AWS::SNS::Topic", TypeKind::Resource),
            entry("AWS::Sns::Topic", TypeKind::Resource),
        ])
        .unwrap_err();
        assert!(matches!(err, SchemaError::ArtifactCollision { .. }));
    }

    #[test]
    fn only_resources_are_top_level() {
        let catalog = CatalogBuilder::from_entries(vec![
            entry("AWS::ECS::Service", TypeKind::Resource),
            entry("AWS::ECS::Service.Listener", TypeKind::Property),
        ])
        .unwrap();

        assert_eq!(catalog.is_top_level("AWS::ECS::Service"), Some(true));
        assert_eq!(catalog.is_top_level("AWS::ECS::Service.Listener"), Some(false));
        assert_eq!(catalog.is_top_level("AWS::ECS::Cluster"), None);

        // Both carry a lifecycle block regardless of kind
        for e in catalog.iter() {
            assert_eq!(e.record.lifecycle.len(), 5);
        }
    }

    #[test]
    fn navigation() {
        let catalog = CatalogBuilder::from_entries(vec![
            entry("AWS::ECS::Service.Listener", TypeKind::Property),
            entry("AWS::ECS::Service", TypeKind::Resource),
            entry("AWS::ECS::Cluster", TypeKind::Resource),
            entry("AWS::ECS::Cluster.Setting", TypeKind::Property),
            entry("Tag", TypeKind::Property),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.resources().count(), 2);
        assert_eq!(catalog.property_types().count(), 3);

        let nested: Vec<&str> = catalog
            .property_types_of("AWS::ECS::Service")
            .map(|e| e.name().as_str())
            .collect();
        assert_eq!(nested, vec!["AWS::ECS::Service.Listener"]);

        let ordered: Vec<&str> = catalog.iter().map(|e| e.name().as_str()).collect();
        assert_eq!(
            ordered,
            vec![
                "AWS::ECS::Cluster",
                "AWS::ECS::Cluster.Setting",
                "AWS::ECS::Service",
                "AWS::ECS::Service.Listener",
                "Tag"
            ]
        );
        assert!(catalog.get("not a name").is_none());
    }

    #[test]
    fn index_lists_paths() {
        let catalog =
            CatalogBuilder::from_entries(vec![entry("AWS::SNS::Topic", TypeKind::Resource)]).unwrap();
        let index = catalog.index();
        assert_eq!(index.entries[0].file_stem, "aws-sns-topic");
        assert_eq!(index.entries[0].path, "sns/aws-sns-topic.json");
        let json = index.to_json().unwrap();
        assert!(json.contains("\"kind\": \"resource\""));
    }
}
