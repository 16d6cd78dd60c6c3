//! Generation pipeline - schema definitions in, catalog of records out
//!
//! Each definition is resolved and emitted on its own. Failures are collected
//! per entry; a duplicate type name aborts the whole run, whether or not the
//! entries carrying it would have succeeded.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::catalog::{Catalog, CatalogBuilder, CatalogEntry};
use crate::config::GeneratorConfig;
use crate::emit::emit_record;
use crate::error::{EntryFailure, SchemaError, SchemaResult};
use crate::kind::KindResolver;
use crate::schema::{ParsedSchema, ResourceTypeDefinition, parse_schema};

/// Outcome of one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// `None` when entries failed and partial output is off
    pub catalog: Option<Catalog>,
    pub failures: Vec<EntryFailure>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.catalog.is_some()
    }
}

type Outcome = Result<CatalogEntry, EntryFailure>;

fn process(resolver: &KindResolver, definition: ResourceTypeDefinition) -> Outcome {
    let type_name = definition.name().as_str().to_string();
    let resolved = resolver
        .resolve_definition(definition)
        .map_err(|e| EntryFailure::new(type_name, e))?;
    let record = emit_record(&resolved);
    Ok(CatalogEntry::new(resolved.into_definition(), record))
}

pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Parse and merge several schema documents in the configured format
    pub fn read<'a>(&self, sources: impl IntoIterator<Item = &'a str>) -> SchemaResult<ParsedSchema> {
        let mut parsed = ParsedSchema::new();
        for source in sources {
            parsed.merge(parse_schema(source, self.config.format)?);
        }
        Ok(parsed)
    }

    /// Resolve and emit every definition on the calling thread
    pub fn generate(&self, schema: ParsedSchema) -> SchemaResult<GenerationReport> {
        schema.check_unique_names()?;
        let ParsedSchema {
            definitions,
            failures,
        } = schema;
        let resolver = KindResolver::from_definitions(&definitions);
        let outcomes: Vec<Outcome> = definitions
            .into_iter()
            .map(|definition| process(&resolver, definition))
            .collect();
        self.finish(failures, outcomes)
    }

    /// Same output as [`Generator::generate`], with up to `jobs` definitions
    /// processed at once on the blocking pool
    pub async fn generate_concurrent(&self, schema: ParsedSchema) -> SchemaResult<GenerationReport> {
        schema.check_unique_names()?;
        let ParsedSchema {
            definitions,
            failures,
        } = schema;
        let resolver = Arc::new(KindResolver::from_definitions(&definitions));
        let permits = Arc::new(Semaphore::new(self.config.workers()));
        let mut tasks = JoinSet::new();

        for (index, definition) in definitions.into_iter().enumerate() {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| SchemaError::Worker(e.to_string()))?;
            let resolver = Arc::clone(&resolver);
            tasks.spawn_blocking(move || {
                let outcome = process(&resolver, definition);
                drop(permit);
                (index, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|e| SchemaError::Worker(e.to_string()))?);
        }
        // Completion order is arbitrary; the catalog merge follows input order
        outcomes.sort_by_key(|(index, _)| *index);
        self.finish(failures, outcomes.into_iter().map(|(_, outcome)| outcome))
    }

    fn finish(
        &self,
        mut failures: Vec<EntryFailure>,
        outcomes: impl IntoIterator<Item = Outcome>,
    ) -> SchemaResult<GenerationReport> {
        let mut builder = CatalogBuilder::new();
        for outcome in outcomes {
            match outcome {
                Ok(entry) => {
                    debug!("Emitted {} ({} fields)", entry.name(), entry.record.fields.len());
                    builder.insert(entry)?;
                }
                Err(failure) => failures.push(failure),
            }
        }
        let catalog = builder.build();

        for failure in &failures {
            warn!("Skipped {}", failure);
        }
        info!(
            "Generated {} records, {} failed",
            catalog.len(),
            failures.len()
        );

        let keep = failures.is_empty() || self.config.partial_output;
        Ok(GenerationReport {
            catalog: keep.then_some(catalog),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaFormat;

    const SERVICE: &str = r#"{
        "PropertyTypes": {
            "AWS::ECS::Service.LoadBalancer": {"Properties": {
                "ContainerName": {"PrimitiveType": "String"},
                "ContainerPort": {"PrimitiveType": "Integer"}
            }},
            "AWS::ECS::Service.Broken": {"Properties": {
                "Widget": {"Type": "Frobnicator"}
            }}
        },
        "ResourceTypes": {
            "AWS::ECS::Service": {"Properties": {
                "Cluster": {"PrimitiveType": "String", "Required": true},
                "LoadBalancers": {"Type": "List", "ItemType": "LoadBalancer"}
            }}
        }
    }"#;

    fn generator(partial_output: bool, jobs: usize) -> Generator {
        Generator::new(GeneratorConfig {
            partial_output,
            jobs,
            format: SchemaFormat::Specification,
        })
    }

    #[test]
    fn unknown_kind_fails_one_entry_only() {
        let pipeline = generator(true, 1);
        let report = pipeline.generate(pipeline.read([SERVICE]).unwrap()).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].type_name, "AWS::ECS::Service.Broken");
        assert!(matches!(
            report.failures[0].error,
            SchemaError::UnknownValueKind { ref field, .. } if field == "Widget"
        ));

        let catalog = report.catalog.unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("AWS::ECS::Service"));
        assert!(catalog.contains("AWS::ECS::Service.LoadBalancer"));
        assert!(!catalog.contains("AWS::ECS::Service.Broken"));
    }

    #[test]
    fn failures_drop_catalog_without_partial_output() {
        let pipeline = generator(false, 1);
        let report = pipeline.generate(pipeline.read([SERVICE]).unwrap()).unwrap();
        assert!(report.catalog.is_none());
        assert!(!report.is_success());
    }

    #[test]
    fn duplicate_across_sources_aborts() {
        let pipeline = generator(true, 1);
        let err = pipeline
            .generate(pipeline.read([SERVICE, SERVICE]).unwrap())
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTypeName { .. }));
    }

    #[test]
    fn document_error_stops_read() {
        let pipeline = generator(false, 1);
        assert!(pipeline.read([SERVICE, "{}"]).is_err());
    }

    #[test]
    fn clean_run_is_success() {
        let input = r#"{"ResourceTypes": {"AWS::SNS::Topic": {"Properties": {
            "TopicName": {"PrimitiveType": "String"}
        }}}}"#;
        let pipeline = generator(false, 1);
        let report = pipeline.generate(pipeline.read([input]).unwrap()).unwrap();
        assert!(report.is_success());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_matches_sequential() {
        let sequential = generator(true, 1);
        let concurrent = generator(true, 4);
        let schema = sequential.read([SERVICE]).unwrap();

        let a = sequential.generate(schema.clone()).unwrap();
        let b = concurrent.generate_concurrent(schema).await.unwrap();
        assert_eq!(a, b);

        let json_a: Vec<String> = a.catalog.unwrap().records().map(|r| r.to_json().unwrap()).collect();
        let json_b: Vec<String> = b.catalog.unwrap().records().map(|r| r.to_json().unwrap()).collect();
        assert_eq!(json_a, json_b);
    }

    #[tokio::test]
    async fn concurrent_reports_duplicates() {
        let pipeline = generator(false, 3);
        let schema = pipeline.read([SERVICE, SERVICE]).unwrap();
        let err = pipeline.generate_concurrent(schema).await.unwrap_err();
        // First name repeated in input order
        assert_eq!(err, SchemaError::duplicate("AWS::ECS::Service.LoadBalancer"));
    }

    const GOOD_RULE: &str = r#"{"PropertyTypes": {"AWS::S3::Bucket.Rule": {"Properties": {
        "Prefix": {"PrimitiveType": "String"}
    }}}}"#;

    const BAD_RULE: &str = r#"{"PropertyTypes": {"AWS::S3::Bucket.Rule": {"Properties": {
        "Widget": {"Type": "Frobnicator"}
    }}}}"#;

    const UNREADABLE_RULE: &str = r#"{"PropertyTypes": {"AWS::S3::Bucket.Rule": {
        "Documentation": "no properties"
    }}}"#;

    #[test]
    fn duplicate_with_failing_copy_aborts() {
        let pipeline = generator(true, 1);
        for sources in [[GOOD_RULE, BAD_RULE], [BAD_RULE, GOOD_RULE], [BAD_RULE, BAD_RULE]] {
            let err = pipeline.generate(pipeline.read(sources).unwrap()).unwrap_err();
            assert_eq!(err, SchemaError::duplicate("AWS::S3::Bucket.Rule"));
        }
    }

    #[test]
    fn duplicate_with_unreadable_copy_aborts() {
        let pipeline = generator(true, 1);
        let schema = pipeline.read([GOOD_RULE, UNREADABLE_RULE]).unwrap();
        assert_eq!(schema.failures.len(), 1);
        let err = pipeline.generate(schema).unwrap_err();
        assert_eq!(err, SchemaError::duplicate("AWS::S3::Bucket.Rule"));
    }

    #[tokio::test]
    async fn concurrent_duplicate_with_failing_copy_aborts() {
        let pipeline = generator(true, 4);
        let schema = pipeline.read([GOOD_RULE, BAD_RULE]).unwrap();
        let err = pipeline.generate_concurrent(schema).await.unwrap_err();
        assert_eq!(err, SchemaError::duplicate("AWS::S3::Bucket.Rule"));
    }
}
