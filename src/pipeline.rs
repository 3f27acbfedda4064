//! Pipeline orchestration
//!
//! Runs the four stages in order against the configured sources and hands
//! the finished report to the sink. Every run is a full stateless rebuild;
//! partial source failures degrade to placeholder rows, never abort.

use crate::catalog::{
    aggregate_definitions, materialize_rows, resolve_assignments, ArchetypeGraph,
};
use crate::error::Result;
use crate::report::{Report, ReportSink};
use crate::sources::{AssignmentSource, DefinitionSource, ManifestSource};
use std::sync::Arc;

/// Summary counters of one extraction run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub scopes: usize,
    pub references: usize,
    pub records: usize,
    pub initiative_definitions: usize,
    pub policy_definitions: usize,
    pub placeholders: usize,
    pub initiative_rows: usize,
    pub policy_rows: usize,
}

/// Catalog extractor wiring sources, engine, and sink together
pub struct Extractor {
    manifests: Arc<dyn ManifestSource>,
    assignments: Arc<dyn AssignmentSource>,
    definitions: Arc<dyn DefinitionSource>,
    sink: Arc<dyn ReportSink>,
}

impl Extractor {
    pub fn new(
        manifests: Arc<dyn ManifestSource>,
        assignments: Arc<dyn AssignmentSource>,
        definitions: Arc<dyn DefinitionSource>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            manifests,
            assignments,
            definitions,
            sink,
        }
    }

    /// Run the full extraction and write the report.
    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("[1/4] Reading scope manifests");
        let manifests = self.manifests.list_scopes().await?;
        let graph = ArchetypeGraph::build(manifests);
        tracing::info!(
            scopes = graph.scope_count(),
            references = graph.reference_count(),
            pairs = graph.pair_count(),
            "Archetype graph built"
        );

        tracing::info!("[2/4] Resolving assignments");
        let records = resolve_assignments(&graph, self.assignments.as_ref()).await?;

        tracing::info!("[3/4] Aggregating definitions");
        let catalog = aggregate_definitions(&records, self.definitions.as_ref()).await?;

        tracing::info!("[4/4] Materializing report rows");
        let (initiative_rows, policy_rows) = materialize_rows(&records, &catalog);

        let summary = RunSummary {
            scopes: graph.scope_count(),
            references: graph.reference_count(),
            records: records.len(),
            initiative_definitions: catalog.initiatives.len(),
            policy_definitions: catalog.policies.len(),
            placeholders: catalog.placeholder_count(),
            initiative_rows: initiative_rows.len(),
            policy_rows: policy_rows.len(),
        };

        let report = Report::new(initiative_rows, policy_rows);
        self.sink.write(&report).await?;

        Ok(summary)
    }
}
