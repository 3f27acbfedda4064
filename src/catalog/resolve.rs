//! Assignment resolution
//!
//! Fetches each unique assignment reference once and fans the content back
//! out into one [`AssignmentRecord`] per (scope, reference) pair. A
//! reference that cannot be fetched, parsed, or that carries no target
//! path skips every scope depending on it — logged, never fatal.

use super::graph::ArchetypeGraph;
use super::ident;
use super::model::AssignmentRecord;
use crate::error::Result;
use crate::sources::AssignmentSource;

/// Resolve every (scope, reference) pair in the graph into assignment
/// records. Each unique reference is fetched exactly once.
pub async fn resolve_assignments(
    graph: &ArchetypeGraph,
    source: &dyn AssignmentSource,
) -> Result<Vec<AssignmentRecord>> {
    let mut records = Vec::new();

    for reference in graph.references() {
        let content = match source.fetch_assignment(reference).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                tracing::warn!(reference, "Assignment not found, skipping its scopes");
                continue;
            }
            Err(e) => {
                tracing::warn!(reference, error = %e, "Assignment fetch failed, skipping its scopes");
                continue;
            }
        };

        let target_id = ident::extract_identifier(&content.target_path);
        if target_id.is_empty() {
            tracing::warn!(reference, "Assignment has no target path, skipping its scopes");
            continue;
        }
        let kind = ident::classify(&content.target_path);

        for scope in graph.scopes_for(reference) {
            records.push(AssignmentRecord {
                scope: scope.clone(),
                reference: reference.to_string(),
                name: content.name.clone(),
                display_name: content.display_name.clone(),
                target_path: content.target_path.clone(),
                target_id: target_id.to_string(),
                kind,
                enforcement_mode: content.enforcement_mode.clone(),
                assignment_link: content.link.clone(),
            });
        }
    }

    tracing::info!(records = records.len(), "Resolved assignment records");
    Ok(records)
}
