//! Archetype graph: which scopes activate which assignment references
//!
//! The forward direction (scope → references) mirrors the manifests as
//! read; the inverse direction (reference → scopes) drives the resolver,
//! which fetches each reference once and fans records back out per scope.
//! References are never deduplicated across scopes here — deduplication of
//! fetch work happens in the aggregator, deduplication of per-scope facts
//! never happens.

use super::model::ScopeManifest;
use std::collections::HashMap;

/// Bidirectional scope/reference mapping built from scope manifests
#[derive(Debug, Default)]
pub struct ArchetypeGraph {
    /// Scope manifests in listing order
    forward: Vec<ScopeManifest>,
    /// Unique references in first-seen order
    reference_order: Vec<String>,
    /// Inverse map: reference → scopes using it, in first-seen order
    inverse: HashMap<String, Vec<String>>,
}

impl ArchetypeGraph {
    /// Build the graph from scope manifests.
    pub fn build(manifests: Vec<ScopeManifest>) -> Self {
        let mut reference_order = Vec::new();
        let mut inverse: HashMap<String, Vec<String>> = HashMap::new();

        for manifest in &manifests {
            for reference in &manifest.assignments {
                let scopes = inverse.entry(reference.clone()).or_insert_with(|| {
                    reference_order.push(reference.clone());
                    Vec::new()
                });
                // A manifest may list the same reference twice; the pair
                // still counts once, or the resolver would emit duplicate
                // records for it.
                if !scopes.iter().any(|s| s == &manifest.scope) {
                    scopes.push(manifest.scope.clone());
                }
            }
        }

        Self {
            forward: manifests,
            reference_order,
            inverse,
        }
    }

    /// Scope manifests in listing order
    pub fn scopes(&self) -> &[ScopeManifest] {
        &self.forward
    }

    /// Unique assignment references in first-seen order
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.reference_order.iter().map(String::as_str)
    }

    /// Scopes that use the given reference, in first-seen order
    pub fn scopes_for(&self, reference: &str) -> &[String] {
        self.inverse.get(reference).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of scopes
    pub fn scope_count(&self) -> usize {
        self.forward.len()
    }

    /// Number of unique assignment references
    pub fn reference_count(&self) -> usize {
        self.reference_order.len()
    }

    /// Total number of (scope, reference) pairs
    pub fn pair_count(&self) -> usize {
        self.forward.iter().map(|m| m.assignments.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(scope: &str, assignments: &[&str]) -> ScopeManifest {
        ScopeManifest {
            scope: scope.to_string(),
            assignments: assignments.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn builds_forward_and_inverse_maps() {
        let graph = ArchetypeGraph::build(vec![
            manifest("corp", &["A", "B"]),
            manifest("landing-zone", &["A"]),
        ]);

        assert_eq!(graph.scope_count(), 2);
        assert_eq!(graph.reference_count(), 2);
        assert_eq!(graph.pair_count(), 3);
        assert_eq!(graph.scopes_for("A"), ["corp", "landing-zone"]);
        assert_eq!(graph.scopes_for("B"), ["corp"]);
    }

    #[test]
    fn shared_reference_appears_under_every_scope() {
        let graph = ArchetypeGraph::build(vec![
            manifest("root", &["Deploy-MDFC"]),
            manifest("corp", &["Deploy-MDFC"]),
            manifest("online", &["Deploy-MDFC"]),
        ]);

        assert_eq!(graph.scopes_for("Deploy-MDFC").len(), 3);
        assert_eq!(graph.reference_count(), 1);
    }

    #[test]
    fn references_keep_first_seen_order() {
        let graph = ArchetypeGraph::build(vec![
            manifest("s1", &["C", "A"]),
            manifest("s2", &["B", "A"]),
        ]);

        let order: Vec<&str> = graph.references().collect();
        assert_eq!(order, ["C", "A", "B"]);
    }

    #[test]
    fn repeated_reference_in_one_manifest_counts_once() {
        let graph = ArchetypeGraph::build(vec![
            manifest("corp", &["A", "A", "B"]),
            manifest("online", &["A"]),
        ]);

        assert_eq!(graph.scopes_for("A"), ["corp", "online"]);
        assert_eq!(graph.reference_count(), 2);
    }

    #[test]
    fn unknown_reference_has_no_scopes() {
        let graph = ArchetypeGraph::build(vec![manifest("corp", &["A"])]);
        assert!(graph.scopes_for("missing").is_empty());
    }
}
