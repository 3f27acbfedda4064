//! Definition aggregation
//!
//! Collects the full definition of every referenced initiative and policy.
//! Initiatives are fetched first and expanded; contained policy identifiers
//! discovered during expansion fold back into the policy fetch set, so the
//! final policy catalog is the closure of both seeds. Each identifier is
//! fetched at most once per run, and a failed fetch installs an
//! identifier-only placeholder so downstream joins never miss a key.

use super::ident;
use super::model::{AssignmentRecord, InitiativeDefinition, PolicyDefinition, TargetKind};
use crate::error::Result;
use crate::sources::DefinitionSource;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Completed definition catalog for one run
#[derive(Debug, Default)]
pub struct DefinitionCatalog {
    /// Initiative definitions keyed by bare identifier
    pub initiatives: HashMap<String, InitiativeDefinition>,
    /// Policy definitions keyed by bare identifier
    pub policies: HashMap<String, PolicyDefinition>,
}

impl DefinitionCatalog {
    /// Number of placeholder entries across both maps
    pub fn placeholder_count(&self) -> usize {
        self.initiatives.values().filter(|d| d.placeholder).count()
            + self.policies.values().filter(|d| d.placeholder).count()
    }
}

/// Fetch every definition the assignment records need, expanding
/// initiatives into their contained policies.
pub async fn aggregate_definitions(
    records: &[AssignmentRecord],
    source: &dyn DefinitionSource,
) -> Result<DefinitionCatalog> {
    // Seed the needed sets from the classification of every record target.
    // BTreeSet keeps fetch order (and therefore logs) deterministic.
    let mut needed_initiatives: BTreeSet<String> = BTreeSet::new();
    let mut needed_policies: BTreeSet<String> = BTreeSet::new();
    for record in records {
        match record.kind {
            TargetKind::Initiative => needed_initiatives.insert(record.target_id.clone()),
            TargetKind::Policy => needed_policies.insert(record.target_id.clone()),
        };
    }

    tracing::info!(
        initiatives = needed_initiatives.len(),
        direct_policies = needed_policies.len(),
        "Aggregating definitions"
    );

    let mut catalog = DefinitionCatalog::default();

    // Initiatives cannot contain other initiatives in this model, so one
    // drain over the seed set suffices.
    let mut pending: VecDeque<String> = needed_initiatives.into_iter().collect();
    let total = pending.len();
    let mut fetched = 0;
    while let Some(id) = pending.pop_front() {
        if catalog.initiatives.contains_key(&id) {
            continue;
        }
        fetched += 1;
        tracing::info!("  [{fetched}/{total}] initiative {id}");

        let link = source.initiative_link(&id);
        let definition = match source.fetch_initiative(&id).await {
            Ok(Some(content)) => {
                let policy_ids: Vec<String> = content
                    .policy_paths
                    .iter()
                    .map(|path| ident::extract_identifier(path))
                    .filter(|pid| !pid.is_empty())
                    .map(str::to_string)
                    .collect();
                for pid in &policy_ids {
                    needed_policies.insert(pid.clone());
                }
                InitiativeDefinition {
                    id: id.clone(),
                    display_name: content.display_name,
                    description: content.description,
                    category: content.category,
                    version: content.version,
                    kind: content.kind,
                    policy_ids,
                    definition_link: link,
                    placeholder: false,
                }
            }
            Ok(None) => {
                tracing::warn!(id = %id, "Initiative definition unavailable, installing placeholder");
                InitiativeDefinition::placeholder(&id, link)
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Initiative fetch failed, installing placeholder");
                InitiativeDefinition::placeholder(&id, link)
            }
        };
        catalog.initiatives.insert(id, definition);
    }

    let total = needed_policies.len();
    tracing::info!(policies = total, "Policy fetch set complete after expansion");

    let mut fetched = 0;
    for id in needed_policies {
        if catalog.policies.contains_key(&id) {
            continue;
        }
        fetched += 1;
        if fetched % 10 == 0 || fetched == total {
            tracing::info!("  [{fetched}/{total}] policy definitions");
        }

        let link = source.policy_link(&id);
        let definition = match source.fetch_policy(&id).await {
            Ok(Some(content)) => PolicyDefinition {
                id: id.clone(),
                display_name: content.display_name,
                description: content.description,
                effect: content.effect,
                category: content.category,
                version: content.version,
                kind: content.kind,
                parameters: content.parameters,
                definition_link: link,
                placeholder: false,
            },
            Ok(None) => {
                tracing::warn!(id = %id, "Policy definition unavailable, installing placeholder");
                PolicyDefinition::placeholder(&id, link)
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Policy fetch failed, installing placeholder");
                PolicyDefinition::placeholder(&id, link)
            }
        };
        catalog.policies.insert(id, definition);
    }

    tracing::info!(
        initiatives = catalog.initiatives.len(),
        policies = catalog.policies.len(),
        placeholders = catalog.placeholder_count(),
        "Definition catalog complete"
    );
    Ok(catalog)
}
