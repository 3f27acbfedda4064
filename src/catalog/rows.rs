//! Row materialization
//!
//! Joins assignment records with the definition catalog into the two
//! report tables. Initiative assignments produce one initiative row plus
//! one policy row per contained policy (provenance "Via Initiative",
//! carrying the composite `initiative|scope` key); standalone policy
//! assignments produce one "Individual" policy row. The same policy under
//! different initiatives or scopes is a materially different fact, so
//! policy rows are never deduplicated.

use super::aggregate::DefinitionCatalog;
use super::model::{AssignmentRecord, TargetKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of a policy row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Individual,
    #[serde(rename = "Via Initiative")]
    ViaInitiative,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual => write!(f, "Individual"),
            Self::ViaInitiative => write!(f, "Via Initiative"),
        }
    }
}

/// Composite join key for scope-aware filtering: `initiative|scope`.
///
/// Unique per (initiative, scope) combination and reproducible from the
/// same two inputs.
pub fn composite_key(initiative_id: &str, scope: &str) -> String {
    format!("{initiative_id}|{scope}")
}

/// One row of the initiatives table. Field order is the column order
/// downstream consumers depend on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiativeRow {
    pub assignment_name: String,
    pub initiative_identifier: String,
    pub initiative_display_name: String,
    pub scope: String,
    pub enforcement_mode: String,
    pub policy_count: usize,
    pub category: String,
    pub version: String,
    pub definition_link: String,
    pub assignment_link: String,
}

/// One row of the policies table. Field order is the column order
/// downstream consumers depend on; the composite key trails the schema
/// columns and is empty for Individual rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRow {
    pub policy_identifier: String,
    pub policy_display_name: String,
    pub effect: String,
    pub parameters: String,
    pub provenance: Provenance,
    pub initiative_identifier: String,
    pub initiative_display_name: String,
    pub assignment_name: String,
    pub scope: String,
    pub enforcement_mode: String,
    pub category: String,
    pub definition_link: String,
    #[serde(default)]
    pub composite_key: String,
}

/// Materialize both report tables from the records and the catalog.
///
/// The policy table comes back pre-sorted: Individual rows first, then
/// Via-Initiative rows ascending by initiative identifier, then policy
/// identifier.
pub fn materialize_rows(
    records: &[AssignmentRecord],
    catalog: &DefinitionCatalog,
) -> (Vec<InitiativeRow>, Vec<PolicyRow>) {
    let mut initiative_rows = Vec::new();
    let mut policy_rows = Vec::new();

    for record in records {
        match record.kind {
            TargetKind::Initiative => {
                let Some(initiative) = catalog.initiatives.get(&record.target_id) else {
                    // The aggregator installs placeholders even on failure,
                    // so a missing key means the stages desynchronized.
                    debug_assert!(false, "initiative {} absent from catalog", record.target_id);
                    tracing::error!(
                        id = %record.target_id,
                        scope = %record.scope,
                        "Initiative missing from completed catalog, stages desynchronized"
                    );
                    continue;
                };

                initiative_rows.push(InitiativeRow {
                    assignment_name: record.name.clone(),
                    initiative_identifier: initiative.id.clone(),
                    initiative_display_name: initiative.display_name.clone(),
                    scope: record.scope.clone(),
                    enforcement_mode: record.enforcement_mode.clone(),
                    policy_count: initiative.policy_count(),
                    category: initiative.category.clone(),
                    version: initiative.version.clone(),
                    definition_link: initiative.definition_link.clone(),
                    assignment_link: record.assignment_link.clone(),
                });

                let key = composite_key(&initiative.id, &record.scope);
                for pid in &initiative.policy_ids {
                    let Some(policy) = catalog.policies.get(pid) else {
                        debug_assert!(false, "policy {pid} absent from catalog");
                        tracing::error!(
                            id = %pid,
                            initiative = %initiative.id,
                            "Contained policy missing from completed catalog, stages desynchronized"
                        );
                        continue;
                    };
                    policy_rows.push(PolicyRow {
                        policy_identifier: policy.id.clone(),
                        policy_display_name: policy.display_name.clone(),
                        effect: policy.effect.clone(),
                        parameters: policy.parameters.join(", "),
                        provenance: Provenance::ViaInitiative,
                        initiative_identifier: initiative.id.clone(),
                        initiative_display_name: initiative.display_name.clone(),
                        assignment_name: record.name.clone(),
                        scope: record.scope.clone(),
                        enforcement_mode: record.enforcement_mode.clone(),
                        category: policy.category.clone(),
                        definition_link: policy.definition_link.clone(),
                        composite_key: key.clone(),
                    });
                }
            }
            TargetKind::Policy => {
                let Some(policy) = catalog.policies.get(&record.target_id) else {
                    debug_assert!(false, "policy {} absent from catalog", record.target_id);
                    tracing::error!(
                        id = %record.target_id,
                        scope = %record.scope,
                        "Policy missing from completed catalog, stages desynchronized"
                    );
                    continue;
                };
                policy_rows.push(PolicyRow {
                    policy_identifier: policy.id.clone(),
                    policy_display_name: policy.display_name.clone(),
                    effect: policy.effect.clone(),
                    parameters: policy.parameters.join(", "),
                    provenance: Provenance::Individual,
                    initiative_identifier: String::new(),
                    initiative_display_name: String::new(),
                    assignment_name: record.name.clone(),
                    scope: record.scope.clone(),
                    enforcement_mode: record.enforcement_mode.clone(),
                    category: policy.category.clone(),
                    definition_link: policy.definition_link.clone(),
                    composite_key: String::new(),
                });
            }
        }
    }

    // Presentation contract: Individual before Via-Initiative, then by
    // initiative identifier, then by policy identifier.
    policy_rows.sort_by(|a, b| {
        let rank = |p: &Provenance| match p {
            Provenance::Individual => 0,
            Provenance::ViaInitiative => 1,
        };
        rank(&a.provenance)
            .cmp(&rank(&b.provenance))
            .then_with(|| a.initiative_identifier.cmp(&b.initiative_identifier))
            .then_with(|| a.policy_identifier.cmp(&b.policy_identifier))
    });

    tracing::info!(
        initiative_rows = initiative_rows.len(),
        policy_rows = policy_rows.len(),
        "Materialized report rows"
    );
    (initiative_rows, policy_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{InitiativeDefinition, PolicyDefinition};

    fn record(scope: &str, target_id: &str, kind: TargetKind) -> AssignmentRecord {
        AssignmentRecord {
            scope: scope.to_string(),
            reference: target_id.to_string(),
            name: format!("{target_id}-assignment"),
            display_name: target_id.to_string(),
            target_path: format!("/defs/{target_id}"),
            target_id: target_id.to_string(),
            kind,
            enforcement_mode: "Default".to_string(),
            assignment_link: format!("mem://assignments/{target_id}"),
        }
    }

    fn policy(id: &str) -> PolicyDefinition {
        PolicyDefinition {
            id: id.to_string(),
            display_name: format!("{id} display"),
            description: String::new(),
            effect: "Audit".to_string(),
            category: "Test".to_string(),
            version: "1.0.0".to_string(),
            kind: None,
            parameters: vec!["effect".to_string(), "mode".to_string()],
            definition_link: format!("mem://policy/{id}"),
            placeholder: false,
        }
    }

    fn initiative(id: &str, policy_ids: &[&str]) -> InitiativeDefinition {
        InitiativeDefinition {
            id: id.to_string(),
            display_name: format!("{id} display"),
            description: String::new(),
            category: "Test".to_string(),
            version: "1.0.0".to_string(),
            kind: None,
            policy_ids: policy_ids.iter().map(|p| p.to_string()).collect(),
            definition_link: format!("mem://initiative/{id}"),
            placeholder: false,
        }
    }

    fn catalog(
        initiatives: Vec<InitiativeDefinition>,
        policies: Vec<PolicyDefinition>,
    ) -> DefinitionCatalog {
        DefinitionCatalog {
            initiatives: initiatives.into_iter().map(|d| (d.id.clone(), d)).collect(),
            policies: policies.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    #[test]
    fn initiative_assignment_expands_to_rows() {
        let catalog = catalog(
            vec![initiative("INIT1", &["P1", "P2"])],
            vec![policy("P1"), policy("P2")],
        );
        let records = vec![record("corp", "INIT1", TargetKind::Initiative)];

        let (initiative_rows, policy_rows) = materialize_rows(&records, &catalog);

        assert_eq!(initiative_rows.len(), 1);
        assert_eq!(initiative_rows[0].scope, "corp");
        assert_eq!(initiative_rows[0].policy_count, 2);
        assert_eq!(policy_rows.len(), 2);
        for row in &policy_rows {
            assert_eq!(row.provenance, Provenance::ViaInitiative);
            assert_eq!(row.composite_key, "INIT1|corp");
        }
    }

    #[test]
    fn shared_initiative_yields_per_scope_rows() {
        let catalog = catalog(
            vec![initiative("INIT1", &["P1", "P2"])],
            vec![policy("P1"), policy("P2")],
        );
        let records = vec![
            record("corp", "INIT1", TargetKind::Initiative),
            record("landing-zone", "INIT1", TargetKind::Initiative),
        ];

        let (initiative_rows, policy_rows) = materialize_rows(&records, &catalog);

        assert_eq!(initiative_rows.len(), 2);
        assert_eq!(policy_rows.len(), 4);
        let keys: Vec<&str> = policy_rows.iter().map(|r| r.composite_key.as_str()).collect();
        assert_eq!(keys.iter().filter(|k| **k == "INIT1|corp").count(), 2);
        assert_eq!(
            keys.iter().filter(|k| **k == "INIT1|landing-zone").count(),
            2
        );
    }

    #[test]
    fn standalone_policy_yields_individual_row() {
        let catalog = catalog(vec![], vec![policy("P9")]);
        let records = vec![record("corp", "P9", TargetKind::Policy)];

        let (initiative_rows, policy_rows) = materialize_rows(&records, &catalog);

        assert!(initiative_rows.is_empty());
        assert_eq!(policy_rows.len(), 1);
        assert_eq!(policy_rows[0].provenance, Provenance::Individual);
        assert_eq!(policy_rows[0].composite_key, "");
        assert_eq!(policy_rows[0].initiative_identifier, "");
        assert_eq!(policy_rows[0].parameters, "effect, mode");
    }

    #[test]
    fn placeholder_policy_still_emits_via_initiative_row() {
        let missing = PolicyDefinition::placeholder("P1", "mem://policy/P1".to_string());
        let catalog = catalog(vec![initiative("INIT1", &["P1"])], vec![missing]);
        let records = vec![record("corp", "INIT1", TargetKind::Initiative)];

        let (_, policy_rows) = materialize_rows(&records, &catalog);

        assert_eq!(policy_rows.len(), 1);
        assert_eq!(policy_rows[0].policy_identifier, "P1");
        assert_eq!(policy_rows[0].policy_display_name, "P1");
        assert_eq!(policy_rows[0].effect, "");
    }

    #[test]
    fn via_initiative_row_count_matches_policy_count_sum() {
        let catalog = catalog(
            vec![
                initiative("INIT1", &["P1", "P2"]),
                initiative("INIT2", &["P2", "P3", "P4"]),
            ],
            vec![policy("P1"), policy("P2"), policy("P3"), policy("P4")],
        );
        let records = vec![
            record("corp", "INIT1", TargetKind::Initiative),
            record("corp", "INIT2", TargetKind::Initiative),
            record("online", "INIT1", TargetKind::Initiative),
        ];

        let (initiative_rows, policy_rows) = materialize_rows(&records, &catalog);

        let expected: usize = initiative_rows.iter().map(|r| r.policy_count).sum();
        let via_initiative = policy_rows
            .iter()
            .filter(|r| r.provenance == Provenance::ViaInitiative)
            .count();
        assert_eq!(via_initiative, expected);
    }

    #[test]
    fn policy_table_sort_contract() {
        let catalog = catalog(
            vec![initiative("B-INIT", &["P2", "P1"]), initiative("A-INIT", &["P3"])],
            vec![policy("P1"), policy("P2"), policy("P3"), policy("P9")],
        );
        let records = vec![
            record("corp", "B-INIT", TargetKind::Initiative),
            record("corp", "P9", TargetKind::Policy),
            record("corp", "A-INIT", TargetKind::Initiative),
        ];

        let (_, policy_rows) = materialize_rows(&records, &catalog);

        let order: Vec<(String, String)> = policy_rows
            .iter()
            .map(|r| (r.initiative_identifier.clone(), r.policy_identifier.clone()))
            .collect();
        assert_eq!(
            order,
            [
                (String::new(), "P9".to_string()),
                ("A-INIT".to_string(), "P3".to_string()),
                ("B-INIT".to_string(), "P1".to_string()),
                ("B-INIT".to_string(), "P2".to_string()),
            ]
        );
    }

    #[test]
    fn composite_keys_are_unique_per_initiative_scope() {
        let catalog = catalog(
            vec![initiative("INIT1", &["P1"]), initiative("INIT2", &["P1"])],
            vec![policy("P1")],
        );
        let records = vec![
            record("corp", "INIT1", TargetKind::Initiative),
            record("corp", "INIT2", TargetKind::Initiative),
            record("online", "INIT1", TargetKind::Initiative),
        ];

        let (_, policy_rows) = materialize_rows(&records, &catalog);

        // Same policy appears under three distinct composite keys.
        let mut keys: Vec<&str> = policy_rows.iter().map(|r| r.composite_key.as_str()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys, ["INIT1|corp", "INIT1|online", "INIT2|corp"]);
    }
}
