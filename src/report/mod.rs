//! Report assembly and sinks
//!
//! A [`Report`] carries both materialized tables plus the composite-key
//! scheme, and answers the scope-aware filtering query (given selected
//! initiative identifiers and a scope, return the matching policy rows).
//! Sinks render it; the one shipped here writes a single JSON document.
//! Spreadsheet rendering is an external collaborator behind the same
//! trait.

use crate::catalog::rows::{composite_key, InitiativeRow, PolicyRow, Provenance};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Description of the composite join key attached to Via-Initiative rows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeKeyScheme {
    /// Fields joined into the key, in order
    pub fields: [String; 2],
    /// Separator between the fields
    pub separator: String,
}

impl Default for CompositeKeyScheme {
    fn default() -> Self {
        Self {
            fields: [
                "initiativeIdentifier".to_string(),
                "scope".to_string(),
            ],
            separator: "|".to_string(),
        }
    }
}

/// The complete reconciled report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// One row per (initiative assignment, scope)
    pub initiatives: Vec<InitiativeRow>,
    /// One row per (policy, containing-initiative-or-none, scope),
    /// pre-sorted: Individual first, then initiative id, then policy id
    pub policies: Vec<PolicyRow>,
    /// Join-key scheme used by `policies[].compositeKey`
    pub composite_key_scheme: CompositeKeyScheme,
}

impl Report {
    pub fn new(initiatives: Vec<InitiativeRow>, policies: Vec<PolicyRow>) -> Self {
        Self {
            initiatives,
            policies,
            composite_key_scheme: CompositeKeyScheme::default(),
        }
    }

    /// Scope-aware filtering: the Via-Initiative policy rows belonging to
    /// any of the selected initiatives within the given scope.
    pub fn filter_policies<'a>(
        &'a self,
        selected_initiatives: &HashSet<String>,
        scope: &str,
    ) -> Vec<&'a PolicyRow> {
        let keys: HashSet<String> = selected_initiatives
            .iter()
            .map(|id| composite_key(id, scope))
            .collect();
        self.policies
            .iter()
            .filter(|row| row.provenance == Provenance::ViaInitiative)
            .filter(|row| keys.contains(&row.composite_key))
            .collect()
    }
}

/// Consumer of the finished report
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Render the report. The policy table arrives pre-sorted.
    async fn write(&self, report: &Report) -> Result<()>;
}

/// Sink writing the report as one pretty-printed JSON document
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ReportSink for JsonReportSink {
    async fn write(&self, report: &Report) -> Result<()> {
        let body = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&self.path, body).await?;
        tracing::info!(
            path = %self.path.display(),
            initiatives = report.initiatives.len(),
            policies = report.policies.len(),
            "Report written"
        );
        Ok(())
    }
}
