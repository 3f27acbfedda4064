//! Core data model for the catalog reconciliation engine

use serde::{Deserialize, Serialize};

/// Classification of an assignment target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// A policy set definition, expandable into member policies
    Initiative,
    /// A standalone policy definition
    Policy,
}

/// Origin of a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefinitionKind {
    BuiltIn,
    Custom,
}

impl DefinitionKind {
    /// Parse the `policyType` field of a definition record
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "BuiltIn" => Some(Self::BuiltIn),
            "Custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// One scope manifest: an archetype and the assignment references it activates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeManifest {
    /// Archetype name identifying the deployment scope
    pub scope: String,
    /// Assignment references listed by the manifest, in manifest order
    pub assignments: Vec<String>,
}

/// A resolved assignment, keyed by (scope, reference)
///
/// Exactly one record exists per (scope, reference) pair that resolved;
/// unresolved pairs are dropped with a warning at resolve time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Deployment scope using this assignment
    pub scope: String,
    /// Reference name as it appears in the scope manifest
    pub reference: String,
    /// Assignment name from the assignment file
    pub name: String,
    /// Display name from the assignment file
    pub display_name: String,
    /// Raw target resource path
    pub target_path: String,
    /// Bare identifier extracted from the target path
    pub target_id: String,
    /// Whether the target is an initiative or a standalone policy
    pub kind: TargetKind,
    /// Enforcement mode (`Default` when the file omits it)
    pub enforcement_mode: String,
    /// Provenance link to the assignment file
    pub assignment_link: String,
}

/// A policy definition, or an identifier-only placeholder when the
/// definition source had nothing for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDefinition {
    /// Bare definition identifier
    pub id: String,
    pub display_name: String,
    pub description: String,
    /// Concrete effect value; parameterized effects are resolved to their
    /// default before reaching this struct
    pub effect: String,
    pub category: String,
    pub version: String,
    pub kind: Option<DefinitionKind>,
    /// Ordered-unique parameter names
    pub parameters: Vec<String>,
    /// Provenance link to the definition page
    pub definition_link: String,
    /// True when the fetch failed and only identifier + link are real
    pub placeholder: bool,
}

impl PolicyDefinition {
    /// Identifier-only stand-in installed on fetch failure so downstream
    /// joins never miss a key
    pub fn placeholder(id: &str, definition_link: String) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            description: String::new(),
            effect: String::new(),
            category: String::new(),
            version: String::new(),
            kind: None,
            parameters: Vec::new(),
            definition_link,
            placeholder: true,
        }
    }
}

/// An initiative definition, or an identifier-only placeholder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiativeDefinition {
    /// Bare definition identifier
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub category: String,
    pub version: String,
    pub kind: Option<DefinitionKind>,
    /// Bare identifiers of contained policies, in definition order
    pub policy_ids: Vec<String>,
    /// Provenance link to the definition page
    pub definition_link: String,
    /// True when the fetch failed and only identifier + link are real
    pub placeholder: bool,
}

impl InitiativeDefinition {
    pub fn placeholder(id: &str, definition_link: String) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            description: String::new(),
            category: String::new(),
            version: String::new(),
            kind: None,
            policy_ids: Vec::new(),
            definition_link,
            placeholder: true,
        }
    }

    /// Number of contained policies
    pub fn policy_count(&self) -> usize {
        self.policy_ids.len()
    }
}
