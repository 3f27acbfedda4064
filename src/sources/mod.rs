//! External data-source interfaces and their concrete adapters
//!
//! The core engine consumes three abstract sources: scope manifests,
//! assignment content, and the definition catalog. Transport concerns
//! (HTTP, rate limiting, HTML scraping, retries) live entirely inside the
//! adapters; the engine only sees validated record shapes. Not-found is a
//! normal `Ok(None)` outcome on every fetch, never an error.

mod advertizer;
mod github;
mod http;

pub use advertizer::AdvertizerSource;
pub use github::GithubSource;
pub use http::{HttpFetcher, RateLimiter};

use crate::catalog::model::{DefinitionKind, ScopeManifest};
use crate::error::Result;
use async_trait::async_trait;

/// Source of scope manifests (which references each archetype activates)
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// List every scope with its assignment references. May be empty;
    /// never returns a partially-read scope.
    async fn list_scopes(&self) -> Result<Vec<ScopeManifest>>;
}

/// Raw content of one assignment file
#[derive(Debug, Clone)]
pub struct AssignmentContent {
    /// Assignment name from the file
    pub name: String,
    /// Display name from the file
    pub display_name: String,
    /// Raw resource path of the assignment target
    pub target_path: String,
    /// Enforcement mode (`Default` when omitted)
    pub enforcement_mode: String,
    /// Provenance link to the assignment file
    pub link: String,
}

/// Source of per-reference assignment content
#[async_trait]
pub trait AssignmentSource: Send + Sync {
    /// Fetch the assignment content behind a reference name.
    /// `Ok(None)` when no file matches or its content is unusable.
    async fn fetch_assignment(&self, reference: &str) -> Result<Option<AssignmentContent>>;
}

/// Validated content of one policy definition
#[derive(Debug, Clone)]
pub struct PolicyContent {
    pub display_name: String,
    pub description: String,
    /// Concrete effect; the adapter resolves parameterized effects to
    /// their default value before handing the record over
    pub effect: String,
    pub category: String,
    pub version: String,
    pub kind: Option<DefinitionKind>,
    /// Ordered-unique parameter names
    pub parameters: Vec<String>,
}

/// Validated content of one initiative definition
#[derive(Debug, Clone)]
pub struct InitiativeContent {
    pub display_name: String,
    pub description: String,
    pub category: String,
    pub version: String,
    pub kind: Option<DefinitionKind>,
    /// Raw resource paths of the contained policies, in definition order
    pub policy_paths: Vec<String>,
}

/// Source of policy and initiative definitions
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    /// Fetch a policy definition. `Ok(None)` on not-found or malformed
    /// content; never an error for either condition.
    async fn fetch_policy(&self, id: &str) -> Result<Option<PolicyContent>>;

    /// Fetch an initiative definition. Same contract as `fetch_policy`.
    async fn fetch_initiative(&self, id: &str) -> Result<Option<InitiativeContent>>;

    /// Provenance link for a policy identifier. Available even when the
    /// fetch fails, so placeholders keep a usable link.
    fn policy_link(&self, id: &str) -> String;

    /// Provenance link for an initiative identifier.
    fn initiative_link(&self, id: &str) -> String;
}
