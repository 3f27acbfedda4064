//! Policat configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Policat configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicatConfig {
    /// GitHub manifest/assignment source configuration
    #[serde(default)]
    pub github: GithubConfig,

    /// AzAdvertizer definition source configuration
    #[serde(default)]
    pub advertizer: AdvertizerConfig,

    /// HTTP transport configuration shared by all sources
    #[serde(default)]
    pub http: HttpConfig,

    /// Report output configuration
    #[serde(default)]
    pub report: ReportConfig,
}

/// GitHub source configuration
///
/// Archetype manifests and assignment files live in the enterprise-scale
/// landing zone terraform module; both directories are read through the
/// contents API and downloaded raw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Repository slug (`owner/repo`)
    pub repo: String,

    /// Path of the archetype manifest directory inside the repo
    pub archetype_dir: String,

    /// Path of the assignment file directory inside the repo
    pub assignment_dir: String,

    /// GitHub API base URL
    pub api_base: String,

    /// Minimum interval between GitHub requests, in milliseconds
    pub rate_limit_ms: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            repo: "Azure/terraform-azurerm-caf-enterprise-scale".to_string(),
            archetype_dir: "modules/archetypes/lib/archetype_definitions".to_string(),
            assignment_dir: "modules/archetypes/lib/policy_assignments".to_string(),
            api_base: "https://api.github.com".to_string(),
            rate_limit_ms: 100,
        }
    }
}

/// AzAdvertizer source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertizerConfig {
    /// Base URL of the AzAdvertizer site
    pub base_url: String,

    /// Minimum interval between AzAdvertizer requests, in milliseconds
    pub rate_limit_ms: u64,
}

impl Default for AdvertizerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.azadvertizer.net".to_string(),
            rate_limit_ms: 200,
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request deadline in seconds
    pub timeout_secs: u64,

    /// Maximum attempts per request (1 = no retry)
    pub retry_attempts: u32,

    /// Base backoff between retries, in milliseconds (multiplied by attempt)
    pub retry_backoff_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_attempts: 3,
            retry_backoff_ms: 500,
            user_agent: format!("policat/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output file path for the JSON report
    pub output: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("policy_catalog.json"),
        }
    }
}
