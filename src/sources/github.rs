//! GitHub-backed manifest and assignment source
//!
//! Reads the archetype manifest directory and the assignment file directory
//! of the landing-zone terraform module through the GitHub contents API.
//! Manifest and assignment files are terraform templates, so `${...}`
//! placeholders are scrubbed to a fixed sentinel before JSON parsing —
//! template-parameterized content resolves deterministically to one
//! interpretation instead of per-scope variants.

use super::http::HttpFetcher;
use super::{AssignmentContent, AssignmentSource, ManifestSource};
use crate::catalog::model::ScopeManifest;
use crate::config::{GithubConfig, HttpConfig};
use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Sentinel substituted for every `${...}` template placeholder
const TEMPLATE_SENTINEL: &str = "TEMPLATE_VAR";

/// Filename prefix of assignment files in the module
const ASSIGNMENT_PREFIX: &str = "policy_assignment_es_";

#[derive(Debug, Clone)]
struct FileEntry {
    download_url: String,
    html_url: String,
}

/// Manifest and assignment source over the GitHub contents API
pub struct GithubSource {
    config: GithubConfig,
    fetcher: HttpFetcher,
    template_var: Regex,
    /// Lazily-fetched assignment directory listing, name → entry
    assignment_files: Mutex<Option<HashMap<String, FileEntry>>>,
}

impl GithubSource {
    pub fn new(config: GithubConfig, http: &HttpConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(
            http,
            std::time::Duration::from_millis(config.rate_limit_ms),
        )?;
        Ok(Self {
            config,
            fetcher,
            // Infallible pattern, compiled once.
            template_var: Regex::new(r"\$\{[^}]+\}").expect("static pattern"),
            assignment_files: Mutex::new(None),
        })
    }

    fn contents_url(&self, dir: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.config.api_base, self.config.repo, dir
        )
    }

    /// Replace template placeholders with the fixed sentinel so the file
    /// parses as plain JSON.
    fn scrub_template_vars(&self, content: &str) -> String {
        self.template_var
            .replace_all(content, TEMPLATE_SENTINEL)
            .into_owned()
    }

    /// Candidate assignment filenames for a reference, most specific first.
    fn candidate_filenames(reference: &str) -> [String; 2] {
        let stem = reference.to_ascii_lowercase().replace('-', "_");
        [
            format!("{ASSIGNMENT_PREFIX}{stem}.tmpl.json"),
            format!("{ASSIGNMENT_PREFIX}{stem}.json"),
        ]
    }

    /// Reference name encoded in an assignment filename, for the
    /// case-insensitive fallback match.
    fn reference_from_filename(filename: &str) -> Option<String> {
        let stem = filename
            .strip_prefix(ASSIGNMENT_PREFIX)?
            .trim_end_matches(".json")
            .trim_end_matches(".tmpl");
        Some(stem.replace('_', "-"))
    }

    async fn list_directory(&self, dir: &str) -> Result<Vec<(String, FileEntry)>> {
        let url = self.contents_url(dir);
        let Some(listing) = self.fetcher.get_json(&url).await? else {
            tracing::warn!(%url, "Directory listing not found");
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for item in listing.as_array().map(Vec::as_slice).unwrap_or(&[]) {
            if item["type"].as_str() != Some("file") {
                continue;
            }
            let Some(name) = item["name"].as_str() else {
                continue;
            };
            let Some(download_url) = item["download_url"].as_str() else {
                continue;
            };
            entries.push((
                name.to_string(),
                FileEntry {
                    download_url: download_url.to_string(),
                    html_url: item["html_url"].as_str().unwrap_or("").to_string(),
                },
            ));
        }
        Ok(entries)
    }

    /// Locate the assignment file for a reference, fetching and caching the
    /// directory listing on first use.
    async fn find_assignment_file(&self, reference: &str) -> Result<Option<FileEntry>> {
        let mut cache = self.assignment_files.lock().await;
        if cache.is_none() {
            let listing = self
                .list_directory(&self.config.assignment_dir)
                .await?
                .into_iter()
                .collect::<HashMap<_, _>>();
            tracing::debug!(files = listing.len(), "Cached assignment directory listing");
            *cache = Some(listing);
        }
        let files = cache.as_ref().expect("listing cached above");

        for candidate in Self::candidate_filenames(reference) {
            if let Some(entry) = files.get(&candidate) {
                return Ok(Some(entry.clone()));
            }
        }

        // Fallback: case-insensitive match on the normalized reference name.
        for (filename, entry) in files {
            if let Some(encoded) = Self::reference_from_filename(filename) {
                if encoded.eq_ignore_ascii_case(reference) {
                    return Ok(Some(entry.clone()));
                }
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl ManifestSource for GithubSource {
    async fn list_scopes(&self) -> Result<Vec<ScopeManifest>> {
        let mut manifests = Vec::new();

        for (name, entry) in self.list_directory(&self.config.archetype_dir).await? {
            if !name.ends_with(".json") || name.contains("default_empty") {
                continue;
            }
            let Some(content) = self.fetcher.get_text(&entry.download_url).await? else {
                tracing::warn!(file = %name, "Archetype file unreadable, skipping");
                continue;
            };

            let scrubbed = self.scrub_template_vars(&content);
            let data: serde_json::Value = match serde_json::from_str(&scrubbed) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "Archetype file is not valid JSON, skipping");
                    continue;
                }
            };

            let Some(archetypes) = data.as_object() else {
                continue;
            };
            for (scope, body) in archetypes {
                let assignments: Vec<String> = body["policy_assignments"]
                    .as_array()
                    .map(Vec::as_slice)
                    .unwrap_or(&[])
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                if assignments.is_empty() {
                    continue;
                }
                tracing::debug!(scope = %scope, assignments = assignments.len(), "Loaded archetype");
                manifests.push(ScopeManifest {
                    scope: scope.clone(),
                    assignments,
                });
            }
        }

        Ok(manifests)
    }
}

#[async_trait]
impl AssignmentSource for GithubSource {
    async fn fetch_assignment(&self, reference: &str) -> Result<Option<AssignmentContent>> {
        let Some(entry) = self.find_assignment_file(reference).await? else {
            tracing::warn!(reference = %reference, "No assignment file matches reference");
            return Ok(None);
        };

        let Some(content) = self.fetcher.get_text(&entry.download_url).await? else {
            return Ok(None);
        };

        let scrubbed = self.scrub_template_vars(&content);
        let data: serde_json::Value = match serde_json::from_str(&scrubbed) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(reference = %reference, error = %e, "Assignment file is not valid JSON, skipping");
                return Ok(None);
            }
        };

        let name = data["name"].as_str().unwrap_or(reference).to_string();
        let properties = &data["properties"];

        Ok(Some(AssignmentContent {
            display_name: properties["displayName"].as_str().unwrap_or(&name).to_string(),
            target_path: properties["policyDefinitionId"]
                .as_str()
                .unwrap_or("")
                .to_string(),
            enforcement_mode: properties["enforcementMode"]
                .as_str()
                .unwrap_or("Default")
                .to_string(),
            link: entry.html_url,
            name,
        }))
    }
}
