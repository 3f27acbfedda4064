//! AzAdvertizer-backed definition source
//!
//! AzAdvertizer serves one HTML page per definition and embeds the full
//! definition JSON inside a `copyDef()` script function. This adapter
//! scrapes that JSON out, resolves parameterized effects to a concrete
//! value, and hands the engine a validated record shape — the engine never
//! sees HTML or raw policy rules.

use super::http::HttpFetcher;
use super::{DefinitionSource, InitiativeContent, PolicyContent};
use crate::catalog::model::DefinitionKind;
use crate::config::{AdvertizerConfig, HttpConfig};
use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

/// Definition source scraping AzAdvertizer pages
pub struct AdvertizerSource {
    config: AdvertizerConfig,
    fetcher: HttpFetcher,
    copy_def: Regex,
    effect_param: Regex,
}

impl AdvertizerSource {
    pub fn new(config: AdvertizerConfig, http: &HttpConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(
            http,
            std::time::Duration::from_millis(config.rate_limit_ms),
        )?;
        Ok(Self {
            config,
            fetcher,
            copy_def: Regex::new(
                r"function\s+copyDef\s*\(\s*\)\s*\{\s*const\s+obj\s*=\s*(\{[\s\S]*?\});",
            )
            .expect("static pattern"),
            effect_param: Regex::new(r"\[parameters\('([^']+)'\)\]").expect("static pattern"),
        })
    }

    /// Pull the embedded definition JSON out of a definition page.
    fn extract_embedded_definition(&self, html: &str) -> Option<Value> {
        let captures = self.copy_def.captures(html)?;
        serde_json::from_str(captures.get(1)?.as_str()).ok()
    }

    /// Resolve the effect of a policy rule to a concrete value.
    ///
    /// Parameterized effects (`[parameters('effect')]`) resolve to the
    /// parameter's default value, falling back to `Parameterized` when no
    /// default exists. Non-string effects resolve to `Unknown`.
    fn resolve_effect(&self, properties: &Value) -> String {
        let effect = &properties["policyRule"]["then"]["effect"];
        let Some(effect) = effect.as_str() else {
            return "Unknown".to_string();
        };

        if !effect.starts_with("[parameters(") {
            return effect.to_string();
        }

        let Some(captures) = self.effect_param.captures(effect) else {
            return "Parameterized".to_string();
        };
        let param_name = &captures[1];
        let params = &properties["parameters"];
        let param_def = if params[param_name].is_object() {
            &params[param_name]
        } else {
            &params[param_name.to_ascii_lowercase()]
        };

        match &param_def["defaultValue"] {
            Value::String(default) => default.clone(),
            Value::Null => "Parameterized".to_string(),
            other => other.to_string(),
        }
    }

    /// Ordered-unique parameter names of a definition.
    fn parameter_names(properties: &Value) -> Vec<String> {
        let Some(params) = properties["parameters"].as_object() else {
            return Vec::new();
        };
        let mut names: Vec<String> = params.keys().cloned().collect();
        names.sort();
        names.dedup();
        names
    }

    fn metadata_field(properties: &Value, field: &str) -> String {
        properties["metadata"][field]
            .as_str()
            .unwrap_or("")
            .to_string()
    }

    fn kind(properties: &Value) -> Option<DefinitionKind> {
        properties["policyType"].as_str().and_then(DefinitionKind::parse)
    }

    /// Fetch a definition page and extract the embedded `properties` object.
    async fn fetch_properties(&self, url: &str) -> Result<Option<Value>> {
        let Some(html) = self.fetcher.get_text(url).await? else {
            return Ok(None);
        };
        let Some(data) = self.extract_embedded_definition(&html) else {
            tracing::warn!(%url, "No embedded definition found in page");
            return Ok(None);
        };
        // Some pages wrap the definition in a `properties` envelope,
        // some embed the properties directly.
        if data["properties"].is_object() {
            Ok(Some(data["properties"].clone()))
        } else {
            Ok(Some(data))
        }
    }
}

#[async_trait]
impl DefinitionSource for AdvertizerSource {
    async fn fetch_policy(&self, id: &str) -> Result<Option<PolicyContent>> {
        let url = self.policy_link(id);
        let Some(properties) = self.fetch_properties(&url).await? else {
            return Ok(None);
        };

        Ok(Some(PolicyContent {
            display_name: properties["displayName"].as_str().unwrap_or(id).to_string(),
            description: properties["description"].as_str().unwrap_or("").to_string(),
            effect: self.resolve_effect(&properties),
            category: Self::metadata_field(&properties, "category"),
            version: Self::metadata_field(&properties, "version"),
            kind: Self::kind(&properties),
            parameters: Self::parameter_names(&properties),
        }))
    }

    async fn fetch_initiative(&self, id: &str) -> Result<Option<InitiativeContent>> {
        let url = self.initiative_link(id);
        let Some(properties) = self.fetch_properties(&url).await? else {
            return Ok(None);
        };

        let policy_paths: Vec<String> = properties["policyDefinitions"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter_map(|entry| entry["policyDefinitionId"].as_str())
            .map(str::to_string)
            .collect();

        Ok(Some(InitiativeContent {
            display_name: properties["displayName"].as_str().unwrap_or(id).to_string(),
            description: properties["description"].as_str().unwrap_or("").to_string(),
            category: Self::metadata_field(&properties, "category"),
            version: Self::metadata_field(&properties, "version"),
            kind: Self::kind(&properties),
            policy_paths,
        }))
    }

    fn policy_link(&self, id: &str) -> String {
        format!(
            "{}/azpolicyadvertizer/{}.html",
            self.config.base_url,
            urlencoding::encode(id)
        )
    }

    fn initiative_link(&self, id: &str) -> String {
        format!(
            "{}/azpolicyinitiativesadvertizer/{}.html",
            self.config.base_url,
            urlencoding::encode(id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> AdvertizerSource {
        AdvertizerSource::new(AdvertizerConfig::default(), &HttpConfig::default()).unwrap()
    }

    #[test]
    fn extracts_definition_from_copy_def_script() {
        let html = r#"
            <html><script>
            function copyDef() { const obj = {"properties": {"displayName": "Audit VMs"}};
            navigator.clipboard.writeText(JSON.stringify(obj)); }
            </script></html>
        "#;
        let data = source().extract_embedded_definition(html).unwrap();
        assert_eq!(data["properties"]["displayName"], "Audit VMs");
    }

    #[test]
    fn page_without_copy_def_yields_none() {
        assert!(source()
            .extract_embedded_definition("<html><body>404</body></html>")
            .is_none());
    }

    #[test]
    fn plain_effect_passes_through() {
        let properties = json!({"policyRule": {"then": {"effect": "Deny"}}});
        assert_eq!(source().resolve_effect(&properties), "Deny");
    }

    #[test]
    fn parameterized_effect_resolves_to_default() {
        let properties = json!({
            "policyRule": {"then": {"effect": "[parameters('effect')]"}},
            "parameters": {"effect": {"defaultValue": "AuditIfNotExists"}}
        });
        assert_eq!(source().resolve_effect(&properties), "AuditIfNotExists");
    }

    #[test]
    fn parameterized_effect_without_default_is_parameterized() {
        let properties = json!({
            "policyRule": {"then": {"effect": "[parameters('effect')]"}},
            "parameters": {"effect": {"allowedValues": ["Audit", "Deny"]}}
        });
        assert_eq!(source().resolve_effect(&properties), "Parameterized");
    }

    #[test]
    fn parameterized_effect_falls_back_to_lowercase_parameter() {
        let properties = json!({
            "policyRule": {"then": {"effect": "[parameters('Effect')]"}},
            "parameters": {"effect": {"defaultValue": "Audit"}}
        });
        assert_eq!(source().resolve_effect(&properties), "Audit");
    }

    #[test]
    fn non_string_effect_is_unknown() {
        let properties = json!({"policyRule": {"then": {"effect": {"complex": true}}}});
        assert_eq!(source().resolve_effect(&properties), "Unknown");
    }

    #[test]
    fn parameter_names_are_sorted_and_unique() {
        let properties = json!({
            "parameters": {"zeta": {}, "alpha": {}, "mid": {}}
        });
        assert_eq!(
            AdvertizerSource::parameter_names(&properties),
            ["alpha", "mid", "zeta"]
        );
        assert!(AdvertizerSource::parameter_names(&json!({})).is_empty());
    }

    #[test]
    fn links_encode_identifier() {
        let s = source();
        assert_eq!(
            s.policy_link("Deny Public IP"),
            "https://www.azadvertizer.net/azpolicyadvertizer/Deny%20Public%20IP.html"
        );
        assert!(s.initiative_link("x").contains("azpolicyinitiativesadvertizer"));
    }
}
