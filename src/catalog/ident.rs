//! Identifier resolution and classification
//!
//! Assignment targets arrive as heterogeneous resource paths
//! (`/providers/Microsoft.Authorization/policySetDefinitions/<id>`,
//! management-group scoped variants, or occasionally a bare id). The
//! functions here reduce them to stable bare identifiers and classify
//! the target kind from the path alone.

use super::model::TargetKind;

/// Path marker for policy set (initiative) resources
const INITIATIVE_MARKER: &str = "policySetDefinitions";

/// Extract the bare identifier from a resource path.
///
/// Takes the trailing segment after stripping a trailing separator. An
/// empty input yields an empty string; malformed input degrades to an
/// unhelpful-but-valid identifier rather than failing the run.
pub fn extract_identifier(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((_, last)) => last,
        None => trimmed,
    }
}

/// Classify an assignment target from its resource path.
///
/// A target is an initiative iff the path names a policy set resource.
/// This is a pure string-level decision, independent of fetched content,
/// and defaults to `Policy` for anything else.
pub fn classify(path: &str) -> TargetKind {
    if path.contains(INITIATIVE_MARKER) {
        TargetKind::Initiative
    } else {
        TargetKind::Policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_trailing_segment() {
        assert_eq!(
            extract_identifier(
                "/providers/Microsoft.Authorization/policyDefinitions/abc-123"
            ),
            "abc-123"
        );
    }

    #[test]
    fn strips_trailing_separator() {
        assert_eq!(
            extract_identifier("/providers/Microsoft.Authorization/policyDefinitions/abc-123/"),
            "abc-123"
        );
    }

    #[test]
    fn empty_input_yields_empty_identifier() {
        assert_eq!(extract_identifier(""), "");
    }

    #[test]
    fn bare_identifier_passes_through() {
        assert_eq!(extract_identifier("Deny-Public-IP"), "Deny-Public-IP");
    }

    #[test]
    fn classifies_policy_set_paths_as_initiative() {
        let path = "/providers/Microsoft.Authorization/policySetDefinitions/Enforce-Guardrails";
        assert_eq!(classify(path), TargetKind::Initiative);
    }

    #[test]
    fn classifies_everything_else_as_policy() {
        let path = "/providers/Microsoft.Authorization/policyDefinitions/Deny-Public-IP";
        assert_eq!(classify(path), TargetKind::Policy);
        assert_eq!(classify(""), TargetKind::Policy);
    }

    #[test]
    fn classify_is_idempotent() {
        let path = "/providers/Microsoft.Authorization/policySetDefinitions/x";
        assert_eq!(classify(path), classify(path));
    }
}
