//! `ResolveForRepo`: compiles a manifest plus repo metadata into the set of
//! `PolicyExpectation`s that apply, honoring active exemptions.

use crate::matcher::matches_repo;
use core::{Exemption, OrgPolicyManifest, PolicyExpectation, RepoMeta};

#[derive(Debug, Clone)]
pub struct ResolvedPolicy<'a> {
    pub expectations: Vec<&'a PolicyExpectation>,
    pub active_exemptions: Vec<&'a Exemption>,
}

/// Starts with `defaults`, adds expectations from every classification whose
/// matcher accepts `(repo_name, repo_meta)`, then removes any expectation
/// covered by an active (non-expired) exemption for this repo.
pub fn resolve_for_repo<'a>(
    manifest: &'a OrgPolicyManifest,
    repo_name: &str,
    repo_meta: &RepoMeta,
    now: chrono::DateTime<chrono::Utc>,
) -> ResolvedPolicy<'a> {
    let mut expectations: Vec<&PolicyExpectation> = manifest.defaults.iter().collect();
    for classification in &manifest.classifications {
        if matches_repo(&classification.match_, repo_name, repo_meta) {
            expectations.extend(classification.expectations.iter());
        }
    }

    let active_exemptions: Vec<&Exemption> = manifest
        .exemptions
        .iter()
        .filter(|e| e.repo == repo_name && e.is_active(now))
        .collect();

    expectations.retain(|expectation| {
        !active_exemptions.iter().any(|exemption| exemption.covers(&expectation.id))
    });

    ResolvedPolicy { expectations, active_exemptions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use core::{Classification, ClassificationMatch, ExpectationCategory, PermissionLevel, Requirement, Severity};

    fn meta() -> RepoMeta {
        RepoMeta {
            topics: vec![],
            language: None,
            visibility: "private".into(),
            archived: false,
            default_branch: "main".into(),
            tags: vec![],
        }
    }

    fn expectation(id: &str) -> PolicyExpectation {
        PolicyExpectation {
            id: id.into(),
            name: id.into(),
            category: ExpectationCategory::Permissions,
            severity: Severity::High,
            requirement: Requirement::Permissions { max_default_permission: PermissionLevel::Read },
        }
    }

    fn manifest() -> OrgPolicyManifest {
        OrgPolicyManifest {
            schema_version: "1.0.0".into(),
            org_id: "acme".into(),
            updated_at: chrono::Utc::now(),
            approved_by: "admin".into(),
            defaults: vec![expectation("bp-main"), expectation("sc-oracle"), expectation("wf-oracle"), expectation("perm-read")],
            classifications: vec![Classification {
                name: "critical".into(),
                description: "".into(),
                match_: ClassificationMatch { repos: vec!["acme/docs-site".into()], ..Default::default() },
                expectations: vec![expectation("extra-critical")],
            }],
            exemptions: vec![],
            merge_queue: None,
        }
    }

    #[test]
    fn active_exemption_removes_covered_expectations() {
        let mut m = manifest();
        m.exemptions.push(Exemption {
            repo: "acme/docs-site".into(),
            expectation_ids: vec!["bp-main".into(), "sc-oracle".into(), "wf-oracle".into()],
            reason: "legacy".into(),
            approved_by: "admin".into(),
            expires_at: chrono::Utc::now() + Duration::days(90),
            ticket: None,
        });
        let resolved = resolve_for_repo(&m, "acme/docs-site", &meta(), chrono::Utc::now());
        let ids: Vec<&str> = resolved.expectations.iter().map(|e| e.id.as_str()).collect();
        assert!(!ids.contains(&"bp-main"));
        assert!(!ids.contains(&"sc-oracle"));
        assert!(!ids.contains(&"wf-oracle"));
        assert!(ids.contains(&"perm-read"));
        assert!(ids.contains(&"extra-critical"));
        assert_eq!(resolved.active_exemptions.len(), 1);
    }

    #[test]
    fn expired_exemption_no_longer_removes_expectations() {
        let mut m = manifest();
        m.exemptions.push(Exemption {
            repo: "acme/docs-site".into(),
            expectation_ids: vec!["bp-main".into()],
            reason: "legacy".into(),
            approved_by: "admin".into(),
            expires_at: chrono::Utc::now() - Duration::days(1),
            ticket: None,
        });
        let resolved = resolve_for_repo(&m, "acme/docs-site", &meta(), chrono::Utc::now());
        let ids: Vec<&str> = resolved.expectations.iter().map(|e| e.id.as_str()).collect();
        assert!(ids.contains(&"bp-main"));
        assert!(resolved.active_exemptions.is_empty());
    }

    #[test]
    fn non_matching_repo_does_not_get_classification_expectations() {
        let m = manifest();
        let resolved = resolve_for_repo(&m, "acme/api-gateway", &meta(), chrono::Utc::now());
        let ids: Vec<&str> = resolved.expectations.iter().map(|e| e.id.as_str()).collect();
        assert!(!ids.contains(&"extra-critical"));
    }
}
