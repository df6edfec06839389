//! Manifest validation: required fields, exemption references, and
//! expired-but-loadable exemptions.

use core::OrgPolicyManifest;
use errors::PolicyError;

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<PolicyError>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates a manifest's structural and referential integrity. Expired
/// exemptions are reported as warnings, not errors — they remain loadable,
/// just inactive.
pub fn validate(manifest: &OrgPolicyManifest) -> ValidationReport {
    let mut report = ValidationReport::default();

    if manifest.org_id.is_empty() {
        report
            .errors
            .push(PolicyError::EmptyExemptionField { exemption_index: 0, field: "orgId".into() });
    }
    if manifest.approved_by.is_empty() {
        report
            .errors
            .push(PolicyError::EmptyExemptionField { exemption_index: 0, field: "approvedBy".into() });
    }
    if manifest.schema_version.is_empty() {
        report
            .errors
            .push(PolicyError::EmptyExemptionField { exemption_index: 0, field: "schemaVersion".into() });
    }

    let known_ids: std::collections::HashSet<&str> = manifest.all_expectation_ids().collect();
    let mut seen_ids = std::collections::HashSet::new();
    for expectation in manifest
        .defaults
        .iter()
        .chain(manifest.classifications.iter().flat_map(|c| c.expectations.iter()))
    {
        if !seen_ids.insert(expectation.id.as_str()) {
            report
                .errors
                .push(PolicyError::DuplicateExpectation { expectation_id: expectation.id.clone() });
        }
    }

    let now = chrono::Utc::now();
    for (index, exemption) in manifest.exemptions.iter().enumerate() {
        if exemption.reason.trim().is_empty() {
            report.errors.push(PolicyError::EmptyExemptionField { exemption_index: index, field: "reason".into() });
        }
        if exemption.approved_by.trim().is_empty() {
            report
                .errors
                .push(PolicyError::EmptyExemptionField { exemption_index: index, field: "approvedBy".into() });
        }
        for expectation_id in &exemption.expectation_ids {
            if !known_ids.contains(expectation_id.as_str()) {
                report.errors.push(PolicyError::UnknownExpectation {
                    exemption_index: index,
                    expectation_id: expectation_id.clone(),
                });
            }
        }
        if exemption.expires_at <= now {
            report
                .warnings
                .push(format!("exemption at index {index} for repo {} has already expired", exemption.repo));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use core::{Classification, ClassificationMatch, Exemption, ExpectationCategory, PermissionLevel, PolicyExpectation, Requirement};

    fn sample_manifest() -> OrgPolicyManifest {
        OrgPolicyManifest {
            schema_version: "1.0.0".into(),
            org_id: "acme".into(),
            updated_at: chrono::Utc::now(),
            approved_by: "admin@acme.test".into(),
            defaults: vec![PolicyExpectation {
                id: "perm-read".into(),
                name: "default permission is read".into(),
                category: ExpectationCategory::Permissions,
                severity: core::Severity::High,
                requirement: Requirement::Permissions { max_default_permission: PermissionLevel::Read },
            }],
            classifications: vec![Classification {
                name: "critical".into(),
                description: "critical repos".into(),
                match_: ClassificationMatch::default(),
                expectations: vec![],
            }],
            exemptions: vec![],
            merge_queue: None,
        }
    }

    #[test]
    fn valid_manifest_has_no_errors() {
        let report = validate(&sample_manifest());
        assert!(report.is_valid());
    }

    #[test]
    fn exemption_on_unknown_expectation_is_an_error() {
        let mut manifest = sample_manifest();
        manifest.exemptions.push(Exemption {
            repo: "docs-site".into(),
            expectation_ids: vec!["nonexistent".into()],
            reason: "legacy repo".into(),
            approved_by: "admin@acme.test".into(),
            expires_at: chrono::Utc::now() + Duration::days(90),
            ticket: None,
        });
        let report = validate(&manifest);
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| matches!(e, PolicyError::UnknownExpectation { .. })));
    }

    #[test]
    fn expired_exemption_is_a_warning_not_an_error() {
        let mut manifest = sample_manifest();
        manifest.exemptions.push(Exemption {
            repo: "docs-site".into(),
            expectation_ids: vec!["perm-read".into()],
            reason: "legacy repo".into(),
            approved_by: "admin@acme.test".into(),
            expires_at: chrono::Utc::now() - Duration::days(1),
            ticket: None,
        });
        let report = validate(&manifest);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }
}
