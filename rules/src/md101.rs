//! MD-101 "Cross-Repo Protection Gap": resolves policy expectations per
//! repo and diffs them against observed state (`spec.md` §4.2, §4.3).
//! Only runs when an `OrgContext` is present.

use crate::registry::Rule;
use core::{Evidence, Finding, OrgContext, RuleContext, Severity};
use errors::RuleError;
use policy::{detect_gaps, resolve_for_repo, Gap};

pub struct CrossRepoProtectionGap;

impl Rule for CrossRepoProtectionGap {
    fn evaluate(&self, ctx: &RuleContext) -> Result<Vec<Finding>, RuleError> {
        let Some(org) = &ctx.org_context else {
            return Ok(Vec::new());
        };
        Ok(evaluate_org(org))
    }
}

#[must_use]
pub fn evaluate_org(org: &OrgContext) -> Vec<Finding> {
    let now = chrono::Utc::now();
    let mut findings = Vec::new();
    for repo in org.non_archived_repos() {
        let resolved = resolve_for_repo(&org.manifest, &repo.full_name, &repo.meta, now);
        let gaps = detect_gaps(repo, &resolved.expectations);
        for gap in gaps {
            findings.push(gap_finding(&repo.full_name, &gap));
        }

        for exemption in &org.manifest.exemptions {
            if exemption.repo == repo.full_name && !exemption.is_active(now) {
                findings.push(expired_exemption_finding(&repo.full_name, exemption));
            }
        }
    }
    findings
}

fn gap_severity(gap: &Gap, declared: Severity) -> Severity {
    match (gap, declared) {
        (Gap::Missing { .. }, Severity::Critical) => Severity::Block,
        (Gap::Partial { .. }, Severity::High) => Severity::Warn,
        (_, Severity::Low) => Severity::Low,
        _ => Severity::Medium,
    }
}

fn gap_finding(repo_full_name: &str, gap: &Gap) -> Finding {
    let declared_severity = match gap {
        Gap::Missing { severity, .. } | Gap::Partial { severity, .. } | Gap::Exceeds { severity, .. } => *severity,
    };
    let (title, description) = match gap {
        Gap::Missing { expectation_id, .. } => (
            format!("{repo_full_name} is missing required policy \"{expectation_id}\""),
            "Observed state has no value at all for this expectation.".to_string(),
        ),
        Gap::Partial { expectation_id, weakened_fields, .. } => (
            format!("{repo_full_name} only partially satisfies policy \"{expectation_id}\""),
            format!("Weakened fields: {}.", weakened_fields.join(", ")),
        ),
        Gap::Exceeds { expectation_id, observed, max_allowed, .. } => (
            format!("{repo_full_name} exceeds the allowed permission for policy \"{expectation_id}\""),
            format!("Observed {observed:?} exceeds max allowed {max_allowed:?}."),
        ),
    };
    Finding {
        id: utils::compute_content_hash(&format!("MD-101|{repo_full_name}|{}|{title}", gap.expectation_id())),
        rule_id: "MD-101".to_string(),
        rule_name: "Cross-Repo Protection Gap".to_string(),
        severity: gap_severity(gap, declared_severity),
        title,
        description,
        remediation: "Bring the repository's governance settings in line with the organization policy manifest.".to_string(),
        evidence: vec![Evidence { path: repo_full_name.to_string(), line: None, context: Default::default() }],
        adr_references: vec!["ADR-009".to_string()],
    }
}

fn expired_exemption_finding(repo_full_name: &str, exemption: &core::Exemption) -> Finding {
    Finding {
        id: utils::compute_content_hash(&format!(
            "MD-101|exemption-expired|{repo_full_name}|{}",
            exemption.expectation_ids.join(",")
        )),
        rule_id: "MD-101".to_string(),
        rule_name: "Cross-Repo Protection Gap".to_string(),
        severity: Severity::Medium,
        title: format!("exemption expired for {repo_full_name}"),
        description: format!(
            "Exemption covering {:?} (approved by {}) expired at {}.",
            exemption.expectation_ids, exemption.approved_by, exemption.expires_at
        ),
        remediation: "Renew the exemption or bring the repository into compliance.".to_string(),
        evidence: vec![Evidence { path: repo_full_name.to_string(), line: None, context: Default::default() }],
        adr_references: vec!["ADR-009".to_string()],
    }
}
