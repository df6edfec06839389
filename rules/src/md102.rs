//! MD-102 / MD-102-federated "Merge Queue Trust Chain Break" (`spec.md`
//! §4.2): compares observed branch protection against the declared merge
//! queue policy, flags orphaned required status checks, and (federated)
//! flags critical repos with no merge queue at all.

use crate::registry::Rule;
use core::{Evidence, Finding, MergeQueuePolicy, OrgContext, RuleContext, Severity};
use errors::RuleError;

pub struct MergeQueueTrustChainBreak;

impl Rule for MergeQueueTrustChainBreak {
    fn evaluate(&self, ctx: &RuleContext) -> Result<Vec<Finding>, RuleError> {
        let Some(policy) = &ctx.merge_queue_policy else {
            return Ok(Vec::new());
        };
        let mut findings = property_violations(&ctx.repo_full_name(), policy, ctx);
        findings.extend(orphaned_status_checks(&ctx.repo_full_name(), policy, ctx));
        Ok(findings)
    }
}

fn property_violations(repo_full_name: &str, policy: &MergeQueuePolicy, ctx: &RuleContext) -> Vec<Finding> {
    let mut findings = Vec::new();
    let bp = ctx.branch_protection.as_ref();

    if policy.required_for_default_branch && bp.is_none() {
        findings.push(violation(repo_full_name, "requiredForDefaultBranch", "default branch has no branch protection at all"));
    }
    if !policy.allow_bypass_for_admins {
        let admins_enforced = bp.is_some_and(|b| b.enforce_admins);
        if !admins_enforced {
            findings.push(violation(repo_full_name, "allowBypassForAdmins", "admins can bypass required checks"));
        }
    }
    if policy.require_linear_history {
        let strict_checks = bp
            .and_then(|b| b.required_status_checks.as_ref())
            .is_some_and(|sc| sc.strict);
        if !strict_checks {
            findings.push(violation(repo_full_name, "requireLinearHistory", "required status checks are not strict, so merges can land out of order"));
        }
    }
    if !policy.allow_direct_pushes {
        let reviews_required = bp.is_some_and(|b| b.required_pull_request_reviews.is_some());
        if !reviews_required {
            findings.push(violation(repo_full_name, "allowDirectPushes", "no required pull request reviews, so direct pushes to the default branch are possible"));
        }
    }
    findings
}

fn orphaned_status_checks(repo_full_name: &str, policy: &MergeQueuePolicy, ctx: &RuleContext) -> Vec<Finding> {
    let Some(jobs) = &ctx.workflow_jobs else { return Vec::new() };
    let provided: Vec<&str> = jobs.iter().flat_map(|w| w.job_names.iter().map(String::as_str)).collect();
    policy
        .required_status_checks
        .iter()
        .filter(|context| !provided.contains(&context.as_str()))
        .map(|context| violation(repo_full_name, "orphaned-required-status-check", &format!("no workflow job provides the \"{context}\" check")))
        .collect()
}

fn violation(repo_full_name: &str, check: &str, description: &str) -> Finding {
    Finding {
        id: utils::compute_content_hash(&format!("MD-102|{repo_full_name}|{check}")),
        rule_id: "MD-102".to_string(),
        rule_name: "Merge Queue Trust Chain Break".to_string(),
        severity: Severity::Critical,
        title: format!("{repo_full_name}: merge queue trust chain violation ({check})"),
        description: description.to_string(),
        remediation: "Align the repository's branch protection with the organization's merge queue policy.".to_string(),
        evidence: vec![Evidence { path: repo_full_name.to_string(), line: None, context: Default::default() }],
        adr_references: vec!["ADR-021".to_string()],
    }
}

/// Runs over every non-archived repo in `org`. Unlike the per-repo variant
/// it only has `RepoGovernanceState`'s observed fields and the manifest's
/// org-wide `mergeQueue` default, so it checks branch-protection presence
/// and flags critical repos without a merge queue at all, rather than the
/// full property diff the per-repo rule runs.
#[must_use]
pub fn evaluate_federated(org: &OrgContext) -> Vec<Finding> {
    let required_for_default_branch = org.manifest.merge_queue.as_ref().is_some_and(|mq| mq.required_for_default_branch);
    let mut findings = Vec::new();
    for repo in org.non_archived_repos() {
        if required_for_default_branch && repo.branch_protection.is_none() {
            findings.push(violation(&repo.full_name, "requiredForDefaultBranch", "default branch has no branch protection at all"));
        }
        let has_queue = repo.merge_queue.as_ref().is_some_and(|mq| mq.enabled);
        if repo.is_critical() && !has_queue {
            findings.push(Finding {
                id: utils::compute_content_hash(&format!("MD-102|federated-critical-no-queue|{}", repo.full_name)),
                rule_id: "MD-102".to_string(),
                rule_name: "Merge Queue Trust Chain Break".to_string(),
                severity: Severity::Critical,
                title: format!("{}: critical repository has no merge queue", repo.full_name),
                description: "Repository is tagged critical but has no merge queue configured.".to_string(),
                remediation: "Enable a merge queue for this repository's default branch.".to_string(),
                evidence: vec![Evidence {
                    path: repo.full_name.clone(),
                    line: None,
                    context: [("check".to_string(), "federated-critical-no-queue".to_string())].into(),
                }],
                adr_references: vec!["ADR-021".to_string()],
            });
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::{
        BranchProtectionState, CodeownersState, LicenseInfo, LicenseTier, Mode, OrgPolicyManifest, PermissionLevel,
        RepoGovernanceState, RepoMergeQueueState, RepoMeta, RequiredPullRequestReviews, RequiredStatusChecks,
    };
    use std::collections::HashMap;

    fn policy() -> MergeQueuePolicy {
        MergeQueuePolicy {
            required_for_default_branch: true,
            allow_bypass_for_admins: false,
            require_linear_history: true,
            allow_direct_pushes: false,
            required_status_checks: vec!["oracle".into()],
        }
    }

    fn base_ctx() -> RuleContext {
        RuleContext {
            license: LicenseInfo { tier: LicenseTier::Free, features: vec!["merge-queue-trust-chain".into()], expires_at: None },
            files: HashMap::new(),
            repo_owner: "acme".into(),
            repo_name: "payment-gateway".into(),
            mode: Mode::Schedule,
            org_context: None,
            branch_protection: None,
            merge_queue_policy: Some(policy()),
            workflow_jobs: None,
            requested_rule_ids: None,
        }
    }

    #[test]
    fn no_branch_protection_violates_every_property() {
        let findings = MergeQueueTrustChainBreak.evaluate(&base_ctx()).unwrap();
        assert!(findings.len() >= 3);
    }

    #[test]
    fn fully_compliant_branch_protection_has_no_property_violations() {
        let mut ctx = base_ctx();
        ctx.branch_protection = Some(BranchProtectionState {
            required_pull_request_reviews: Some(RequiredPullRequestReviews {
                required_approving_review_count: 2,
                dismiss_stale_reviews: true,
                require_code_owner_reviews: true,
            }),
            enforce_admins: true,
            required_status_checks: Some(RequiredStatusChecks { strict: true, contexts: vec!["oracle".into()] }),
        });
        let findings = MergeQueueTrustChainBreak.evaluate(&ctx).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn federated_flags_critical_repo_without_merge_queue() {
        let manifest = OrgPolicyManifest {
            schema_version: "1.0.0".into(),
            org_id: "acme".into(),
            updated_at: chrono::Utc::now(),
            approved_by: "admin".into(),
            defaults: vec![],
            classifications: vec![],
            exemptions: vec![],
            merge_queue: Some(core::ManifestMergeQueue { required_for_default_branch: true }),
        };
        let repo = RepoGovernanceState {
            full_name: "acme/payment-gateway".into(),
            meta: RepoMeta {
                topics: vec![],
                language: None,
                visibility: "private".into(),
                archived: false,
                default_branch: "main".into(),
                tags: vec!["critical".into()],
            },
            branch_protection: Some(BranchProtectionState {
                required_pull_request_reviews: None,
                enforce_admins: false,
                required_status_checks: None,
            }),
            workflows: vec![],
            default_permissions: PermissionLevel::Read,
            codeowners: CodeownersState { exists: false, covered_paths: vec![] },
            scanned_at: chrono::Utc::now(),
            merge_queue: None,
        };
        let org = OrgContext { manifest, repos: vec![repo] };
        let findings = evaluate_federated(&org);
        let critical_finding = findings
            .iter()
            .find(|f| f.evidence.iter().any(|e| e.context.get("check").map(String::as_str) == Some("federated-critical-no-queue")))
            .unwrap();
        assert_eq!(critical_finding.severity, Severity::Critical);
        assert_eq!(critical_finding.rule_id, "MD-102");
    }
}
