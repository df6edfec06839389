//! `RuleContext` and its constituent observed-state types.

use crate::enums::Mode;
use crate::governance_state::OrgContext;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// License tier + enabled features + expiry, as seen by the engine's
/// Tier-B gating check (`spec.md` §4.1 step 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub tier: LicenseTier,
    pub features: Vec<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    Free,
    Pro,
}

impl LicenseInfo {
    #[must_use]
    pub fn is_pro_valid(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.tier == LicenseTier::Pro && self.expires_at.is_none_or(|exp| exp > now)
    }

    #[must_use]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// Required pull-request review settings as observed on a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredPullRequestReviews {
    pub required_approving_review_count: u32,
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
}

/// `required_status_checks` as mapped from the upstream REST shape in
/// `spec.md` §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredStatusChecks {
    pub strict: bool,
    pub contexts: Vec<String>,
}

/// Observed branch protection for one repository's default branch. `None`
/// at the `RepoGovernanceState` level means branch protection is entirely
/// absent (`spec.md` §4.3 DetectGaps: "observed null -> missing").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchProtectionState {
    pub required_pull_request_reviews: Option<RequiredPullRequestReviews>,
    pub enforce_admins: bool,
    pub required_status_checks: Option<RequiredStatusChecks>,
}

/// Org-level merge-queue policy (`spec.md` §4.2, MD-102).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeQueuePolicy {
    pub required_for_default_branch: bool,
    pub allow_bypass_for_admins: bool,
    pub require_linear_history: bool,
    pub allow_direct_pushes: bool,
    pub required_status_checks: Vec<String>,
}

/// One workflow file as observed: its repo-relative path and the job names
/// it declares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRef {
    pub path: String,
    pub job_names: Vec<String>,
}

/// Per-invocation, read-only context a rule is evaluated against.
/// Owned by a single `Oracle::Evaluate` call and dropped once the report is
/// returned (`spec.md` §3 ownership note).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleContext {
    pub license: LicenseInfo,
    /// Repo-relative path -> file content, as the engine loaded it.
    pub files: HashMap<String, String>,
    pub repo_owner: String,
    pub repo_name: String,
    pub mode: Mode,
    pub org_context: Option<OrgContext>,
    pub branch_protection: Option<BranchProtectionState>,
    pub merge_queue_policy: Option<MergeQueuePolicy>,
    pub workflow_jobs: Option<Vec<WorkflowRef>>,
    /// Rule ids explicitly requested by the caller (as opposed to resolved
    /// by mode). Needed to implement the Tier-B gating rule in `spec.md`
    /// §4.1 step 1, which distinguishes "explicitly requested" from
    /// "resolved for mode" — see `SPEC_FULL.md` §3.
    pub requested_rule_ids: Option<Vec<String>>,
}

impl RuleContext {
    #[must_use]
    pub fn repo_full_name(&self) -> String {
        format!("{}/{}", self.repo_owner, self.repo_name)
    }

    #[must_use]
    pub fn was_explicitly_requested(&self, rule_id: &str) -> bool {
        self.requested_rule_ids
            .as_ref()
            .is_some_and(|ids| ids.iter().any(|id| id == rule_id))
    }
}
