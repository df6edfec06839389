//! Observed per-repository governance state, as produced by the
//! governance-state aggregator and consumed by the policy resolver.

use crate::context::{BranchProtectionState, WorkflowRef};
use crate::manifest::{OrgPolicyManifest, PermissionLevel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMeta {
    pub topics: Vec<String>,
    pub language: Option<String>,
    pub visibility: String,
    pub archived: bool,
    pub default_branch: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeownersState {
    pub exists: bool,
    pub covered_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMergeQueueState {
    pub enabled: bool,
}

/// Per-repository governance snapshot (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoGovernanceState {
    pub full_name: String,
    pub meta: RepoMeta,
    pub branch_protection: Option<BranchProtectionState>,
    pub workflows: Vec<WorkflowRef>,
    pub default_permissions: PermissionLevel,
    pub codeowners: CodeownersState,
    pub scanned_at: chrono::DateTime<chrono::Utc>,
    pub merge_queue: Option<RepoMergeQueueState>,
}

impl RepoGovernanceState {
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.meta.tags.iter().any(|t| t == "critical")
    }
}

/// The aggregated state of one organization's repositories together with
/// its policy manifest (`spec.md` glossary: "OrgContext"). Built once per
/// scheduled org-wide run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgContext {
    pub manifest: OrgPolicyManifest,
    pub repos: Vec<RepoGovernanceState>,
}

impl OrgContext {
    pub fn non_archived_repos(&self) -> impl Iterator<Item = &RepoGovernanceState> {
        self.repos.iter().filter(|r| !r.meta.archived)
    }
}
