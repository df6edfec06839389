//! Maps the upstream REST DTOs (`dto.rs`) onto the shared governance-state
//! model in `core` (`spec.md` §6).

use crate::dto::{BranchProtectionResponse, RepoResponse};
use core::{BranchProtectionState, PermissionLevel, RepoMeta, RequiredPullRequestReviews, RequiredStatusChecks};

#[must_use]
pub fn map_repo_meta(dto: RepoResponse, tags: Vec<String>) -> RepoMeta {
    RepoMeta {
        topics: dto.topics,
        language: dto.language,
        visibility: dto.visibility.unwrap_or_else(|| "private".to_string()),
        archived: dto.archived,
        default_branch: dto.default_branch,
        tags,
    }
}

#[must_use]
pub fn map_branch_protection(dto: BranchProtectionResponse) -> BranchProtectionState {
    BranchProtectionState {
        required_pull_request_reviews: dto.required_pull_request_reviews.map(|r| RequiredPullRequestReviews {
            required_approving_review_count: r.required_approving_review_count,
            dismiss_stale_reviews: r.dismiss_stale_reviews,
            require_code_owner_reviews: r.require_code_owner_reviews,
        }),
        enforce_admins: dto.enforce_admins.is_some_and(|e| e.enabled),
        required_status_checks: dto.required_status_checks.map(|sc| RequiredStatusChecks {
            strict: sc.strict,
            contexts: sc.contexts,
        }),
    }
}

/// Maps an org's `default_repository_permission` setting (`"read"`,
/// `"write"`, `"admin"`, plus the GitHub-specific `"maintain"`/`"triage"`
/// tiers, which fold onto the nearest ordinal this model has) onto
/// `PermissionLevel`. Unrecognized values fail closed to `Admin` so an
/// upstream API change never silently under-reports exposure.
#[must_use]
pub fn map_default_permission(raw: &str) -> PermissionLevel {
    match raw {
        "read" | "triage" => PermissionLevel::Read,
        "write" | "maintain" => PermissionLevel::Write,
        "admin" => PermissionLevel::Admin,
        _ => PermissionLevel::Admin,
    }
}

/// Extracts just the job names from a workflow file's YAML, for
/// `WorkflowRef.job_names`. Malformed YAML yields an empty list rather than
/// erroring, consistent with MD-100's permissive parse.
#[must_use]
pub fn parse_workflow_job_names(yaml: &str) -> Vec<String> {
    let Ok(doc) = serde_yaml::from_str::<serde_yaml::Value>(yaml) else {
        return Vec::new();
    };
    let Some(jobs) = doc.get("jobs").and_then(serde_yaml::Value::as_mapping) else {
        return Vec::new();
    };
    jobs.keys().filter_map(|k| k.as_str().map(str::to_string)).collect()
}
