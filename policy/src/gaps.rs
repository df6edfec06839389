//! `DetectGaps`: tagged-variant dispatch comparing observed `RepoGovernanceState`
//! against a resolved set of `PolicyExpectation`s.

use core::{PermissionLevel, PolicyExpectation, RepoGovernanceState, Requirement, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gap {
    Missing {
        expectation_id: String,
        severity: Severity,
    },
    Partial {
        expectation_id: String,
        severity: Severity,
        weakened_fields: Vec<String>,
    },
    Exceeds {
        expectation_id: String,
        severity: Severity,
        observed: PermissionLevel,
        max_allowed: PermissionLevel,
    },
}

impl Gap {
    #[must_use]
    pub fn expectation_id(&self) -> &str {
        match self {
            Gap::Missing { expectation_id, .. }
            | Gap::Partial { expectation_id, .. }
            | Gap::Exceeds { expectation_id, .. } => expectation_id,
        }
    }
}

/// One finding-worthy gap per expectation that the observed state doesn't
/// satisfy. An expectation with no gap is silently compliant.
#[must_use]
pub fn detect_gaps(repo_state: &RepoGovernanceState, expectations: &[&PolicyExpectation]) -> Vec<Gap> {
    expectations
        .iter()
        .filter_map(|expectation| detect_gap_for(repo_state, expectation))
        .collect()
}

fn detect_gap_for(repo_state: &RepoGovernanceState, expectation: &PolicyExpectation) -> Option<Gap> {
    match &expectation.requirement {
        Requirement::BranchProtection {
            required_approving_review_count,
            require_code_owner_reviews,
            enforce_admins,
        } => {
            let Some(observed) = &repo_state.branch_protection else {
                return Some(Gap::Missing { expectation_id: expectation.id.clone(), severity: expectation.severity });
            };
            let mut weakened = Vec::new();
            let observed_reviews = observed.required_pull_request_reviews.as_ref();
            let observed_count = observed_reviews.map(|r| r.required_approving_review_count).unwrap_or(0);
            if observed_count < *required_approving_review_count {
                weakened.push("requiredApprovingReviewCount".to_string());
            }
            let observed_codeowner = observed_reviews.is_some_and(|r| r.require_code_owner_reviews);
            if *require_code_owner_reviews && !observed_codeowner {
                weakened.push("requireCodeOwnerReviews".to_string());
            }
            if *enforce_admins && !observed.enforce_admins {
                weakened.push("enforceAdmins".to_string());
            }
            if weakened.is_empty() {
                None
            } else {
                Some(Gap::Partial { expectation_id: expectation.id.clone(), severity: expectation.severity, weakened_fields: weakened })
            }
        }
        Requirement::StatusChecks { required_contexts } => {
            let observed_contexts: Vec<&str> = repo_state
                .branch_protection
                .as_ref()
                .and_then(|bp| bp.required_status_checks.as_ref())
                .map(|sc| sc.contexts.iter().map(String::as_str).collect())
                .unwrap_or_default();
            let missing: Vec<String> = required_contexts
                .iter()
                .filter(|required| !observed_contexts.contains(&required.as_str()))
                .cloned()
                .collect();
            if missing.is_empty() {
                None
            } else if observed_contexts.is_empty() {
                Some(Gap::Missing { expectation_id: expectation.id.clone(), severity: expectation.severity })
            } else {
                Some(Gap::Partial { expectation_id: expectation.id.clone(), severity: expectation.severity, weakened_fields: missing })
            }
        }
        Requirement::WorkflowPresence { path } => {
            if repo_state.workflows.iter().any(|w| &w.path == path) {
                None
            } else {
                Some(Gap::Missing { expectation_id: expectation.id.clone(), severity: expectation.severity })
            }
        }
        Requirement::Permissions { max_default_permission } => {
            if repo_state.default_permissions > *max_default_permission {
                Some(Gap::Exceeds {
                    expectation_id: expectation.id.clone(),
                    severity: expectation.severity,
                    observed: repo_state.default_permissions,
                    max_allowed: *max_default_permission,
                })
            } else {
                None
            }
        }
        Requirement::Codeowners { required_paths } => {
            if !repo_state.codeowners.exists {
                return Some(Gap::Missing { expectation_id: expectation.id.clone(), severity: expectation.severity });
            }
            let uncovered: Vec<String> = required_paths
                .iter()
                .filter(|required| !repo_state.codeowners.covered_paths.iter().any(|covered| covered.starts_with(required.as_str())))
                .cloned()
                .collect();
            if uncovered.is_empty() {
                None
            } else {
                Some(Gap::Partial { expectation_id: expectation.id.clone(), severity: expectation.severity, weakened_fields: uncovered })
            }
        }
    }
}
