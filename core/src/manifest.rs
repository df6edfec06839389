//! `OrgPolicyManifest` and `PolicyExpectation`: the organization-wide policy
//! source the policy resolver compiles into per-repo expectations.

use serde::{Deserialize, Serialize};

/// Which category a `PolicyExpectation` belongs to; selects the
/// `requirement` tagged variant (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpectationCategory {
    BranchProtection,
    StatusChecks,
    WorkflowPresence,
    Permissions,
    Codeowners,
}

/// Repository default-permission ordinal (`spec.md` §4.3 DetectGaps:
/// "compare ordinal {read<write<admin}").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

/// The tagged-variant requirement a `PolicyExpectation` expresses, one
/// shape per `ExpectationCategory` (`spec.md` §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    BranchProtection {
        required_approving_review_count: u32,
        require_code_owner_reviews: bool,
        enforce_admins: bool,
    },
    StatusChecks {
        required_contexts: Vec<String>,
    },
    WorkflowPresence {
        path: String,
    },
    Permissions {
        max_default_permission: PermissionLevel,
    },
    Codeowners {
        required_paths: Vec<String>,
    },
}

/// One atomic policy requirement (`spec.md` glossary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyExpectation {
    pub id: String,
    pub name: String,
    pub category: ExpectationCategory,
    pub severity: crate::enums::Severity,
    pub requirement: Requirement,
}

/// Matcher selecting which repos a classification applies to
/// (`spec.md` §4.3 MatchesRepo).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationMatch {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub repos: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub name: String,
    pub description: String,
    #[serde(rename = "match")]
    pub match_: ClassificationMatch,
    pub expectations: Vec<PolicyExpectation>,
}

/// A time-bounded, attributed waiver of one or more expectations for a
/// named repository (`spec.md` glossary: "Exemption").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exemption {
    pub repo: String,
    pub expectation_ids: Vec<String>,
    pub reason: String,
    pub approved_by: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub ticket: Option<String>,
}

impl Exemption {
    #[must_use]
    pub fn is_active(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.expires_at > now
    }

    #[must_use]
    pub fn covers(&self, expectation_id: &str) -> bool {
        self.expectation_ids.iter().any(|id| id == expectation_id)
    }
}

/// Org-wide merge-queue defaults carried by the manifest, consumed by
/// MD-102-federated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMergeQueue {
    #[serde(default)]
    pub required_for_default_branch: bool,
}

/// Organization-wide policy source (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgPolicyManifest {
    pub schema_version: String,
    pub org_id: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub approved_by: String,
    pub defaults: Vec<PolicyExpectation>,
    pub classifications: Vec<Classification>,
    pub exemptions: Vec<Exemption>,
    pub merge_queue: Option<ManifestMergeQueue>,
}

impl OrgPolicyManifest {
    /// All expectations declared anywhere in the manifest (defaults plus
    /// every classification's own list), used to check that exemptions
    /// reference something real.
    pub fn all_expectation_ids(&self) -> impl Iterator<Item = &str> {
        self.defaults
            .iter()
            .map(|e| e.id.as_str())
            .chain(
                self.classifications
                    .iter()
                    .flat_map(|c| c.expectations.iter().map(|e| e.id.as_str())),
            )
    }
}
