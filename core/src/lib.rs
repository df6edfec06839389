//! # Governance Oracle Core Types
//!
//! Shared data model and small traits for the policy-enforcement and trust
//! core of the governance oracle: the entities of `spec.md` §3, the
//! `Mode`/`Outcome`/`Severity` enumerations, and the structural
//! secret-redaction seam every logging call site goes through.

pub mod consent;
pub mod context;
pub mod enums;
pub mod finding;
pub mod fp_event;
pub mod governance_state;
pub mod identity;
pub mod ids;
pub mod manifest;
pub mod nonce_config;
pub mod redacted_log;
pub mod report;
pub mod reputation;
pub mod rule;
pub mod traits;

pub use consent::ConsentRecord;
pub use context::{
    BranchProtectionState, LicenseInfo, LicenseTier, MergeQueuePolicy,
    RequiredPullRequestReviews, RequiredStatusChecks, RuleContext, WorkflowRef,
};
pub use enums::{Mode, Outcome, Severity};
pub use finding::{Evidence, Finding};
pub use fp_event::FpEvent;
pub use governance_state::{
    CodeownersState, OrgContext, RepoGovernanceState, RepoMergeQueueState, RepoMeta,
};
pub use identity::{NonceBinding, OrganizationIdentity, VerificationMethod};
pub use ids::{ExpectationId, OrgId, RepoId, RuleId};
pub use manifest::{
    Classification, ClassificationMatch, Exemption, ExpectationCategory, ManifestMergeQueue,
    OrgPolicyManifest, PermissionLevel, PolicyExpectation, Requirement,
};
pub use nonce_config::NonceConfig;
pub use redacted_log::LogSafe;
pub use report::{DissonanceReport, ThresholdsSnapshot, SCHEMA_SHA256, SCHEMA_VERSION};
pub use reputation::{ContributionRecord, OrganizationReputation, StakePledge, StakeStatus};
pub use rule::{FpTolerance, PromotionCriteria, RuleDescriptor, Tier};
pub use traits::{HealthCheck, HealthStatus};
