//! # Governance Oracle Errors
//!
//! Typed error taxonomy for the oracle evaluation engine, the policy
//! resolver, FP calibration, and the identity/nonce/redaction trust module.
//!
//! Kinds, not type names: every subsystem gets its own enum so a caller can
//! match on exactly the failures that subsystem can produce, and every
//! variant carries named fields rather than positional ones.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from the storage adapter layer (`FPStore`, `ConsentStore`,
/// `BlockCounter`, `SecretStore`, `ObjectStore`, `IdentityStore`,
/// `ReputationStore`).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("read from {backend} failed: {reason}")]
    AdapterRead { backend: String, reason: String },

    #[error("write to {backend} failed: {reason}")]
    AdapterWrite { backend: String, reason: String },

    #[error("conflicting write on {backend} for key {key}")]
    AdapterConflict { backend: String, key: String },

    #[error("{backend} entry not found: {key}")]
    NotFound { backend: String, key: String },

    #[error("operation on {backend} timed out after {elapsed_ms}ms")]
    Timeout { backend: String, elapsed_ms: u64 },

    #[error("operation canceled: {reason}")]
    Canceled { reason: String },

    #[error("serialization error on {backend}: {reason}")]
    Serialization { backend: String, reason: String },
}

impl StorageError {
    /// `AdapterConflict` on a duplicate-event insert is an expected,
    /// swallow-able outcome per `spec.md` §7 ("conflict is expected on
    /// duplicate-event insert and is swallowed with a typed duplicate
    /// result").
    #[must_use]
    pub fn is_duplicate_conflict(&self) -> bool {
        matches!(self, StorageError::AdapterConflict { .. })
    }
}

/// Errors from the secret store and nonce loader.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("no nonce available from secret store")]
    SecretUnavailable,

    #[error("secret value malformed: {reason}")]
    MalformedSecret { reason: String },

    #[error("nonce rotation failed: {reason}")]
    RotationFailed { reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from the identity / nonce-binding / redaction trust module.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("public key malformed: {reason}")]
    InvalidPublicKey { reason: String },

    #[error("an active nonce binding already exists for org {org_id}")]
    AlreadyBound { org_id: String },

    #[error("no nonce binding exists for org {org_id}")]
    NoBinding { org_id: String },

    #[error("nonce binding for org {org_id} is revoked")]
    Revoked { org_id: String },

    #[error("cannot rotate a revoked binding for org {org_id}")]
    RotationOfRevoked { org_id: String },

    #[error("organization {org_id} identity is not verified")]
    IdentityNotVerified { org_id: String },

    #[error("rotation chain for org {org_id} exceeded depth {max_depth}")]
    ChainTooDeep { org_id: String, max_depth: usize },

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from the cross-repository policy manifest resolver.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("manifest validation failed: {errors:?}")]
    Validation { errors: Vec<String> },

    #[error("exemption {exemption_index} references unknown expectation {expectation_id}")]
    UnknownExpectation {
        exemption_index: usize,
        expectation_id: String,
    },

    #[error("duplicate policy expectation id {expectation_id} in manifest")]
    DuplicateExpectation { expectation_id: String },

    #[error("exemption {exemption_index} has an empty {field}")]
    EmptyExemptionField {
        exemption_index: usize,
        field: String,
    },

    #[error("exemption {exemption_index} expiresAt is not valid ISO8601: {raw}")]
    InvalidExpiresAt { exemption_index: usize, raw: String },

    #[error("glob pattern {pattern} is invalid: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors from FP calibration and the Byzantine filter.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error(
        "fewer than {required} trusted contributors remain for rule {rule_id} (have {actual})"
    )]
    KAnonymity {
        rule_id: String,
        required: usize,
        actual: usize,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors a rule's `evaluate` may return; the engine converts every one of
/// these into a synthetic `warn` finding rather than aborting the run.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule {rule_id} requires license feature {feature} which is not present")]
    LicenseRequired { rule_id: String, feature: String },

    #[error("rule {rule_id} could not parse input: {reason}")]
    MalformedInput { rule_id: String, reason: String },

    #[error("rule {rule_id} panicked or failed unexpectedly: {reason}")]
    Unexpected { rule_id: String, reason: String },
}

/// Errors from external providers (the governance-state aggregator, the
/// identity verification collaborators).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("path not found upstream: {path}")]
    NotFound { path: String },

    #[error("rate limited by provider, retry after {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("upstream provider error: {cause}")]
    Provider { cause: String },

    #[error("operation timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("operation canceled: {reason}")]
    Canceled { reason: String },
}

impl ProviderError {
    #[must_use]
    pub fn retry_after(&self) -> Option<DateTime<Utc>> {
        match self {
            ProviderError::RateLimited { reset_at } => Some(*reset_at),
            _ => None,
        }
    }
}

/// Top-level error the oracle evaluation engine can surface. A malformed
/// manifest or public key becomes a single high-severity finding rather
/// than this error reaching the caller, except for the fail-closed cases
/// enumerated in `spec.md` §4.1 (secret store unavailable outside dry-run).
#[derive(Debug, Error)]
pub enum OracleError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Trust(#[from] TrustError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("operation timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("operation canceled: {reason}")]
    Canceled { reason: String },
}

impl OracleError {
    /// Whether this failure mode should cause the engine to fail closed
    /// (BLOCK with a synthetic finding) rather than propagate, per
    /// `spec.md` §4.1 / §7.
    #[must_use]
    pub fn fails_closed(&self) -> bool {
        matches!(
            self,
            OracleError::Secret(SecretError::SecretUnavailable)
                | OracleError::Secret(SecretError::MalformedSecret { .. })
                | OracleError::Secret(SecretError::RotationFailed { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_conflict_is_recognized() {
        let err = StorageError::AdapterConflict {
            backend: "fp-store".into(),
            key: "rule#MD-100".into(),
        };
        assert!(err.is_duplicate_conflict());
    }

    #[test]
    fn secret_unavailable_fails_closed() {
        let err = OracleError::Secret(SecretError::SecretUnavailable);
        assert!(err.fails_closed());
        let err = OracleError::Timeout { elapsed_ms: 10 };
        assert!(!err.fails_closed());
    }

    #[test]
    fn rate_limited_retry_after() {
        let reset = Utc::now();
        let err = ProviderError::RateLimited { reset_at: reset };
        assert_eq!(err.retry_after(), Some(reset));
    }
}
