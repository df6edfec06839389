//! `OrganizationIdentity` and `NonceBinding`: the trust module's core
//! entities (`spec.md` §3, §4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    GithubOrg,
    StripeCustomer,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationIdentity {
    pub org_id: String,
    /// Hex-encoded public key, at least 32 characters.
    pub public_key: String,
    pub verification_method: VerificationMethod,
    pub verified_at: chrono::DateTime<chrono::Utc>,
    pub bound_nonce: Option<String>,
    pub github_org_id: Option<String>,
}

/// Cryptographic association between a verified org and a single unique
/// secret string (`spec.md` glossary: "Nonce binding").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceBinding {
    /// 32-byte nonce, hex-encoded.
    pub nonce: String,
    pub org_id: String,
    pub public_key: String,
    /// `SHA256(nonce + ":" + orgId + ":" + publicKey)`.
    pub signature: String,
    pub bound_at: chrono::DateTime<chrono::Utc>,
    pub revoked: bool,
    pub revocation_reason: Option<String>,
    pub revoked_at: Option<chrono::DateTime<chrono::Utc>>,
    pub previous_nonce: Option<String>,
    pub usage_count: u64,
    /// Monotonic generation counter used to linearize rotation
    /// (compare-and-set) per `spec.md` §5.
    pub generation: u64,
}

impl NonceBinding {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.revoked
    }
}
