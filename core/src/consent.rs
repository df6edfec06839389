//! `ConsentRecord`: per-org, per-scope consent for contributing FP data or
//! having governance state scanned.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub org_id_hash: String,
    pub repo_id: Option<String>,
    pub scope: String,
    /// Hashed identity of the grantor — never the raw identity.
    pub granted_by: String,
    pub granted_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub revoked: bool,
}

impl ConsentRecord {
    #[must_use]
    pub fn is_valid(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        !self.revoked && self.expires_at.is_none_or(|exp| exp > now)
    }
}
