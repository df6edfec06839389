//! `FPEvent`: one operator decision about whether a finding was a false
//! positive, stored by the FP store with a 90-day TTL.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FpEvent {
    pub event_id: String,
    pub rule_id: String,
    pub rule_version: String,
    pub finding_id: String,
    pub outcome: crate::enums::Outcome,
    pub is_false_positive: bool,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub suppression_ticket: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub context: HashMap<String, serde_json::Value>,
    /// Hash of the contributing org's id, for k-anonymity — the raw org id
    /// is never stored alongside an FP event.
    pub org_id_hash: String,
    pub consent_reference: String,
}

impl FpEvent {
    /// Partition key for the key-value realization: `rule#<ruleId>`
    /// (`spec.md` §3).
    #[must_use]
    pub fn partition_key(&self) -> String {
        format!("rule#{}", self.rule_id)
    }

    /// Sort key: `event#<ISO8601>#<eventId>` (`spec.md` §3).
    #[must_use]
    pub fn sort_key(&self) -> String {
        format!("event#{}#{}", self.timestamp.to_rfc3339(), self.event_id)
    }

    /// TTL horizon, default 90 days (`spec.md` §3: "TTL ≈ 90 days"), but
    /// configurable per deployment via `RetentionConfig.fp_event_ttl_days`.
    #[must_use]
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>, ttl_days: i64) -> bool {
        now - self.timestamp > chrono::Duration::days(ttl_days)
    }
}
