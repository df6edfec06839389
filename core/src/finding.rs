//! `Finding`: a single issue produced by a rule.

use crate::enums::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One piece of evidence backing a finding. Paths are always repo-relative
/// (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub path: String,
    pub line: Option<u32>,
    #[serde(default)]
    pub context: HashMap<String, String>,
}

/// A single issue produced by a rule (`spec.md` glossary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Stable identifier derived from the finding's rule and evidence, so
    /// the same underlying issue carries the same id across runs (the FP
    /// store's `isFalsePositive(findingId)` lookup depends on this).
    pub id: String,
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub remediation: String,
    pub evidence: Vec<Evidence>,
    pub adr_references: Vec<String>,
}

impl Finding {
    /// Builds the synthetic `ruleId = "SYSTEM"` finding the engine emits
    /// whenever a rule errors out or the secret store is unavailable
    /// (`spec.md` §7: "the report always lists every finding that
    /// contributed, even synthetic ones").
    #[must_use]
    pub fn synthetic(severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            rule_id: "SYSTEM".to_string(),
            rule_name: "system".to_string(),
            severity,
            title: title.into(),
            description: description.into(),
            remediation: String::new(),
            evidence: Vec::new(),
            adr_references: Vec::new(),
        }
    }
}
