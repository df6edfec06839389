//! `RuleDescriptor`: immutable metadata registered once per rule.

use crate::ids::RuleId;
use crate::enums::Severity;
use serde::{Deserialize, Serialize};

/// Tier of a rule. Tier B rules require a paid license feature
/// (`spec.md` glossary: "Tier B rule").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    A,
    B,
}

/// FP-tolerance envelope a rule is held to before it can be promoted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FpTolerance {
    /// Maximum acceptable false-positive rate, in `[0, 1]`.
    pub ceiling: f64,
    /// Size of the rolling window (event count) the ceiling is measured over.
    pub window_size: u32,
}

/// Criteria that must hold before a rule is promoted from experimental to
/// generally-enforced status. Left opaque (free-form text) here: the
/// promotion *process* is an operator workflow outside this core, only the
/// fact that a rule carries promotion criteria is part of the data model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromotionCriteria {
    pub description: String,
    pub min_clean_runs: u32,
}

/// Immutable metadata for a registered rule. `RuleRegistry::register` in
/// the `rules` crate takes ownership of one of these per rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDescriptor {
    pub id: RuleId,
    /// Semver string, e.g. "1.0.0".
    pub version: String,
    pub tier: Tier,
    pub severity: Severity,
    pub category: String,
    pub fp_tolerance: FpTolerance,
    pub promotion_criteria: PromotionCriteria,
    pub adr_references: Vec<String>,
    /// Required license feature name for Tier B rules. `None` for Tier A.
    pub required_license_feature: Option<String>,
    /// Rule-level strict flag: when present, overrides mode-level
    /// strictness for this rule's severity-ladder mapping
    /// (`SPEC_FULL.md` Open Question 3).
    pub strict: Option<bool>,
}

impl RuleDescriptor {
    #[must_use]
    pub fn requires_license(&self) -> bool {
        matches!(self.tier, Tier::B)
    }
}
