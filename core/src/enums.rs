//! Enumerations shared across the oracle: invocation mode, gate outcome,
//! and finding severity. `Display`/`FromStr` follow the teacher's
//! `ApprovalMode`/`GovernanceTemplate` pattern in `storage/governance.rs`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The mode an `Oracle::Evaluate` call runs under (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    PullRequest,
    MergeGroup,
    Schedule,
    Calibration,
    Drift,
}

impl Mode {
    /// `merge_group` runs in strict mode per `spec.md` §4.1.
    #[must_use]
    pub fn is_strict_by_default(self) -> bool {
        matches!(self, Mode::MergeGroup)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::PullRequest => "pull_request",
            Mode::MergeGroup => "merge_group",
            Mode::Schedule => "schedule",
            Mode::Calibration => "calibration",
            Mode::Drift => "drift",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pull_request" => Ok(Mode::PullRequest),
            "merge_group" => Ok(Mode::MergeGroup),
            "schedule" => Ok(Mode::Schedule),
            "calibration" => Ok(Mode::Calibration),
            "drift" => Ok(Mode::Drift),
            other => Err(format!("invalid mode: {other}")),
        }
    }
}

/// Gate outcome of a `DissonanceReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Allow,
    Warn,
    Block,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Allow => "ALLOW",
            Outcome::Warn => "WARN",
            Outcome::Block => "BLOCK",
        };
        write!(f, "{s}")
    }
}

impl Outcome {
    /// Worst-of combinator: BLOCK > WARN > ALLOW, used to fold per-finding
    /// contributions into a single report outcome.
    #[must_use]
    pub fn worse_of(self, other: Outcome) -> Outcome {
        self.max(other)
    }
}

/// Finding severity, per `spec.md` §3. `Low`/`Medium` are annotation-only;
/// `High`/`Critical` map to WARN/BLOCK depending on mode and thresholds;
/// `Block`/`Warn`/`Allow` are the rare cases where a rule names the gate
/// contribution directly (e.g. MD-101's `missing + critical -> block`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Block,
    Warn,
    Allow,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Block => "block",
            Severity::Warn => "warn",
            Severity::Allow => "allow",
        };
        write!(f, "{s}")
    }
}
