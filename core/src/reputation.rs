//! Reputation, stake, and per-rule contribution records for FP calibration
//! (`spec.md` §3, §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeStatus {
    Active,
    Slashed,
    Withdrawn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationReputation {
    pub org_id: String,
    /// In `[0, 1]`.
    pub reputation_score: f64,
    pub stake_pledge: f64,
    pub contribution_count: u64,
    pub flagged_count: u64,
    /// In `[0, 1]`.
    pub consistency_score: f64,
    /// In `[0, 1]`.
    pub age_score: f64,
    /// In `[0, 1]`.
    pub volume_score: f64,
    pub stake_status: StakeStatus,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl OrganizationReputation {
    /// Applies the slashing state transition: `reputationScore` goes to
    /// zero and `flaggedCount` increments atomically with the stake
    /// transition (`spec.md` §4.4 feedback loop, §3 invariant:
    /// "active->slashed, active->withdrawn; never back to active").
    pub fn slash(&mut self, now: chrono::DateTime<chrono::Utc>) {
        self.stake_status = StakeStatus::Slashed;
        self.reputation_score = 0.0;
        self.flagged_count += 1;
        self.last_updated = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakePledge {
    pub org_id: String,
    pub amount_usd: f64,
    pub pledged_at: chrono::DateTime<chrono::Utc>,
    pub status: StakeStatus,
    pub slash_reason: Option<String>,
}

/// One org's submission for one rule's FP rate, used both as calibration
/// input and as the consistency calculator's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub org_id: String,
    pub rule_id: String,
    pub contributed_fp_rate: f64,
    pub consensus_fp_rate: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_count: u64,
    pub deviation: f64,
    pub consistency_score: f64,
}
