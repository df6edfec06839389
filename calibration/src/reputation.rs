//! `ContributionWeight`: combines base reputation, staked capital, and
//! consistency into a single `[0, 1]` weight (`spec.md` §4.4).

use config::ReputationConfig;
use core::{OrganizationReputation, StakePledge};

/// `stakeMultiplier = min(stake / minStake, 1) × stakeCap`. Zero stake
/// yields a zero multiplier.
#[must_use]
pub fn stake_multiplier(stake: Option<&StakePledge>, cfg: &ReputationConfig) -> f64 {
    let amount = stake.map_or(0.0, |s| s.amount_usd);
    (amount / cfg.min_stake_usd).min(1.0) * cfg.stake_cap
}

/// `min(baseReputation + stakeMultiplier + consistencyBonus, 1.0)`. A
/// contributor with no reputation record yields `missing_record_weight`
/// (minimum participation).
#[must_use]
pub fn contribution_weight(
    reputation: Option<&OrganizationReputation>,
    stake: Option<&StakePledge>,
    cfg: &ReputationConfig,
) -> f64 {
    let Some(reputation) = reputation else {
        return cfg.missing_record_weight;
    };
    let multiplier = stake_multiplier(stake, cfg);
    let consistency_bonus = reputation.consistency_score * cfg.consistency_bonus_cap;
    (reputation.reputation_score + multiplier + consistency_bonus).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core::StakeStatus;

    fn reputation(score: f64, consistency: f64) -> OrganizationReputation {
        OrganizationReputation {
            org_id: "org-1".into(),
            reputation_score: score,
            stake_pledge: 0.0,
            contribution_count: 10,
            flagged_count: 0,
            consistency_score: consistency,
            age_score: 0.5,
            volume_score: 0.5,
            stake_status: StakeStatus::Active,
            last_updated: Utc::now(),
        }
    }

    fn stake(amount: f64) -> StakePledge {
        StakePledge {
            org_id: "org-1".into(),
            amount_usd: amount,
            pledged_at: Utc::now(),
            status: StakeStatus::Active,
            slash_reason: None,
        }
    }

    #[test]
    fn missing_record_yields_minimum_participation_weight() {
        let cfg = ReputationConfig::default();
        assert_eq!(contribution_weight(None, None, &cfg), cfg.missing_record_weight);
    }

    #[test]
    fn zero_stake_contributes_no_multiplier() {
        let cfg = ReputationConfig::default();
        assert_eq!(stake_multiplier(None, &cfg), 0.0);
        assert_eq!(stake_multiplier(Some(&stake(0.0)), &cfg), 0.0);
    }

    #[test]
    fn full_stake_saturates_at_stake_cap() {
        let cfg = ReputationConfig::default();
        assert_eq!(stake_multiplier(Some(&stake(5000.0)), &cfg), cfg.stake_cap);
    }

    #[test]
    fn weight_never_exceeds_one() {
        let cfg = ReputationConfig::default();
        let rep = reputation(0.9, 1.0);
        let weight = contribution_weight(Some(&rep), Some(&stake(5000.0)), &cfg);
        assert_eq!(weight, 1.0);
    }

    #[test]
    fn weight_combines_base_stake_and_consistency() {
        let cfg = ReputationConfig::default();
        let rep = reputation(0.3, 0.5);
        let weight = contribution_weight(Some(&rep), Some(&stake(500.0)), &cfg);
        assert_eq!(weight, 0.3 + 0.5 * cfg.stake_cap + 0.5 * cfg.consistency_bonus_cap);
    }
}
