//! `AggregateFPsByRule`: turns one rule's population of per-org
//! contribution records into a consensus FP rate, with a confidence
//! annotation and a feedback loop back into reputation (`spec.md` §4.4).

use crate::consistency::compute_consistency;
use crate::filter::{self, RawContribution, Survivor};
use chrono::{DateTime, Utc};
use config::{ByzantineFilterConfig, ConsistencyConfig, ReputationConfig};
use core::ContributionRecord;
use errors::CalibrationError;
use std::collections::HashMap;
use storage::reputation_store::ReputationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Insufficient,
}

#[derive(Debug, Clone)]
pub struct CalibrationResult {
    pub rule_id: String,
    pub consensus_fp_rate: f64,
    pub contributor_count: usize,
    pub trusted_event_count: u64,
    pub confidence: ConfidenceLevel,
}

/// Weighted mean of four factors, weights 0.35/0.30/0.20/0.15
/// (`spec.md` §4.4). Fewer than 3 trusted contributors always forces
/// `Insufficient`.
fn compute_confidence(survivors: &[Survivor]) -> ConfidenceLevel {
    if survivors.len() < 3 {
        return ConfidenceLevel::Insufficient;
    }

    let contributor_factor = (survivors.len() as f64 / 20.0).min(1.0);

    let mean_fp_rate = survivors.iter().map(|s| s.fp_rate).sum::<f64>() / survivors.len() as f64;
    let variance =
        survivors.iter().map(|s| (s.fp_rate - mean_fp_rate).powi(2)).sum::<f64>() / survivors.len() as f64;
    let coefficient_of_variation = if mean_fp_rate > 0.0 { variance.sqrt() / mean_fp_rate } else { 0.0 };
    let stability_factor = (1.0 - coefficient_of_variation).clamp(0.0, 1.0);

    let trusted_events: u64 = survivors.iter().map(|s| s.event_count).sum();
    let volume_factor = (trusted_events as f64 / 1000.0).min(1.0);

    let mean_weight = survivors.iter().map(|s| s.weight).sum::<f64>() / survivors.len() as f64;

    let confidence =
        contributor_factor * 0.35 + stability_factor * 0.30 + volume_factor * 0.20 + mean_weight * 0.15;

    if confidence >= 0.7 {
        ConfidenceLevel::High
    } else if confidence >= 0.5 {
        ConfidenceLevel::Medium
    } else if confidence >= 0.3 {
        ConfidenceLevel::Low
    } else {
        ConfidenceLevel::Insufficient
    }
}

/// Keeps only the most recent contribution per org, so a rule with
/// repeated submissions doesn't let one org vote twice.
fn latest_per_org(records: Vec<ContributionRecord>) -> Vec<ContributionRecord> {
    let mut latest: HashMap<String, ContributionRecord> = HashMap::new();
    for record in records {
        latest
            .entry(record.org_id.clone())
            .and_modify(|existing| {
                if record.timestamp > existing.timestamp {
                    *existing = record.clone();
                }
            })
            .or_insert(record);
    }
    latest.into_values().collect()
}

/// Runs the full Byzantine-filtered aggregation for one rule, then
/// refreshes each participating org's consistency score against the
/// consensus just computed.
pub async fn aggregate_fps_by_rule(
    rule_id: &str,
    store: &dyn ReputationStore,
    byzantine_cfg: &ByzantineFilterConfig,
    reputation_cfg: &ReputationConfig,
    consistency_cfg: &ConsistencyConfig,
    now: DateTime<Utc>,
) -> Result<CalibrationResult, CalibrationError> {
    let contributions = latest_per_org(store.contributions_for_rule(rule_id).await?);

    let mut raw = Vec::with_capacity(contributions.len());
    for record in &contributions {
        let reputation = store.get_reputation(&record.org_id).await?;
        let stake = store.get_stake(&record.org_id).await?;
        raw.push(RawContribution {
            org_id: record.org_id.clone(),
            fp_rate: record.contributed_fp_rate,
            event_count: record.event_count,
            reputation,
            stake,
        });
    }

    let outcome = filter::run(raw, byzantine_cfg, reputation_cfg);
    if outcome.survivors.len() < byzantine_cfg.min_contributors {
        return Err(CalibrationError::KAnonymity {
            rule_id: rule_id.to_string(),
            required: byzantine_cfg.min_contributors,
            actual: outcome.survivors.len(),
        });
    }

    let consensus = filter::weighted_consensus(&outcome.survivors);
    let confidence = compute_confidence(&outcome.survivors);
    let trusted_event_count = outcome.survivors.iter().map(|s| s.event_count).sum();

    for survivor in &outcome.survivors {
        refresh_consistency(&survivor.org_id, rule_id, store, consistency_cfg, reputation_cfg, now).await?;
    }

    Ok(CalibrationResult {
        rule_id: rule_id.to_string(),
        consensus_fp_rate: consensus,
        contributor_count: outcome.survivors.len(),
        trusted_event_count,
        confidence,
    })
}

/// Refreshes one org's consistency score for `rule_id`, then slashes it if
/// the refreshed score lands below `reputation_cfg.slash_consistency_threshold`
/// — a contributor caught being consistently wrong, not just a one-off
/// outlier (`result.neutral` skips slashing: too few qualifying
/// contributions to conclude bad faith rather than inexperience).
async fn refresh_consistency(
    org_id: &str,
    rule_id: &str,
    store: &dyn ReputationStore,
    cfg: &ConsistencyConfig,
    reputation_cfg: &ReputationConfig,
    now: DateTime<Utc>,
) -> Result<(), CalibrationError> {
    let Some(mut reputation) = store.get_reputation(org_id).await? else {
        return Ok(());
    };
    let history: Vec<ContributionRecord> = store
        .contributions_for_rule(rule_id)
        .await?
        .into_iter()
        .filter(|r| r.org_id == org_id)
        .collect();
    let result = compute_consistency(&history, now, cfg);
    reputation.consistency_score = result.score;
    reputation.last_updated = now;

    if !result.neutral && result.score < reputation_cfg.slash_consistency_threshold {
        store.slash(org_id, now).await?;
        return Ok(());
    }
    store.put_reputation(reputation).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use core::{OrganizationReputation, StakeStatus};
    use storage::reputation_store::LocalReputationStore;

    fn reputation(org_id: &str, score: f64) -> OrganizationReputation {
        OrganizationReputation {
            org_id: org_id.to_string(),
            reputation_score: score,
            stake_pledge: 0.0,
            contribution_count: 10,
            flagged_count: 0,
            consistency_score: 0.5,
            age_score: 0.5,
            volume_score: 0.5,
            stake_status: StakeStatus::Active,
            last_updated: Utc::now(),
        }
    }

    fn contribution(org_id: &str, rule_id: &str, fp_rate: f64, age_days: i64) -> ContributionRecord {
        ContributionRecord {
            org_id: org_id.to_string(),
            rule_id: rule_id.to_string(),
            contributed_fp_rate: fp_rate,
            consensus_fp_rate: 0.1,
            timestamp: Utc::now() - Duration::days(age_days),
            event_count: 20,
            deviation: (fp_rate - 0.1).abs(),
            consistency_score: 0.5,
        }
    }

    #[tokio::test]
    async fn too_few_trusted_contributors_is_a_k_anonymity_error() {
        let store = LocalReputationStore::new();
        store.put_reputation(reputation("org-a", 0.8)).await.unwrap();
        store.record_contribution(contribution("org-a", "MD-100", 0.1, 1)).await.unwrap();

        let result = aggregate_fps_by_rule(
            "MD-100",
            &store,
            &ByzantineFilterConfig::default(),
            &ReputationConfig::default(),
            &ConsistencyConfig::default(),
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(CalibrationError::KAnonymity { .. })));
    }

    #[tokio::test]
    async fn sufficient_contributors_yield_a_consensus_rate() {
        let store = LocalReputationStore::new();
        for (org, rate) in [("org-a", 0.10), ("org-b", 0.11), ("org-c", 0.09)] {
            store.put_reputation(reputation(org, 0.8)).await.unwrap();
            store.record_contribution(contribution(org, "MD-100", rate, 1)).await.unwrap();
        }

        let result = aggregate_fps_by_rule(
            "MD-100",
            &store,
            &ByzantineFilterConfig::default(),
            &ReputationConfig::default(),
            &ConsistencyConfig::default(),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(result.contributor_count, 3);
        assert!((result.consensus_fp_rate - 0.10).abs() < 0.02);
    }

    #[tokio::test]
    async fn an_org_consistently_far_from_consensus_gets_slashed() {
        let store = LocalReputationStore::new();
        store.put_reputation(reputation("org-a", 0.8)).await.unwrap();
        for days_ago in [1, 5, 10] {
            let mut bad = contribution("org-a", "MD-100", 0.95, days_ago);
            bad.deviation = 0.85;
            store.record_contribution(bad).await.unwrap();
        }

        refresh_consistency(
            "org-a",
            "MD-100",
            &store,
            &ConsistencyConfig::default(),
            &ReputationConfig::default(),
            Utc::now(),
        )
        .await
        .unwrap();

        let reputation = store.get_reputation("org-a").await.unwrap().unwrap();
        assert_eq!(reputation.stake_status, StakeStatus::Slashed);
        assert_eq!(reputation.reputation_score, 0.0);
        assert_eq!(reputation.flagged_count, 1);
    }

    #[tokio::test]
    async fn an_org_close_to_consensus_keeps_its_reputation() {
        let store = LocalReputationStore::new();
        store.put_reputation(reputation("org-a", 0.8)).await.unwrap();
        for days_ago in [1, 5, 10] {
            store.record_contribution(contribution("org-a", "MD-100", 0.10, days_ago)).await.unwrap();
        }

        refresh_consistency(
            "org-a",
            "MD-100",
            &store,
            &ConsistencyConfig::default(),
            &ReputationConfig::default(),
            Utc::now(),
        )
        .await
        .unwrap();

        let reputation = store.get_reputation("org-a").await.unwrap().unwrap();
        assert_eq!(reputation.stake_status, StakeStatus::Active);
        assert_eq!(reputation.reputation_score, 0.8);
        assert!(reputation.consistency_score > 0.9);
    }

    #[tokio::test]
    async fn only_one_qualifying_contribution_stays_neutral_and_unslashed() {
        // Mirrors the fixtures in `sufficient_contributors_yield_a_consensus_rate`:
        // one contribution per org is below `min_contributions_required`, so the
        // refresh must land on the neutral score rather than slash anyone.
        let store = LocalReputationStore::new();
        store.put_reputation(reputation("org-a", 0.8)).await.unwrap();
        store.record_contribution(contribution("org-a", "MD-100", 0.95, 1)).await.unwrap();

        refresh_consistency(
            "org-a",
            "MD-100",
            &store,
            &ConsistencyConfig::default(),
            &ReputationConfig::default(),
            Utc::now(),
        )
        .await
        .unwrap();

        let reputation = store.get_reputation("org-a").await.unwrap().unwrap();
        assert_eq!(reputation.stake_status, StakeStatus::Active);
        assert_eq!(reputation.consistency_score, 0.5);
    }
}
