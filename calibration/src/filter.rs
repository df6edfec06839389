//! Byzantine filter: the ordered stage pipeline that turns a raw set of
//! per-org FP-rate submissions into a trusted, weighted consensus
//! (`spec.md` §4.4). Stage order is load-bearing and must not change.

use crate::reputation::{contribution_weight, stake_multiplier};
use config::{ByzantineFilterConfig, ReputationConfig};
use core::{OrganizationReputation, StakePledge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    InsufficientData,
    LowReputation,
    NoStake,
    StatisticalOutlier,
    LowPercentile,
}

#[derive(Debug, Clone)]
pub struct RawContribution {
    pub org_id: String,
    pub fp_rate: f64,
    pub event_count: u64,
    pub reputation: Option<OrganizationReputation>,
    pub stake: Option<StakePledge>,
}

#[derive(Debug, Clone)]
pub struct Survivor {
    pub org_id: String,
    pub fp_rate: f64,
    pub event_count: u64,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub survivors: Vec<Survivor>,
    pub dropped: Vec<(String, DropReason)>,
    /// Set when the statistical stages (z-score, percentile trim) were
    /// skipped because too few contributors survived the earlier stages.
    pub statistical_stages_skipped: bool,
}

/// Runs the ordered filter pipeline. Does not enforce the k-anonymity
/// floor — the caller checks `survivors.len()` against that separately,
/// since the floor is a property of the aggregation call, not the filter.
#[must_use]
pub fn run(contributions: Vec<RawContribution>, filter_cfg: &ByzantineFilterConfig, rep_cfg: &ReputationConfig) -> FilterOutcome {
    let mut dropped = Vec::new();

    // Stage 1: no reputation record at all.
    let (with_reputation, without): (Vec<_>, Vec<_>) = contributions.into_iter().partition(|c| c.reputation.is_some());
    dropped.extend(without.into_iter().map(|c| (c.org_id, DropReason::InsufficientData)));

    // Stage 2: weight below the minimum reputation floor.
    let mut weighted: Vec<(RawContribution, f64)> = Vec::new();
    for contribution in with_reputation {
        let weight = contribution_weight(contribution.reputation.as_ref(), contribution.stake.as_ref(), rep_cfg);
        if weight < filter_cfg.min_reputation {
            dropped.push((contribution.org_id, DropReason::LowReputation));
        } else {
            weighted.push((contribution, weight));
        }
    }

    // Stage 3: require nonzero stake, if configured.
    if filter_cfg.require_stake {
        let mut kept = Vec::new();
        for (contribution, weight) in weighted {
            if stake_multiplier(contribution.stake.as_ref(), rep_cfg) == 0.0 {
                dropped.push((contribution.org_id, DropReason::NoStake));
            } else {
                kept.push((contribution, weight));
            }
        }
        weighted = kept;
    }

    let mut survivors: Vec<Survivor> = weighted
        .into_iter()
        .map(|(c, weight)| Survivor { org_id: c.org_id, fp_rate: c.fp_rate, event_count: c.event_count, weight })
        .collect();

    // Stage 4: below the statistical floor, skip z-score and percentile
    // trim; return what remains with a confidence annotation upstream.
    if survivors.len() < filter_cfg.min_contributors_for_filtering {
        return FilterOutcome { survivors, dropped, statistical_stages_skipped: true };
    }

    // Stage 5: drop contributors whose FP rate is a statistical outlier.
    let mean = survivors.iter().map(|s| s.fp_rate).sum::<f64>() / survivors.len() as f64;
    let variance = survivors.iter().map(|s| (s.fp_rate - mean).powi(2)).sum::<f64>() / survivors.len() as f64;
    let std_dev = variance.sqrt();
    let mut kept = Vec::new();
    for survivor in survivors {
        let z = if std_dev > 0.0 { (survivor.fp_rate - mean) / std_dev } else { 0.0 };
        if z.abs() > filter_cfg.z_score_threshold {
            dropped.push((survivor.org_id, DropReason::StatisticalOutlier));
        } else {
            kept.push(survivor);
        }
    }
    survivors = kept;

    // Stage 6: drop the bottom `trim_percentile` fraction by reputation
    // weight.
    survivors.sort_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap());
    let trim_count = (survivors.len() as f64 * filter_cfg.trim_percentile).floor() as usize;
    let trimmed: Vec<Survivor> = survivors.drain(..trim_count).collect();
    dropped.extend(trimmed.into_iter().map(|s| (s.org_id, DropReason::LowPercentile)));

    FilterOutcome { survivors, dropped, statistical_stages_skipped: false }
}

/// Stage 7: `Σ(weight·fpRate) / Σ(weight)` over the final survivors.
#[must_use]
pub fn weighted_consensus(survivors: &[Survivor]) -> f64 {
    let weight_total: f64 = survivors.iter().map(|s| s.weight).sum();
    if weight_total == 0.0 {
        return 0.0;
    }
    survivors.iter().map(|s| s.weight * s.fp_rate).sum::<f64>() / weight_total
}
