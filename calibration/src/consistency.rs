//! Consistency calculator: per-org alignment with consensus over a
//! time-decayed window (`spec.md` §4.4).

use chrono::{DateTime, Duration, Utc};
use config::ConsistencyConfig;
use core::ContributionRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyResult {
    pub score: f64,
    /// Set when too few qualifying contributions existed and `score` is
    /// the neutral fallback rather than a computed value.
    pub neutral: bool,
    /// Contributions whose deviation exceeded `outlier_threshold`, counted
    /// for metrics regardless of whether they were excluded from `score`.
    pub outlier_count: usize,
}

/// Computes a consistency score over the trailing `max_age_days` window.
/// Contributions below `min_event_count` are ignored entirely; below
/// `min_contributions_required` qualifying contributions, returns the
/// neutral score `0.5` with `neutral = true`.
#[must_use]
pub fn compute_consistency(
    records: &[ContributionRecord],
    now: DateTime<Utc>,
    cfg: &ConsistencyConfig,
) -> ConsistencyResult {
    let window_start = now - Duration::days(cfg.max_age_days);
    let mut qualifying: Vec<&ContributionRecord> = records
        .iter()
        .filter(|r| r.timestamp >= window_start && r.timestamp <= now)
        .filter(|r| r.event_count >= u64::from(cfg.min_event_count))
        .collect();

    if qualifying.len() < cfg.min_contributions_required as usize {
        return ConsistencyResult { score: 0.5, neutral: true, outlier_count: 0 };
    }

    let outlier_count = qualifying.iter().filter(|r| r.deviation.abs() > cfg.outlier_threshold).count();

    if cfg.exclude_outliers_from_score {
        qualifying.retain(|r| r.deviation.abs() <= cfg.outlier_threshold);
        if qualifying.len() < cfg.min_contributions_required as usize {
            return ConsistencyResult { score: 0.5, neutral: true, outlier_count };
        }
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for record in &qualifying {
        let age_days = (now - record.timestamp).num_seconds() as f64 / 86400.0;
        let time_weight = (-cfg.decay_lambda * age_days).exp();
        let single_score = 1.0 - record.deviation.abs().min(1.0);
        weighted_sum += time_weight * single_score;
        weight_total += time_weight;
    }

    let score = if weight_total > 0.0 { weighted_sum / weight_total } else { 0.5 };
    ConsistencyResult { score, neutral: false, outlier_count }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(deviation: f64, age_days: i64, event_count: u64) -> ContributionRecord {
        ContributionRecord {
            org_id: "org-1".into(),
            rule_id: "MD-100".into(),
            contributed_fp_rate: 0.1,
            consensus_fp_rate: 0.1 - deviation,
            timestamp: Utc::now() - Duration::days(age_days),
            event_count,
            deviation,
            consistency_score: 0.0,
        }
    }

    #[test]
    fn too_few_qualifying_contributions_returns_neutral() {
        let cfg = ConsistencyConfig::default();
        let records = vec![record(0.05, 1, 10)];
        let result = compute_consistency(&records, Utc::now(), &cfg);
        assert!(result.neutral);
        assert_eq!(result.score, 0.5);
    }

    #[test]
    fn perfectly_aligned_contributions_score_near_one() {
        let cfg = ConsistencyConfig::default();
        let records = vec![record(0.0, 1, 10), record(0.0, 2, 10), record(0.0, 3, 10)];
        let result = compute_consistency(&records, Utc::now(), &cfg);
        assert!(!result.neutral);
        assert!(result.score > 0.99);
    }

    #[test]
    fn outliers_are_counted_but_not_excluded_by_default() {
        let cfg = ConsistencyConfig::default();
        let records = vec![record(0.5, 1, 10), record(0.0, 2, 10), record(0.0, 3, 10)];
        let result = compute_consistency(&records, Utc::now(), &cfg);
        assert_eq!(result.outlier_count, 1);
        assert!(result.score < 1.0);
    }

    #[test]
    fn stale_contributions_outside_the_window_are_dropped() {
        let cfg = ConsistencyConfig::default();
        let records = vec![record(0.0, 1, 10), record(0.0, 2, 10), record(0.0, 400, 10)];
        let result = compute_consistency(&records, Utc::now(), &cfg);
        assert!(result.neutral, "only 2 records fall inside the 180-day window");
    }

    #[test]
    fn events_below_the_minimum_count_are_ignored() {
        let cfg = ConsistencyConfig::default();
        let records = vec![record(0.0, 1, 0), record(0.0, 2, 0), record(0.0, 3, 0)];
        let result = compute_consistency(&records, Utc::now(), &cfg);
        assert!(result.neutral);
    }
}
