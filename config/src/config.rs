//! Configuration structures for the governance oracle.
//!
//! Every numeric threshold the evaluation algorithm reads comes from here
//! rather than being hard-coded in `oracle`/`calibration` — Open Question #2
//! resolved divergent source thresholds into configurable fields defaulting
//! to the more conservative value.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-level oracle configuration. Unknown keys are rejected: a typo in a
/// deployed config file should fail loudly, not silently fall back to a
/// default.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct OracleConfig {
    #[serde(default)]
    #[validate(nested)]
    pub circuit_breaker: CircuitBreakerConfig,

    #[serde(default)]
    #[validate(nested)]
    pub byzantine_filter: ByzantineFilterConfig,

    #[serde(default)]
    #[validate(nested)]
    pub reputation: ReputationConfig,

    #[serde(default)]
    #[validate(nested)]
    pub consistency: ConsistencyConfig,

    #[serde(default)]
    #[validate(nested)]
    pub retention: RetentionConfig,

    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    #[validate(nested)]
    pub storage: StorageConfig,
}

/// Circuit breaker thresholds (`spec.md` §4.1 step 6). Defaults resolve the
/// divergent 6-vs-8 alarm count and 5-minute-vs-1-hour reset window to the
/// more conservative source value.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct CircuitBreakerConfig {
    /// Alarms within the reset window before a rule's outcome is capped.
    #[validate(range(min = 1, max = 1000))]
    pub alarm_threshold: u32,

    /// Window size in seconds after which the alarm count resets.
    #[validate(range(min = 60, max = 86400))]
    pub reset_window_seconds: i64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            alarm_threshold: 8,
            reset_window_seconds: 3600,
        }
    }
}

/// Byzantine filter thresholds for false-positive-rate aggregation
/// (`spec.md` §4.4). Field names follow the stage they gate, in stage
/// order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ByzantineFilterConfig {
    /// k-anonymity floor: `AggregateFPsByRule` errors if fewer than this
    /// many trusted contributors remain after filtering.
    #[validate(range(min = 1, max = 1000))]
    pub min_contributors: usize,

    /// Stage 2: minimum contribution weight to remain eligible.
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_reputation: f64,

    /// Stage 3: when set, contributors whose stake multiplier is 0 are
    /// dropped.
    pub require_stake: bool,

    /// Stage 4: below this many survivors, skip the statistical stages and
    /// annotate confidence instead.
    #[validate(range(min = 1, max = 1000))]
    pub min_contributors_for_filtering: usize,

    /// Stage 5: z-score magnitude beyond which a contribution is treated
    /// as an outlier. sigma=0 yields z=0, so no drops.
    #[validate(range(min = 0.1, max = 10.0))]
    pub z_score_threshold: f64,

    /// Stage 6: percentile trim applied to the bottom of the
    /// reputation-weight ordering before consensus is computed.
    #[validate(range(min = 0.0, max = 0.49))]
    pub trim_percentile: f64,
}

impl Default for ByzantineFilterConfig {
    fn default() -> Self {
        Self {
            min_contributors: 3,
            min_reputation: 0.1,
            require_stake: false,
            min_contributors_for_filtering: 5,
            z_score_threshold: 3.0,
            trim_percentile: 0.20,
        }
    }
}

/// `ContributionWeight` parameters, owned by the reputation engine
/// (`spec.md` §4.4).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ReputationConfig {
    /// Cap applied to `stakeMultiplier`.
    #[validate(range(min = 0.0, max = 10.0))]
    pub stake_cap: f64,

    /// Stake, in USD, at which `stakeMultiplier` saturates to `stake_cap`.
    #[validate(range(min = 1.0))]
    pub min_stake_usd: f64,

    /// Cap applied to `consistencyBonus`.
    #[validate(range(min = 0.0, max = 1.0))]
    pub consistency_bonus_cap: f64,

    /// Weight assigned to a contributor with no reputation record at all.
    #[validate(range(min = 0.0, max = 1.0))]
    pub missing_record_weight: f64,

    /// A contributor whose refreshed consistency score falls below this
    /// after a calibration round is slashed rather than merely re-scored.
    #[validate(range(min = 0.0, max = 1.0))]
    pub slash_consistency_threshold: f64,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            stake_cap: 1.0,
            min_stake_usd: 1000.0,
            consistency_bonus_cap: 0.2,
            missing_record_weight: 0.1,
            slash_consistency_threshold: 0.2,
        }
    }
}

/// Consistency-score time decay and sampling window (`spec.md` §4.4).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ConsistencyConfig {
    /// Width, in days, of the trailing window considered.
    #[validate(range(min = 1, max = 3650))]
    pub max_age_days: i64,

    /// Minimum per-contribution event count to be considered at all.
    #[validate(range(min = 0, max = 100000))]
    pub min_event_count: u32,

    /// Below this many qualifying contributions, return the neutral score
    /// with a flag rather than computing a time-decayed average.
    #[validate(range(min = 1, max = 10000))]
    pub min_contributions_required: u32,

    /// Exponential-decay rate applied to contribution age in days.
    #[validate(range(min = 0.0001, max = 10.0))]
    pub decay_lambda: f64,

    /// Absolute deviation beyond which a contribution counts as an
    /// outlier for metrics purposes.
    #[validate(range(min = 0.0, max = 1.0))]
    pub outlier_threshold: f64,

    /// When set, outliers are excluded from the consistency score itself,
    /// not just counted.
    pub exclude_outliers_from_score: bool,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            max_age_days: 180,
            min_event_count: 1,
            min_contributions_required: 3,
            decay_lambda: 0.01,
            outlier_threshold: 0.30,
            exclude_outliers_from_score: false,
        }
    }
}

/// Data retention windows (`spec.md` §3: `FpEvent` 90-day TTL).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct RetentionConfig {
    #[validate(range(min = 1, max = 3650))]
    pub fp_event_ttl_days: i64,

    #[validate(range(min = 1, max = 3650))]
    pub rotation_history_max_depth: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            fp_event_ttl_days: 90,
            rotation_history_max_depth: 32,
        }
    }
}

/// Logging configuration, read by the `cli` crate at process start.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ObservabilityConfig {
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String,

    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging_level: "info".to_string(),
            json_logs: false,
        }
    }
}

fn validate_logging_level(level: &str) -> Result<(), validator::ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_logging_level")),
    }
}

/// Which adapter realization each storage trait is wired to.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct StorageConfig {
    #[validate(custom(function = "validate_backend"))]
    pub backend: String,

    /// Root directory for `Local*` file-backed adapters.
    pub local_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            local_root: ".oracle-state".to_string(),
        }
    }
}

fn validate_backend(backend: &str) -> Result<(), validator::ValidationError> {
    match backend {
        "local" | "cloud" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_storage_backend")),
    }
}
