//! Environment variable loading, 12-factor style.
//!
//! # Naming Convention
//! - `OCB_*`: circuit breaker settings
//! - `OBF_*`: Byzantine filter and reputation-weighting settings
//! - `OCS_*`: consistency settings
//! - `ORT_*`: retention settings
//! - `OOB_*`: observability settings
//! - `OST_*`: storage settings

use crate::config::{
    ByzantineFilterConfig, CircuitBreakerConfig, ConsistencyConfig, ObservabilityConfig,
    OracleConfig, ReputationConfig, RetentionConfig, StorageConfig,
};
use std::env;

pub fn load_from_env() -> OracleConfig {
    OracleConfig {
        circuit_breaker: load_circuit_breaker_from_env(),
        byzantine_filter: load_byzantine_filter_from_env(),
        reputation: load_reputation_from_env(),
        consistency: load_consistency_from_env(),
        retention: load_retention_from_env(),
        observability: load_observability_from_env(),
        storage: load_storage_from_env(),
    }
}

fn load_circuit_breaker_from_env() -> CircuitBreakerConfig {
    let defaults = CircuitBreakerConfig::default();
    CircuitBreakerConfig {
        alarm_threshold: parse_env("OCB_ALARM_THRESHOLD").unwrap_or(defaults.alarm_threshold),
        reset_window_seconds: parse_env("OCB_RESET_WINDOW_SECONDS")
            .unwrap_or(defaults.reset_window_seconds),
    }
}

fn load_byzantine_filter_from_env() -> ByzantineFilterConfig {
    let defaults = ByzantineFilterConfig::default();
    ByzantineFilterConfig {
        min_contributors: parse_env("OBF_MIN_CONTRIBUTORS").unwrap_or(defaults.min_contributors),
        min_reputation: parse_env("OBF_MIN_REPUTATION").unwrap_or(defaults.min_reputation),
        require_stake: parse_env("OBF_REQUIRE_STAKE").unwrap_or(defaults.require_stake),
        min_contributors_for_filtering: parse_env("OBF_MIN_CONTRIBUTORS_FOR_FILTERING")
            .unwrap_or(defaults.min_contributors_for_filtering),
        z_score_threshold: parse_env("OBF_Z_SCORE_THRESHOLD")
            .unwrap_or(defaults.z_score_threshold),
        trim_percentile: parse_env("OBF_TRIM_PERCENTILE").unwrap_or(defaults.trim_percentile),
    }
}

fn load_reputation_from_env() -> ReputationConfig {
    let defaults = ReputationConfig::default();
    ReputationConfig {
        stake_cap: parse_env("OBF_STAKE_CAP").unwrap_or(defaults.stake_cap),
        min_stake_usd: parse_env("OBF_MIN_STAKE_USD").unwrap_or(defaults.min_stake_usd),
        consistency_bonus_cap: parse_env("OBF_CONSISTENCY_BONUS_CAP")
            .unwrap_or(defaults.consistency_bonus_cap),
        missing_record_weight: parse_env("OBF_MISSING_RECORD_WEIGHT")
            .unwrap_or(defaults.missing_record_weight),
        slash_consistency_threshold: parse_env("OBF_SLASH_CONSISTENCY_THRESHOLD")
            .unwrap_or(defaults.slash_consistency_threshold),
    }
}

fn load_consistency_from_env() -> ConsistencyConfig {
    let defaults = ConsistencyConfig::default();
    ConsistencyConfig {
        max_age_days: parse_env("OCS_MAX_AGE_DAYS").unwrap_or(defaults.max_age_days),
        min_event_count: parse_env("OCS_MIN_EVENT_COUNT").unwrap_or(defaults.min_event_count),
        min_contributions_required: parse_env("OCS_MIN_CONTRIBUTIONS_REQUIRED")
            .unwrap_or(defaults.min_contributions_required),
        decay_lambda: parse_env("OCS_DECAY_LAMBDA").unwrap_or(defaults.decay_lambda),
        outlier_threshold: parse_env("OCS_OUTLIER_THRESHOLD").unwrap_or(defaults.outlier_threshold),
        exclude_outliers_from_score: parse_env("OCS_EXCLUDE_OUTLIERS_FROM_SCORE")
            .unwrap_or(defaults.exclude_outliers_from_score),
    }
}

fn load_retention_from_env() -> RetentionConfig {
    let defaults = RetentionConfig::default();
    RetentionConfig {
        fp_event_ttl_days: parse_env("ORT_FP_EVENT_TTL_DAYS").unwrap_or(defaults.fp_event_ttl_days),
        rotation_history_max_depth: parse_env("ORT_ROTATION_HISTORY_MAX_DEPTH")
            .unwrap_or(defaults.rotation_history_max_depth),
    }
}

fn load_observability_from_env() -> ObservabilityConfig {
    let defaults = ObservabilityConfig::default();
    ObservabilityConfig {
        logging_level: env::var("OOB_LOGGING_LEVEL").unwrap_or(defaults.logging_level),
        json_logs: parse_env("OOB_JSON_LOGS").unwrap_or(defaults.json_logs),
    }
}

fn load_storage_from_env() -> StorageConfig {
    let defaults = StorageConfig::default();
    StorageConfig {
        backend: env::var("OST_BACKEND").unwrap_or(defaults.backend),
        local_root: env::var("OST_LOCAL_ROOT").unwrap_or(defaults.local_root),
    }
}

fn parse_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}
