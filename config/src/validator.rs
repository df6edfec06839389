//! Configuration validation using the `validator` crate.

use crate::config::OracleConfig;
use validator::Validate;

pub fn validate(config: &OracleConfig) -> Result<(), validator::ValidationErrors> {
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&OracleConfig::default()).is_ok());
    }

    #[test]
    fn zero_alarm_threshold_is_rejected() {
        let mut config = OracleConfig::default();
        config.circuit_breaker.alarm_threshold = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn reset_window_below_a_minute_is_rejected() {
        let mut config = OracleConfig::default();
        config.circuit_breaker.reset_window_seconds = 10;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn min_contributors_of_zero_is_rejected() {
        let mut config = OracleConfig::default();
        config.byzantine_filter.min_contributors = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn trim_percentile_at_half_is_rejected() {
        let mut config = OracleConfig::default();
        config.byzantine_filter.trim_percentile = 0.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn invalid_logging_level_is_rejected() {
        let mut config = OracleConfig::default();
        config.observability.logging_level = "verbose".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn valid_logging_levels_are_accepted() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let mut config = OracleConfig::default();
            config.observability.logging_level = level.to_string();
            assert!(validate(&config).is_ok());
        }
    }

    #[test]
    fn unknown_storage_backend_is_rejected() {
        let mut config = OracleConfig::default();
        config.storage.backend = "s3".to_string();
        assert!(validate(&config).is_err());
    }
}
