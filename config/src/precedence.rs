//! # Configuration Precedence
//!
//! Merges configuration from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. Environment variables (highest priority)
//! 2. Configuration file
//! 3. Default values (lowest priority)

use crate::config::OracleConfig;

/// Merges a config file (if any) and the environment over the defaults,
/// logging each section that a later source actually changed.
pub fn merge_configs(file_config: Option<OracleConfig>, env_config: OracleConfig) -> OracleConfig {
    let mut config = OracleConfig::default();

    if let Some(file_config) = file_config {
        merge_section(&mut config.circuit_breaker, &file_config.circuit_breaker, "file", "circuit_breaker");
        merge_section(&mut config.byzantine_filter, &file_config.byzantine_filter, "file", "byzantine_filter");
        merge_section(&mut config.reputation, &file_config.reputation, "file", "reputation");
        merge_section(&mut config.consistency, &file_config.consistency, "file", "consistency");
        merge_section(&mut config.retention, &file_config.retention, "file", "retention");
        merge_section(&mut config.observability, &file_config.observability, "file", "observability");
        merge_section(&mut config.storage, &file_config.storage, "file", "storage");
    }

    merge_section(&mut config.circuit_breaker, &env_config.circuit_breaker, "env", "circuit_breaker");
    merge_section(&mut config.byzantine_filter, &env_config.byzantine_filter, "env", "byzantine_filter");
    merge_section(&mut config.reputation, &env_config.reputation, "env", "reputation");
    merge_section(&mut config.consistency, &env_config.consistency, "env", "consistency");
    merge_section(&mut config.retention, &env_config.retention, "env", "retention");
    merge_section(&mut config.observability, &env_config.observability, "env", "observability");
    merge_section(&mut config.storage, &env_config.storage, "env", "storage");

    config
}

/// Applies `override_section` onto `base` only if that layer actually
/// customized the section, i.e. it differs from `T::default()`. Comparing
/// against `base` instead would make every later layer's *unchanged,
/// fully-resolved* defaults stomp an earlier layer's real customization.
fn merge_section<T: PartialEq + Clone + Default>(base: &mut T, override_section: &T, source: &str, name: &str) {
    if *override_section != T::default() {
        tracing::debug!(section = name, source, "config section overridden");
        base.clone_from(override_section);
    }
}
