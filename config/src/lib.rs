//! Configuration management for the governance oracle.
//!
//! This crate provides:
//! - Configuration structures for every threshold the oracle reads
//! - Environment variable loading (12-factor app principles)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (env > file > defaults)
//! - Configuration validation

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validator;

pub use config::{
    ByzantineFilterConfig, CircuitBreakerConfig, ConsistencyConfig, ObservabilityConfig,
    OracleConfig, ReputationConfig, RetentionConfig, StorageConfig,
};
pub use file_loader::{load_from_file, load_from_toml, load_from_yaml, ConfigFileError};
pub use loader::load_from_env;
pub use precedence::merge_configs;
pub use validator::validate;
