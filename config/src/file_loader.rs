//! Configuration file loading, TOML or YAML with automatic format detection.

use crate::config::OracleConfig;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("config file has no extension")]
    NoExtension,

    #[error("unsupported config file format: {0}")]
    UnsupportedFormat(String),
}

pub fn load_from_toml(path: &Path) -> Result<OracleConfig, ConfigFileError> {
    let contents =
        std::fs::read_to_string(path).map_err(|_| ConfigFileError::FileNotFound(path.display().to_string()))?;
    toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse(e.to_string()))
}

pub fn load_from_yaml(path: &Path) -> Result<OracleConfig, ConfigFileError> {
    let contents =
        std::fs::read_to_string(path).map_err(|_| ConfigFileError::FileNotFound(path.display().to_string()))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigFileError::YamlParse(e.to_string()))
}

pub fn load_from_file(path: &Path) -> Result<OracleConfig, ConfigFileError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or(ConfigFileError::NoExtension)?;

    match extension.to_lowercase().as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        other => Err(ConfigFileError::UnsupportedFormat(other.to_string())),
    }
}
