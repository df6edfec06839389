//! `NonceConfig`: one loaded nonce version. Multiple versions may coexist
//! transiently during rotation (`spec.md` §3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceConfig {
    /// Hex-encoded, at least 32 characters.
    pub value: String,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
    pub source: String,
    /// Parsed from the parameter-store suffix `_v<N>` (`spec.md` §6).
    pub version: u32,
}
