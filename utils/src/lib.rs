//! Shared helpers with no domain dependencies of their own: content hashing,
//! canonical JSON for HMAC signing, and glob matching for policy
//! classification patterns.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// SHA-256 hash of a string, hex-encoded.
#[must_use]
pub fn compute_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a v4 UUID string.
#[must_use]
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Renders a JSON value with recursively sorted object keys, compact
/// separators, and no whitespace. The redaction/integrity service signs this
/// canonical form so semantically identical payloads with differently
/// ordered fields produce the same signature.
#[must_use]
pub fn canonical_json(value: &serde_json::Value) -> String {
    serde_json::to_string(&sort_keys(value)).expect("canonicalized value always serializes")
}

fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Compiles a glob pattern into an anchored regex. `*` matches zero or more
/// of `[a-zA-Z0-9._-]` — not an arbitrary run of characters, so a pattern
/// segment can't accidentally reach across a `/` path boundary — and `?`
/// matches exactly one such character. Used by the policy resolver to match
/// repository full names against classification patterns.
#[must_use]
pub fn glob_to_regex(pattern: &str) -> regex::Regex {
    const GLOB_CHARSET: &str = r"[a-zA-Z0-9._\-]";
    let mut regex_src = String::with_capacity(pattern.len() * 2 + 2);
    regex_src.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => {
                regex_src.push_str(GLOB_CHARSET);
                regex_src.push('*');
            }
            '?' => regex_src.push_str(GLOB_CHARSET),
            other => regex_src.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex_src.push('$');
    regex::Regex::new(&regex_src).expect("generated glob regex is always valid")
}

/// Whether `candidate` matches the glob `pattern`.
#[must_use]
pub fn glob_matches(pattern: &str, candidate: &str) -> bool {
    glob_to_regex(pattern).is_match(candidate)
}
