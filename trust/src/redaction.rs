//! Redaction/Integrity Service (`spec.md` §4.5): HMAC-SHA256 over the
//! canonical JSON of a redacted payload, keyed by the current nonce.
//! Supports multi-version validation during a rotation grace period.

use core::NonceConfig;
use errors::{SecretError, TrustError};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the redaction tag for `value` under one specific nonce.
pub fn compute_tag(value: &serde_json::Value, nonce_hex: &str) -> Result<String, TrustError> {
    let key = hex::decode(nonce_hex)
        .map_err(|e| SecretError::MalformedSecret { reason: format!("nonce is not valid hex: {e}") })?;
    let canonical = utils::canonical_json(value);
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| SecretError::MalformedSecret { reason: e.to_string() })?;
    mac.update(canonical.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Accepts `tag` if it was produced by any currently-loaded nonce version.
/// `nonces` should be newest-first (`SecretStore::get_nonces`); this
/// enables a dual-nonce grace period across rotation without the caller
/// needing to know which version signed a given payload.
pub fn verify_tag(value: &serde_json::Value, tag: &str, nonces: &[NonceConfig]) -> Result<bool, TrustError> {
    for nonce in nonces {
        if compute_tag(value, &nonce.value)? == tag {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn nonce(version: u32, value: &str) -> NonceConfig {
        NonceConfig { value: value.to_string(), loaded_at: Utc::now(), source: "test".into(), version }
    }

    #[test]
    fn tag_is_deterministic_for_the_same_nonce_and_payload() {
        let value = json!({"b": 2, "a": 1});
        let key = "a".repeat(32);
        assert_eq!(compute_tag(&value, &key).unwrap(), compute_tag(&value, &key).unwrap());
    }

    #[test]
    fn key_ordering_does_not_change_the_tag() {
        let key = "a".repeat(32);
        let tag_a = compute_tag(&json!({"b": 2, "a": 1}), &key).unwrap();
        let tag_b = compute_tag(&json!({"a": 1, "b": 2}), &key).unwrap();
        assert_eq!(tag_a, tag_b);
    }

    #[test]
    fn verify_accepts_any_currently_loaded_nonce_version() {
        let value = json!({"finding": "f1"});
        let old_nonce = nonce(1, &"a".repeat(32));
        let new_nonce = nonce(2, &"b".repeat(32));
        let tag = compute_tag(&value, &old_nonce.value).unwrap();

        assert!(verify_tag(&value, &tag, &[new_nonce.clone(), old_nonce.clone()]).unwrap());
    }

    #[test]
    fn verify_rejects_a_tag_signed_by_a_retired_nonce() {
        let value = json!({"finding": "f1"});
        let retired = nonce(1, &"a".repeat(32));
        let current = nonce(2, &"b".repeat(32));
        let tag = compute_tag(&value, &retired.value).unwrap();

        assert!(!verify_tag(&value, &tag, &[current]).unwrap());
    }
}
