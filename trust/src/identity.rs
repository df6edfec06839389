//! Identity & Nonce Binding Service (`spec.md` §4.5): binds one nonce per
//! verified org, supports rotation chain and revocation, validates
//! submissions.

use chrono::Utc;
use core::{NonceBinding, OrganizationIdentity};
use errors::TrustError;
use rand::RngCore;
use sha2::{Digest, Sha256};
use storage::IdentityStore;

const ROTATION_HISTORY_MAX_DEPTH: usize = 100;

fn validate_public_key(public_key: &str) -> Result<(), TrustError> {
    if public_key.len() < 32 || !public_key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TrustError::InvalidPublicKey {
            reason: "public key must be hex-encoded and at least 32 characters".to_string(),
        });
    }
    Ok(())
}

fn generate_nonce_hex() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn compute_signature(nonce: &str, org_id: &str, public_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{nonce}:{org_id}:{public_key}").as_bytes());
    hex::encode(hasher.finalize())
}

/// Only callable after identity verification (`store.get_identity` returns
/// a record). Fails with `AlreadyBound` if an active binding exists.
pub async fn generate_and_bind_nonce(
    org_id: &str,
    public_key: &str,
    store: &dyn IdentityStore,
) -> Result<NonceBinding, TrustError> {
    validate_public_key(public_key)?;

    let mut identity = store
        .get_identity(org_id)
        .await?
        .ok_or_else(|| TrustError::IdentityNotVerified { org_id: org_id.to_string() })?;

    if let Some(existing) = store.get_binding_for_org(org_id).await? {
        if existing.is_active() {
            return Err(TrustError::AlreadyBound { org_id: org_id.to_string() });
        }
    }

    let nonce = generate_nonce_hex();
    let signature = compute_signature(&nonce, org_id, public_key);
    let binding = NonceBinding {
        nonce: nonce.clone(),
        org_id: org_id.to_string(),
        public_key: public_key.to_string(),
        signature,
        bound_at: Utc::now(),
        revoked: false,
        revocation_reason: None,
        revoked_at: None,
        previous_nonce: None,
        usage_count: 0,
        generation: 0,
    };

    store.compare_and_set_binding(binding.clone(), 0).await?;

    identity.bound_nonce = Some(nonce);
    store.put_identity(identity).await?;

    Ok(binding)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub valid: bool,
    pub reason: Option<String>,
    pub binding: Option<NonceBinding>,
}

impl VerificationOutcome {
    fn invalid(reason: &str) -> Self {
        Self { valid: false, reason: Some(reason.to_string()), binding: None }
    }
}

/// Checks (a) a binding exists, (b) the supplied nonce matches it, (c) it
/// isn't revoked, (d) the stored signature recomputes (tamper detection),
/// (e) the identity is verified. Never panics; every failure mode is a
/// structured reason.
pub async fn verify_binding(
    nonce: &str,
    org_id: &str,
    store: &dyn IdentityStore,
) -> Result<VerificationOutcome, TrustError> {
    let Some(binding) = store.get_binding_for_org(org_id).await? else {
        return Ok(VerificationOutcome::invalid("no_binding"));
    };
    if binding.nonce != nonce {
        return Ok(VerificationOutcome::invalid("nonce_mismatch"));
    }
    if binding.revoked {
        return Ok(VerificationOutcome::invalid("revoked"));
    }
    let expected_signature = compute_signature(&binding.nonce, &binding.org_id, &binding.public_key);
    if expected_signature != binding.signature {
        return Ok(VerificationOutcome::invalid("signature_mismatch"));
    }
    let Some(_identity) = store.get_identity(org_id).await? else {
        return Ok(VerificationOutcome::invalid("identity_not_verified"));
    };
    Ok(VerificationOutcome { valid: true, reason: None, binding: Some(binding) })
}

/// Atomic: the current binding is marked revoked, a new binding is created
/// pointing at it via `previous_nonce`, and the identity is updated.
/// Rotating a revoked binding fails. The two `compare_and_set_binding`
/// calls share the pre-rotation generation, so a concurrent rotation can
/// win at most one of them (`spec.md` §5: "linearized via compare-and-set
/// on the current binding's version").
pub async fn rotate_nonce(
    org_id: &str,
    new_public_key: &str,
    reason: &str,
    store: &dyn IdentityStore,
) -> Result<NonceBinding, TrustError> {
    validate_public_key(new_public_key)?;

    let current = store
        .get_binding_for_org(org_id)
        .await?
        .ok_or_else(|| TrustError::NoBinding { org_id: org_id.to_string() })?;
    if current.revoked {
        return Err(TrustError::RotationOfRevoked { org_id: org_id.to_string() });
    }

    let now = Utc::now();
    let mut revoked_current = current.clone();
    revoked_current.revoked = true;
    revoked_current.revocation_reason = Some(reason.to_string());
    revoked_current.revoked_at = Some(now);
    store.compare_and_set_binding(revoked_current, current.generation).await?;

    let new_nonce = generate_nonce_hex();
    let signature = compute_signature(&new_nonce, org_id, new_public_key);
    let new_binding = NonceBinding {
        nonce: new_nonce.clone(),
        org_id: org_id.to_string(),
        public_key: new_public_key.to_string(),
        signature,
        bound_at: now,
        revoked: false,
        revocation_reason: None,
        revoked_at: None,
        previous_nonce: Some(current.nonce.clone()),
        usage_count: 0,
        generation: current.generation + 1,
    };
    store.compare_and_set_binding(new_binding.clone(), current.generation).await?;

    if let Some(mut identity) = store.get_identity(org_id).await? {
        identity.bound_nonce = Some(new_nonce);
        store.put_identity(identity).await?;
    }

    Ok(new_binding)
}

/// Marks the current binding revoked with a timestamp and reason.
/// Subsequent `verify_binding` calls return `revoked`.
pub async fn revoke_binding(org_id: &str, reason: &str, store: &dyn IdentityStore) -> Result<(), TrustError> {
    let current = store
        .get_binding_for_org(org_id)
        .await?
        .ok_or_else(|| TrustError::NoBinding { org_id: org_id.to_string() })?;
    if current.revoked {
        return Ok(());
    }
    let mut revoked = current.clone();
    revoked.revoked = true;
    revoked.revocation_reason = Some(reason.to_string());
    revoked.revoked_at = Some(Utc::now());
    store.compare_and_set_binding(revoked, current.generation).await?;
    Ok(())
}

/// Walks the `previous_nonce` chain, most recent first, depth-bounded at
/// 100 to prevent a corrupted cycle from looping forever.
pub async fn get_rotation_history(org_id: &str, store: &dyn IdentityStore) -> Result<Vec<NonceBinding>, TrustError> {
    Ok(store.rotation_history(org_id, ROTATION_HISTORY_MAX_DEPTH).await?)
}
