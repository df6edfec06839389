//! Identity and nonce-binding storage (`spec.md` §4.4). Rotation is
//! compare-and-set on `NonceBinding.generation` so two concurrent rotation
//! requests for the same org can't both succeed.

use async_trait::async_trait;
use core::{NonceBinding, OrganizationIdentity};
use errors::StorageError;
use std::collections::HashMap;
use std::sync::RwLock;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_identity(&self, org_id: &str) -> Result<Option<OrganizationIdentity>, StorageError>;
    async fn put_identity(&self, identity: OrganizationIdentity) -> Result<(), StorageError>;

    async fn get_binding(&self, nonce: &str) -> Result<Option<NonceBinding>, StorageError>;
    async fn get_binding_for_org(&self, org_id: &str) -> Result<Option<NonceBinding>, StorageError>;

    /// Inserts or replaces a binding only if `expected_generation` matches
    /// the stored binding's current generation (or the org has no binding
    /// yet and `expected_generation` is `0`). Returns
    /// `StorageError::AdapterConflict` on mismatch.
    async fn compare_and_set_binding(
        &self,
        new_binding: NonceBinding,
        expected_generation: u64,
    ) -> Result<(), StorageError>;

    /// Rotation chain for an org, most recent first, depth-bounded so a
    /// corrupted `previous_nonce` cycle can't loop forever.
    async fn rotation_history(&self, org_id: &str, max_depth: usize) -> Result<Vec<NonceBinding>, StorageError>;
}

const BACKEND: &str = "identity_store";

#[derive(Default)]
struct Tables {
    identities: HashMap<String, OrganizationIdentity>,
    bindings_by_nonce: HashMap<String, NonceBinding>,
    current_binding_by_org: HashMap<String, String>,
}

/// In-process table shared by both `Local` and `Cloud` realizations here:
/// the durability story (file vs. managed KV) doesn't change the
/// compare-and-set semantics, only where the table lives.
pub struct LocalIdentityStore {
    tables: RwLock<Tables>,
}

impl LocalIdentityStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for LocalIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for LocalIdentityStore {
    async fn get_identity(&self, org_id: &str) -> Result<Option<OrganizationIdentity>, StorageError> {
        Ok(self
            .tables
            .read()
            .expect("identity store lock poisoned")
            .identities
            .get(org_id)
            .cloned())
    }

    async fn put_identity(&self, identity: OrganizationIdentity) -> Result<(), StorageError> {
        self.tables
            .write()
            .expect("identity store lock poisoned")
            .identities
            .insert(identity.org_id.clone(), identity);
        Ok(())
    }

    async fn get_binding(&self, nonce: &str) -> Result<Option<NonceBinding>, StorageError> {
        Ok(self
            .tables
            .read()
            .expect("identity store lock poisoned")
            .bindings_by_nonce
            .get(nonce)
            .cloned())
    }

    async fn get_binding_for_org(&self, org_id: &str) -> Result<Option<NonceBinding>, StorageError> {
        let tables = self.tables.read().expect("identity store lock poisoned");
        let Some(nonce) = tables.current_binding_by_org.get(org_id) else {
            return Ok(None);
        };
        Ok(tables.bindings_by_nonce.get(nonce).cloned())
    }

    async fn compare_and_set_binding(
        &self,
        new_binding: NonceBinding,
        expected_generation: u64,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().expect("identity store lock poisoned");
        let current_generation = tables
            .current_binding_by_org
            .get(&new_binding.org_id)
            .and_then(|nonce| tables.bindings_by_nonce.get(nonce))
            .map(|b| b.generation)
            .unwrap_or(0);
        if current_generation != expected_generation {
            return Err(StorageError::AdapterConflict {
                backend: BACKEND.to_string(),
                key: new_binding.org_id.clone(),
            });
        }
        tables
            .current_binding_by_org
            .insert(new_binding.org_id.clone(), new_binding.nonce.clone());
        tables.bindings_by_nonce.insert(new_binding.nonce.clone(), new_binding);
        Ok(())
    }

    async fn rotation_history(&self, org_id: &str, max_depth: usize) -> Result<Vec<NonceBinding>, StorageError> {
        let tables = self.tables.read().expect("identity store lock poisoned");
        let mut history = Vec::new();
        let mut cursor = tables.current_binding_by_org.get(org_id).cloned();
        let mut seen = std::collections::HashSet::new();
        while let Some(nonce) = cursor {
            if history.len() >= max_depth || !seen.insert(nonce.clone()) {
                break;
            }
            let Some(binding) = tables.bindings_by_nonce.get(&nonce) else {
                break;
            };
            cursor = binding.previous_nonce.clone();
            history.push(binding.clone());
        }
        Ok(history)
    }
}

/// Same in-process table as `LocalIdentityStore`; distinguished so an oracle
/// deployment can depend on the `Cloud` name while this crate still has no
/// managed-database client wired in.
pub type CloudIdentityStore = LocalIdentityStore;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn binding(org_id: &str, nonce: &str, previous: Option<&str>, generation: u64) -> NonceBinding {
        NonceBinding {
            nonce: nonce.to_string(),
            org_id: org_id.to_string(),
            public_key: "pub-key".to_string(),
            signature: "sig".to_string(),
            bound_at: Utc::now(),
            revoked: false,
            revocation_reason: None,
            revoked_at: None,
            previous_nonce: previous.map(str::to_string),
            usage_count: 0,
            generation,
        }
    }

    #[tokio::test]
    async fn cas_rejects_stale_generation() {
        let store = LocalIdentityStore::new();
        store.compare_and_set_binding(binding("org-1", "nonce-1", None, 0), 0).await.unwrap();
        let err = store
            .compare_and_set_binding(binding("org-1", "nonce-2", Some("nonce-1"), 0), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AdapterConflict { .. }));
        store
            .compare_and_set_binding(binding("org-1", "nonce-2", Some("nonce-1"), 1), 1)
            .await
            .unwrap();
        let current = store.get_binding_for_org("org-1").await.unwrap().unwrap();
        assert_eq!(current.nonce, "nonce-2");
    }

    #[tokio::test]
    async fn rotation_history_is_depth_bounded_and_cycle_safe() {
        let store = LocalIdentityStore::new();
        store.compare_and_set_binding(binding("org-1", "n0", None, 0), 0).await.unwrap();
        store.compare_and_set_binding(binding("org-1", "n1", Some("n0"), 1), 1).await.unwrap();
        store.compare_and_set_binding(binding("org-1", "n2", Some("n1"), 2), 2).await.unwrap();

        let history = store.rotation_history("org-1", 2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].nonce, "n2");
        assert_eq!(history[1].nonce, "n1");

        let full = store.rotation_history("org-1", 100).await.unwrap();
        assert_eq!(full.len(), 3);
    }
}
