//! Consent record storage for cross-org contribution data (`spec.md` §4.4:
//! every contribution the Byzantine filter ingests must carry a consent
//! reference resolvable here).

use async_trait::async_trait;
use core::ConsentRecord;
use errors::StorageError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

const BACKEND: &str = "consent_store";

#[async_trait]
pub trait ConsentStore: Send + Sync {
    async fn get(&self, org_id_hash: &str, repo_id: &str) -> Result<Option<ConsentRecord>, StorageError>;
    async fn put(&self, record: ConsentRecord) -> Result<(), StorageError>;
}

fn key(org_id_hash: &str, repo_id: &str) -> String {
    format!("{org_id_hash}#{repo_id}")
}

pub struct LocalConsentStore {
    path: PathBuf,
    cache: RwLock<Option<HashMap<String, ConsentRecord>>>,
}

impl LocalConsentStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: RwLock::new(None),
        }
    }

    fn load(&self) -> Result<(), StorageError> {
        if self.cache.read().expect("consent store lock poisoned").is_some() {
            return Ok(());
        }
        let mut map = HashMap::new();
        if let Ok(contents) = std::fs::read_to_string(&self.path) {
            let records: Vec<ConsentRecord> =
                serde_json::from_str(&contents).map_err(|e| StorageError::Serialization {
                    backend: BACKEND.to_string(),
                    reason: e.to_string(),
                })?;
            for record in records {
                map.insert(key(&record.org_id_hash, &record.repo_id), record);
            }
        }
        *self.cache.write().expect("consent store lock poisoned") = Some(map);
        Ok(())
    }

    fn persist(&self, map: &HashMap<String, ConsentRecord>) -> Result<(), StorageError> {
        let values: Vec<&ConsentRecord> = map.values().collect();
        let serialized = serde_json::to_string(&values).map_err(|e| StorageError::Serialization {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serialized).map_err(|e| StorageError::AdapterWrite {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::AdapterWrite {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ConsentStore for LocalConsentStore {
    async fn get(&self, org_id_hash: &str, repo_id: &str) -> Result<Option<ConsentRecord>, StorageError> {
        self.load()?;
        Ok(self
            .cache
            .read()
            .expect("consent store lock poisoned")
            .as_ref()
            .expect("loaded above")
            .get(&key(org_id_hash, repo_id))
            .cloned())
    }

    async fn put(&self, record: ConsentRecord) -> Result<(), StorageError> {
        self.load()?;
        let mut guard = self.cache.write().expect("consent store lock poisoned");
        let map = guard.as_mut().expect("loaded above");
        map.insert(key(&record.org_id_hash, &record.repo_id), record);
        self.persist(map)
    }
}

pub struct CloudConsentStore {
    records: RwLock<HashMap<String, ConsentRecord>>,
}

impl CloudConsentStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for CloudConsentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConsentStore for CloudConsentStore {
    async fn get(&self, org_id_hash: &str, repo_id: &str) -> Result<Option<ConsentRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .expect("consent store lock poisoned")
            .get(&key(org_id_hash, repo_id))
            .cloned())
    }

    async fn put(&self, record: ConsentRecord) -> Result<(), StorageError> {
        self.records
            .write()
            .expect("consent store lock poisoned")
            .insert(key(&record.org_id_hash, &record.repo_id), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn round_trips_through_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalConsentStore::new(dir.path().join("consent.json"));
        assert!(store.get("hash-1", "repo-1").await.unwrap().is_none());
        store
            .put(ConsentRecord {
                org_id_hash: "hash-1".into(),
                repo_id: "repo-1".into(),
                scope: "fp-aggregation".into(),
                granted_by: "admin@example.com".into(),
                granted_at: Utc::now(),
                expires_at: None,
                revoked: false,
            })
            .await
            .unwrap();
        let got = store.get("hash-1", "repo-1").await.unwrap().unwrap();
        assert!(!got.revoked);
    }
}
