//! Generic keyed object storage for baselines and persisted reports.
//!
//! Grounded on the same adapter shape as `secret_store`, generalized from
//! secret strings to arbitrary JSON blobs (the teacher's `rlm_weights.rs`
//! persists one JSON-shaped struct per tenant key; this persists one per
//! object key).

use async_trait::async_trait;
use errors::StorageError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

const BACKEND: &str = "object_store";

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn put(&self, key: &str, value: Value) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Fetches a repo's persisted drift/calibration baseline, if one has
    /// ever been written by a `persist_baseline: true` evaluation.
    async fn get_baseline(&self, repo_id: &str) -> Result<Option<Value>, StorageError> {
        self.get(&baseline_key(repo_id)).await
    }

    /// Persists a repo's baseline. Only ever called by an evaluation that
    /// was explicitly asked to persist one — baseline writes are never an
    /// implicit side effect of evaluating.
    async fn put_baseline(&self, repo_id: &str, value: Value) -> Result<(), StorageError> {
        self.put(&baseline_key(repo_id), value).await
    }
}

fn baseline_key(repo_id: &str) -> String {
    format!("baselines/{repo_id}.json")
}

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize(key)))
    }
}

fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|e| StorageError::Serialization {
                    backend: BACKEND.to_string(),
                    reason: e.to_string(),
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::AdapterRead {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.root).map_err(|e| StorageError::AdapterWrite {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;
        let serialized = serde_json::to_string_pretty(&value).map_err(|e| StorageError::Serialization {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;
        let final_path = self.path_for(key);
        let tmp = final_path.with_extension("json.tmp");
        std::fs::write(&tmp, serialized).map_err(|e| StorageError::AdapterWrite {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;
        std::fs::rename(&tmp, &final_path).map_err(|e| StorageError::AdapterWrite {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(key, "wrote object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::AdapterWrite {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Stands in for an object-storage bucket client.
pub struct CloudObjectStore {
    bucket: String,
    objects: RwLock<HashMap<String, Value>>,
}

impl CloudObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ObjectStore for CloudObjectStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self
            .objects
            .read()
            .expect("object store lock poisoned")
            .get(key)
            .cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.objects
            .write()
            .expect("object store lock poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().expect("object store lock poisoned").remove(key);
        Ok(())
    }
}

impl CloudObjectStore {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}
