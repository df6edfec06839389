//! Secret storage abstraction for nonce material and signing keys.
//!
//! Mirrors the teacher's `SecretProvider` trait in `storage/src/secret_provider.rs`:
//! one `async_trait` interface, a `Local` realization for tests and single-node
//! deployments, and a `Cloud` realization standing in for a managed secret
//! manager. Secret values never appear in error messages or logs; callers that
//! need a loggable view go through `core::LogSafe`.

use async_trait::async_trait;
use core::NonceConfig;
use errors::SecretError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetches the current nonce material and its version.
    async fn get_nonce_config(&self) -> Result<NonceConfig, SecretError>;

    /// Fetches a specific historical version, for multi-version validation
    /// during rotation grace windows.
    async fn get_nonce_config_version(&self, version: u32) -> Result<NonceConfig, SecretError>;

    /// Publishes a newly rotated nonce as the current version.
    async fn put_nonce_config(&self, config: NonceConfig) -> Result<(), SecretError>;

    /// All currently-loaded nonce versions, newest first. Lets a validator
    /// accept a tag signed under any still-live version during a rotation
    /// grace period.
    async fn get_nonces(&self) -> Result<Vec<NonceConfig>, SecretError>;
}

/// File-backed secret store. Each version is a line `<version>\t<value>` in a
/// single file; the current version is the last line. Writes go through a
/// temp file and rename so a crash mid-write never leaves a truncated file.
pub struct LocalSecretStore {
    path: PathBuf,
    cache: RwLock<HashMap<u32, NonceConfig>>,
}

impl LocalSecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn load_all(&self) -> Result<HashMap<u32, NonceConfig>, SecretError> {
        {
            let cache = self.cache.read().expect("secret store lock poisoned");
            if !cache.is_empty() {
                return Ok(cache.clone());
            }
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|_| SecretError::SecretUnavailable)?;
        let mut versions = HashMap::new();
        for line in contents.lines() {
            let mut parts = line.splitn(2, '\t');
            let (Some(v), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            let version: u32 = v
                .parse()
                .map_err(|_| SecretError::MalformedSecret {
                    reason: format!("non-numeric version prefix: {v}"),
                })?;
            versions.insert(
                version,
                NonceConfig {
                    value: value.to_string(),
                    loaded_at: chrono::Utc::now(),
                    source: "local-file".to_string(),
                    version,
                },
            );
        }
        *self.cache.write().expect("secret store lock poisoned") = versions.clone();
        Ok(versions)
    }
}

#[async_trait]
impl SecretStore for LocalSecretStore {
    async fn get_nonce_config(&self) -> Result<NonceConfig, SecretError> {
        let versions = self.load_all()?;
        versions
            .into_values()
            .max_by_key(|c| c.version)
            .ok_or(SecretError::SecretUnavailable)
    }

    async fn get_nonce_config_version(&self, version: u32) -> Result<NonceConfig, SecretError> {
        let versions = self.load_all()?;
        versions.get(&version).cloned().ok_or(SecretError::SecretUnavailable)
    }

    async fn put_nonce_config(&self, config: NonceConfig) -> Result<(), SecretError> {
        let version = config.version;
        let mut versions = self.load_all()?;
        versions.insert(config.version, config);
        let mut lines: Vec<String> = versions
            .values()
            .map(|c| format!("{}\t{}", c.version, c.value))
            .collect();
        lines.sort();
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, lines.join("\n"))
            .map_err(|e| SecretError::RotationFailed { reason: e.to_string() })?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| SecretError::RotationFailed { reason: e.to_string() })?;
        *self.cache.write().expect("secret store lock poisoned") = versions;
        tracing::debug!(version, "rotated nonce secret");
        Ok(())
    }

    async fn get_nonces(&self) -> Result<Vec<NonceConfig>, SecretError> {
        let versions = self.load_all()?;
        let mut all: Vec<NonceConfig> = versions.into_values().collect();
        all.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(all)
    }
}

/// Stands in for a managed secret manager (e.g. a parameter store where each
/// version lives at `<prefix>_v<N>`). Backed by an in-process map here; a real
/// deployment swaps this for an SDK client without touching the trait.
pub struct CloudSecretStore {
    prefix: String,
    client: RwLock<HashMap<String, NonceConfig>>,
}

impl CloudSecretStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            client: RwLock::new(HashMap::new()),
        }
    }

    fn key(&self, version: u32) -> String {
        format!("{}_v{}", self.prefix, version)
    }
}

#[async_trait]
impl SecretStore for CloudSecretStore {
    async fn get_nonce_config(&self) -> Result<NonceConfig, SecretError> {
        let client = self.client.read().expect("secret store lock poisoned");
        client
            .values()
            .max_by_key(|c| c.version)
            .cloned()
            .ok_or(SecretError::SecretUnavailable)
    }

    async fn get_nonce_config_version(&self, version: u32) -> Result<NonceConfig, SecretError> {
        let client = self.client.read().expect("secret store lock poisoned");
        client.get(&self.key(version)).cloned().ok_or(SecretError::SecretUnavailable)
    }

    async fn put_nonce_config(&self, config: NonceConfig) -> Result<(), SecretError> {
        let key = self.key(config.version);
        self.client
            .write()
            .expect("secret store lock poisoned")
            .insert(key, config);
        Ok(())
    }

    async fn get_nonces(&self) -> Result<Vec<NonceConfig>, SecretError> {
        let client = self.client.read().expect("secret store lock poisoned");
        let mut all: Vec<NonceConfig> = client.values().cloned().collect();
        all.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_store_round_trips_through_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonce.secrets");
        let store = LocalSecretStore::new(path);
        store
            .put_nonce_config(NonceConfig {
                value: "a".repeat(32),
                loaded_at: chrono::Utc::now(),
                source: "test".into(),
                version: 1,
            })
            .await
            .unwrap();
        store
            .put_nonce_config(NonceConfig {
                value: "b".repeat(32),
                loaded_at: chrono::Utc::now(),
                source: "test".into(),
                version: 2,
            })
            .await
            .unwrap();
        let current = store.get_nonce_config().await.unwrap();
        assert_eq!(current.version, 2);
        let v1 = store.get_nonce_config_version(1).await.unwrap();
        assert_eq!(v1.value, "a".repeat(32));
    }

    #[tokio::test]
    async fn get_nonces_returns_all_versions_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonce.secrets");
        let store = LocalSecretStore::new(path);
        for version in [1, 2, 3] {
            store
                .put_nonce_config(NonceConfig {
                    value: version.to_string().repeat(32),
                    loaded_at: chrono::Utc::now(),
                    source: "test".into(),
                    version,
                })
                .await
                .unwrap();
        }
        let all = store.get_nonces().await.unwrap();
        assert_eq!(all.iter().map(|c| c.version).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn missing_secret_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.secrets");
        let store = LocalSecretStore::new(path);
        let err = store.get_nonce_config().await.unwrap_err();
        assert!(matches!(err, SecretError::SecretUnavailable));
    }

    #[tokio::test]
    async fn cloud_store_keys_by_prefix_and_version() {
        let store = CloudSecretStore::new("oracle/nonce");
        store
            .put_nonce_config(NonceConfig {
                value: "c".repeat(32),
                loaded_at: chrono::Utc::now(),
                source: "cloud".into(),
                version: 5,
            })
            .await
            .unwrap();
        let got = store.get_nonce_config_version(5).await.unwrap();
        assert_eq!(got.version, 5);
        assert!(store.get_nonce_config_version(6).await.is_err());
    }
}
