//! False-positive event storage, partitioned by rule id (`spec.md` §3's
//! `partitionKey`/`sortKey` wire layout carried over on `core::FpEvent`).

use async_trait::async_trait;
use core::FpEvent;
use errors::StorageError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

const BACKEND: &str = "fp_store";
const DEFAULT_FP_EVENT_TTL_DAYS: i64 = 90;

#[async_trait]
pub trait FPStore: Send + Sync {
    /// Rejects duplicates by (ruleId, eventId) with `StorageError::AdapterConflict`
    /// (`spec.md` §6).
    async fn record(&self, event: FpEvent) -> Result<(), StorageError>;

    /// All non-expired events for a rule, ordered by `sort_key`.
    async fn events_for_rule(&self, rule_id: &str) -> Result<Vec<FpEvent>, StorageError>;

    /// Most recent `n` events for a rule.
    async fn window_by_count(&self, rule_id: &str, n: usize) -> Result<Vec<FpEvent>, StorageError> {
        let mut events = self.events_for_rule(rule_id).await?;
        if events.len() > n {
            events = events.split_off(events.len() - n);
        }
        Ok(events)
    }

    /// Events for a rule at or after `since`.
    async fn window_by_since(
        &self,
        rule_id: &str,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<FpEvent>, StorageError> {
        Ok(self
            .events_for_rule(rule_id)
            .await?
            .into_iter()
            .filter(|e| e.timestamp >= since)
            .collect())
    }

    /// Flips the most recent event matching `finding_id` under `rule_id` from
    /// false to true. `is_false_positive` may only transition false→true
    /// (`spec.md` §4.2).
    async fn mark_false_positive(
        &self,
        rule_id: &str,
        finding_id: &str,
        reviewed_by: &str,
        ticket: Option<String>,
    ) -> Result<(), StorageError>;

    /// Whether any recorded, non-expired event for (ruleId, findingId) was
    /// marked a false positive.
    async fn is_false_positive(&self, rule_id: &str, finding_id: &str) -> Result<bool, StorageError> {
        Ok(self
            .events_for_rule(rule_id)
            .await?
            .iter()
            .any(|e| e.finding_id == finding_id && e.is_false_positive))
    }
}

#[derive(Default)]
struct Partitions {
    by_rule: BTreeMap<String, BTreeMap<String, FpEvent>>,
}

impl Partitions {
    fn mark_false_positive(
        &mut self,
        rule_id: &str,
        finding_id: &str,
        reviewed_by: &str,
        ticket: Option<String>,
    ) -> Result<(), StorageError> {
        let key = format!("rule#{rule_id}");
        let Some(bucket) = self.by_rule.get_mut(&key) else {
            return Err(StorageError::NotFound { backend: BACKEND.to_string(), key: finding_id.to_string() });
        };
        let Some(event) = bucket.values_mut().rev().find(|e| e.finding_id == finding_id) else {
            return Err(StorageError::NotFound { backend: BACKEND.to_string(), key: finding_id.to_string() });
        };
        event.is_false_positive = true;
        event.reviewed_by = Some(reviewed_by.to_string());
        event.reviewed_at = Some(chrono::Utc::now());
        event.suppression_ticket = ticket;
        Ok(())
    }
}

pub struct LocalFPStore {
    path: PathBuf,
    cache: RwLock<Option<Partitions>>,
    fp_event_ttl_days: i64,
}

impl LocalFPStore {
    /// `fp_event_ttl_days` should come from `RetentionConfig.fp_event_ttl_days`.
    pub fn new_with_ttl(path: PathBuf, fp_event_ttl_days: i64) -> Self {
        Self {
            path,
            cache: RwLock::new(None),
            fp_event_ttl_days,
        }
    }

    pub fn new(path: PathBuf) -> Self {
        Self::new_with_ttl(path, DEFAULT_FP_EVENT_TTL_DAYS)
    }

    fn load(&self) -> Result<(), StorageError> {
        if self.cache.read().expect("fp store lock poisoned").is_some() {
            return Ok(());
        }
        let mut partitions = Partitions::default();
        if let Ok(contents) = std::fs::read_to_string(&self.path) {
            for line in contents.lines().filter(|l| !l.trim().is_empty()) {
                let event: FpEvent = serde_json::from_str(line).map_err(|e| StorageError::Serialization {
                    backend: BACKEND.to_string(),
                    reason: e.to_string(),
                })?;
                partitions
                    .by_rule
                    .entry(event.partition_key())
                    .or_default()
                    .insert(event.sort_key(), event);
            }
        }
        *self.cache.write().expect("fp store lock poisoned") = Some(partitions);
        Ok(())
    }

    fn persist(&self, partitions: &Partitions) -> Result<(), StorageError> {
        let mut lines = Vec::new();
        for bucket in partitions.by_rule.values() {
            for event in bucket.values() {
                lines.push(serde_json::to_string(event).map_err(|e| StorageError::Serialization {
                    backend: BACKEND.to_string(),
                    reason: e.to_string(),
                })?);
            }
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, lines.join("\n")).map_err(|e| StorageError::AdapterWrite {
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
impl FPStore for LocalFPStore {
    async fn record(&self, event: FpEvent) -> Result<(), StorageError> {
        self.load()?;
        let mut guard = self.cache.write().expect("fp store lock poisoned");
        let partitions = guard.as_mut().expect("loaded above");
        let bucket = partitions.by_rule.entry(event.partition_key()).or_default();
        if bucket.values().any(|e| e.event_id == event.event_id) {
            return Err(StorageError::AdapterConflict { backend: BACKEND.to_string(), key: event.event_id });
        }
        bucket.insert(event.sort_key(), event);
        self.persist(partitions)
    }

    async fn events_for_rule(&self, rule_id: &str) -> Result<Vec<FpEvent>, StorageError> {
        self.load()?;
        let guard = self.cache.read().expect("fp store lock poisoned");
        let partitions = guard.as_ref().expect("loaded above");
        let key = format!("rule#{rule_id}");
        let now = chrono::Utc::now();
        Ok(partitions
            .by_rule
            .get(&key)
            .map(|bucket| {
                bucket.values().filter(|e| !e.is_expired(now, self.fp_event_ttl_days)).cloned().collect()
            })
            .unwrap_or_default())
    }

    async fn mark_false_positive(
        &self,
        rule_id: &str,
        finding_id: &str,
        reviewed_by: &str,
        ticket: Option<String>,
    ) -> Result<(), StorageError> {
        self.load()?;
        let mut guard = self.cache.write().expect("fp store lock poisoned");
        let partitions = guard.as_mut().expect("loaded above");
        partitions.mark_false_positive(rule_id, finding_id, reviewed_by, ticket)?;
        self.persist(partitions)
    }
}

pub struct CloudFPStore {
    table: RwLock<Partitions>,
    fp_event_ttl_days: i64,
}

impl CloudFPStore {
    /// `fp_event_ttl_days` should come from `RetentionConfig.fp_event_ttl_days`.
    pub fn new_with_ttl(fp_event_ttl_days: i64) -> Self {
        Self {
            table: RwLock::new(Partitions::default()),
            fp_event_ttl_days,
        }
    }

    pub fn new() -> Self {
        Self::new_with_ttl(DEFAULT_FP_EVENT_TTL_DAYS)
    }
}

impl Default for CloudFPStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FPStore for CloudFPStore {
    async fn record(&self, event: FpEvent) -> Result<(), StorageError> {
        let mut guard = self.table.write().expect("fp store lock poisoned");
        let bucket = guard.by_rule.entry(event.partition_key()).or_default();
        if bucket.values().any(|e| e.event_id == event.event_id) {
            return Err(StorageError::AdapterConflict { backend: BACKEND.to_string(), key: event.event_id });
        }
        bucket.insert(event.sort_key(), event);
        Ok(())
    }

    async fn events_for_rule(&self, rule_id: &str) -> Result<Vec<FpEvent>, StorageError> {
        let key = format!("rule#{rule_id}");
        let now = chrono::Utc::now();
        Ok(self
            .table
            .read()
            .expect("fp store lock poisoned")
            .by_rule
            .get(&key)
            .map(|bucket| {
                bucket.values().filter(|e| !e.is_expired(now, self.fp_event_ttl_days)).cloned().collect()
            })
            .unwrap_or_default())
    }

    async fn mark_false_positive(
        &self,
        rule_id: &str,
        finding_id: &str,
        reviewed_by: &str,
        ticket: Option<String>,
    ) -> Result<(), StorageError> {
        self.table.write().expect("fp store lock poisoned").mark_false_positive(rule_id, finding_id, reviewed_by, ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn sample_event(rule_id: &str, event_id: &str) -> FpEvent {
        FpEvent {
            event_id: event_id.to_string(),
            rule_id: rule_id.to_string(),
            rule_version: "1.0.0".to_string(),
            finding_id: "finding-1".to_string(),
            outcome: core::Outcome::Warn,
            is_false_positive: true,
            reviewed_by: Some("reviewer@example.com".to_string()),
            reviewed_at: Some(Utc::now()),
            suppression_ticket: None,
            timestamp: Utc::now(),
            context: HashMap::new(),
            org_id_hash: "hash".to_string(),
            consent_reference: "consent-1".to_string(),
        }
    }

    #[tokio::test]
    async fn expired_events_are_excluded_from_events_for_rule() {
        let store = CloudFPStore::new_with_ttl(30);
        let mut fresh = sample_event("MD-100", "evt-fresh");
        fresh.timestamp = Utc::now() - chrono::Duration::days(10);
        let mut stale = sample_event("MD-100", "evt-stale");
        stale.timestamp = Utc::now() - chrono::Duration::days(31);
        store.record(fresh).await.unwrap();
        store.record(stale).await.unwrap();

        let events = store.events_for_rule("MD-100").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id, "evt-fresh");
    }

    #[tokio::test]
    async fn an_expired_false_positive_no_longer_suppresses_a_finding() {
        let store = CloudFPStore::new_with_ttl(30);
        let mut stale = sample_event("MD-100", "evt-stale");
        stale.finding_id = "finding-xyz".to_string();
        stale.timestamp = Utc::now() - chrono::Duration::days(31);
        store.record(stale).await.unwrap();

        assert!(!store.is_false_positive("MD-100", "finding-xyz").await.unwrap());
    }

    #[tokio::test]
    async fn local_store_partitions_by_rule_and_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fp.jsonl");
        {
            let store = LocalFPStore::new(path.clone());
            store.record(sample_event("MD-100", "evt-1")).await.unwrap();
            store.record(sample_event("MD-101", "evt-2")).await.unwrap();
        }
        let reloaded = LocalFPStore::new(path);
        assert_eq!(reloaded.events_for_rule("MD-100").await.unwrap().len(), 1);
        assert_eq!(reloaded.events_for_rule("MD-101").await.unwrap().len(), 1);
        assert!(reloaded.events_for_rule("MD-999").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_event_id_is_rejected() {
        let store = CloudFPStore::new();
        store.record(sample_event("MD-100", "evt-1")).await.unwrap();
        let err = store.record(sample_event("MD-100", "evt-1")).await.unwrap_err();
        assert!(err.is_duplicate_conflict());
    }

    #[tokio::test]
    async fn marking_false_positive_makes_is_false_positive_true() {
        let store = CloudFPStore::new();
        let mut event = sample_event("MD-101", "evt-1");
        event.is_false_positive = false;
        event.finding_id = "finding-xyz".to_string();
        store.record(event).await.unwrap();
        assert!(!store.is_false_positive("MD-101", "finding-xyz").await.unwrap());

        store.mark_false_positive("MD-101", "finding-xyz", "reviewer@example.com", Some("TICK-1".to_string())).await.unwrap();
        assert!(store.is_false_positive("MD-101", "finding-xyz").await.unwrap());
    }

    #[tokio::test]
    async fn marking_unknown_finding_is_not_found() {
        let store = CloudFPStore::new();
        store.record(sample_event("MD-100", "evt-1")).await.unwrap();
        let err = store.mark_false_positive("MD-100", "no-such-finding", "reviewer@example.com", None).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn window_by_count_returns_most_recent() {
        let store = CloudFPStore::new();
        for i in 0..5 {
            store.record(sample_event("MD-100", &format!("evt-{i}"))).await.unwrap();
        }
        assert_eq!(store.window_by_count("MD-100", 2).await.unwrap().len(), 2);
    }
}
