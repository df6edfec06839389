//! Circuit breaker alarm counters (`spec.md` §4.1 step 6: a rule that raises
//! too many alarms inside a reset window gets its outcome capped until the
//! window elapses). One counter per `(org_id, rule_id)` pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use errors::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterState {
    pub alarm_count: u32,
    pub window_started_at_unix: i64,
}

#[async_trait]
pub trait BlockCounter: Send + Sync {
    /// Increments the alarm count for the pair, starting a new window if
    /// `now` is past the previous window's reset point. Returns the state
    /// *after* the increment.
    async fn record_alarm(
        &self,
        org_id: &str,
        rule_id: &str,
        now: DateTime<Utc>,
        reset_after: chrono::Duration,
    ) -> Result<CounterState, StorageError>;

    async fn current(&self, org_id: &str, rule_id: &str) -> Result<Option<CounterState>, StorageError>;

    async fn reset(&self, org_id: &str, rule_id: &str) -> Result<(), StorageError>;
}

fn key(org_id: &str, rule_id: &str) -> String {
    format!("{org_id}#{rule_id}")
}

/// In-process counter table. Suitable for a single oracle instance; a
/// multi-instance deployment swaps this for a shared `Cloud` table keyed the
/// same way without touching call sites.
#[derive(Default)]
pub struct SharedBlockCounter {
    table: DashMap<String, CounterState>,
}

impl SharedBlockCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockCounter for SharedBlockCounter {
    async fn record_alarm(
        &self,
        org_id: &str,
        rule_id: &str,
        now: DateTime<Utc>,
        reset_after: chrono::Duration,
    ) -> Result<CounterState, StorageError> {
        let k = key(org_id, rule_id);
        let mut entry = self.table.entry(k).or_insert(CounterState {
            alarm_count: 0,
            window_started_at_unix: now.timestamp(),
        });
        let window_started = DateTime::from_timestamp(entry.window_started_at_unix, 0).unwrap_or(now);
        if now - window_started >= reset_after {
            entry.alarm_count = 0;
            entry.window_started_at_unix = now.timestamp();
        }
        entry.alarm_count += 1;
        Ok(*entry)
    }

    async fn current(&self, org_id: &str, rule_id: &str) -> Result<Option<CounterState>, StorageError> {
        Ok(self.table.get(&key(org_id, rule_id)).map(|e| *e))
    }

    async fn reset(&self, org_id: &str, rule_id: &str) -> Result<(), StorageError> {
        self.table.remove(&key(org_id, rule_id));
        Ok(())
    }
}

/// Identical semantics to `SharedBlockCounter`; kept as a distinct type so a
/// deployment can point the oracle at an externally visible counter table
/// (e.g. one shared across workers) without changing the trait.
pub type CloudBlockCounter = SharedBlockCounter;
