//! Reputation and stake storage for the calibration engine's Byzantine
//! filter (`spec.md` §4.2).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core::{ContributionRecord, OrganizationReputation, StakePledge};
use errors::StorageError;
use std::collections::HashMap;
use std::sync::RwLock;

#[async_trait]
pub trait ReputationStore: Send + Sync {
    async fn get_reputation(&self, org_id: &str) -> Result<Option<OrganizationReputation>, StorageError>;
    async fn put_reputation(&self, reputation: OrganizationReputation) -> Result<(), StorageError>;

    async fn get_stake(&self, org_id: &str) -> Result<Option<StakePledge>, StorageError>;
    async fn put_stake(&self, stake: StakePledge) -> Result<(), StorageError>;

    async fn record_contribution(&self, record: ContributionRecord) -> Result<(), StorageError>;
    async fn contributions_for_rule(&self, rule_id: &str) -> Result<Vec<ContributionRecord>, StorageError>;

    /// Applies `OrganizationReputation::slash` to the stored record and
    /// persists it, the write-back half of the consistency-refresh feedback
    /// loop (`spec.md` §4.4). A no-op if the org has no reputation record
    /// yet. Default-implemented over `get_reputation`/`put_reputation` so
    /// no adapter has to hand-roll the read-modify-write.
    async fn slash(&self, org_id: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
        if let Some(mut reputation) = self.get_reputation(org_id).await? {
            reputation.slash(now);
            self.put_reputation(reputation).await?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Tables {
    reputations: HashMap<String, OrganizationReputation>,
    stakes: HashMap<String, StakePledge>,
    contributions_by_rule: HashMap<String, Vec<ContributionRecord>>,
}

pub struct LocalReputationStore {
    tables: RwLock<Tables>,
}

impl LocalReputationStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for LocalReputationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReputationStore for LocalReputationStore {
    async fn get_reputation(&self, org_id: &str) -> Result<Option<OrganizationReputation>, StorageError> {
        Ok(self
            .tables
            .read()
            .expect("reputation store lock poisoned")
            .reputations
            .get(org_id)
            .cloned())
    }

    async fn put_reputation(&self, reputation: OrganizationReputation) -> Result<(), StorageError> {
        self.tables
            .write()
            .expect("reputation store lock poisoned")
            .reputations
            .insert(reputation.org_id.clone(), reputation);
        Ok(())
    }

    async fn get_stake(&self, org_id: &str) -> Result<Option<StakePledge>, StorageError> {
        Ok(self
            .tables
            .read()
            .expect("reputation store lock poisoned")
            .stakes
            .get(org_id)
            .cloned())
    }

    async fn put_stake(&self, stake: StakePledge) -> Result<(), StorageError> {
        self.tables
            .write()
            .expect("reputation store lock poisoned")
            .stakes
            .insert(stake.org_id.clone(), stake);
        Ok(())
    }

    async fn record_contribution(&self, record: ContributionRecord) -> Result<(), StorageError> {
        self.tables
            .write()
            .expect("reputation store lock poisoned")
            .contributions_by_rule
            .entry(record.rule_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn contributions_for_rule(&self, rule_id: &str) -> Result<Vec<ContributionRecord>, StorageError> {
        Ok(self
            .tables
            .read()
            .expect("reputation store lock poisoned")
            .contributions_by_rule
            .get(rule_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Same in-process table as `LocalReputationStore`; a deployment that shares
/// reputation across oracle instances points this at a managed KV client
/// instead without changing the trait.
pub type CloudReputationStore = LocalReputationStore;
