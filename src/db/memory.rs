//! In-process stores for tests and local runs without PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::{CampaignStore, ItemStore, JobStore, StoreError};
use crate::models::campaign::{Campaign, CampaignStatus};
use crate::models::item::{BatchItem, ItemUpdate};
use crate::models::job::{BatchJob, CounterDelta, JobStatus};

/// Campaign, job and item store kept in memory behind mutexes.
#[derive(Default)]
pub struct MemoryStore {
    campaigns: Mutex<HashMap<Uuid, Campaign>>,
    jobs: Mutex<HashMap<Uuid, BatchJob>>,
    items: Mutex<Vec<BatchItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one item, if it was ever created.
    pub fn item(&self, item_id: Uuid) -> Option<BatchItem> {
        self.items.lock().iter().find(|item| item.id == item_id).cloned()
    }

    /// Every item created so far, across jobs.
    pub fn items(&self) -> Vec<BatchItem> {
        self.items.lock().clone()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, job: &BatchJob) -> Result<(), StoreError> {
        self.jobs.lock().insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<BatchJob>, StoreError> {
        Ok(self.jobs.lock().get(&job_id).cloned())
    }

    async fn list_by_campaign(
        &self,
        campaign_id: Uuid,
        created_by: &str,
        status: Option<JobStatus>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<BatchJob>, StoreError> {
        let mut jobs: Vec<BatchJob> = self
            .jobs
            .lock()
            .values()
            .filter(|job| job.campaign_id == campaign_id && job.created_by == created_by)
            .filter(|job| status.map_or(true, |s| job.status == s))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(jobs
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound {
            entity: "batch job",
            id: job_id,
        })?;
        job.status = JobStatus::Processing;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn update_counters(&self, job_id: Uuid, delta: CounterDelta) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound {
            entity: "batch job",
            id: job_id,
        })?;
        job.completed += delta.completed;
        job.failed += delta.failed;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn finalize(
        &self,
        job_id: Uuid,
        completed: u32,
        failed: u32,
        status: JobStatus,
    ) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound {
            entity: "batch job",
            id: job_id,
        })?;
        job.completed = completed;
        job.failed = failed;
        job.status = status;
        job.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create(&self, item: &BatchItem) -> Result<(), StoreError> {
        self.items.lock().push(item.clone());
        Ok(())
    }

    async fn find(&self, item_id: Uuid) -> Result<Option<BatchItem>, StoreError> {
        Ok(self.item(item_id))
    }

    async fn update_status(&self, item_id: Uuid, update: ItemUpdate) -> Result<(), StoreError> {
        let mut items = self.items.lock();
        let item = items
            .iter_mut()
            .find(|item| item.id == item_id && !item.status.is_terminal())
            .ok_or(StoreError::NotFound {
                entity: "campaign post",
                id: item_id,
            })?;
        item.apply(&update);
        Ok(())
    }

    async fn list_by_job(&self, job_id: Uuid) -> Result<Vec<BatchItem>, StoreError> {
        Ok(self
            .items
            .lock()
            .iter()
            .filter(|item| item.batch_job_id == job_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), StoreError> {
        self.campaigns.lock().insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn find_campaign(&self, campaign_id: Uuid, owner: &str) -> Result<Option<Campaign>, StoreError> {
        Ok(self
            .campaigns
            .lock()
            .get(&campaign_id)
            .filter(|c| c.owner == owner && !c.is_deleted())
            .cloned())
    }

    async fn list_campaigns(&self, owner: &str, skip: i64, limit: i64) -> Result<Vec<Campaign>, StoreError> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .lock()
            .values()
            .filter(|c| c.owner == owner && !c.is_deleted())
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(campaigns
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let mut campaigns = self.campaigns.lock();
        let stored = campaigns
            .get_mut(&campaign.id)
            .filter(|c| c.owner == campaign.owner && !c.is_deleted())
            .ok_or(StoreError::NotFound {
                entity: "campaign",
                id: campaign.id,
            })?;
        *stored = Campaign {
            updated_at: Utc::now(),
            ..campaign.clone()
        };
        Ok(())
    }

    async fn delete_campaign(&self, campaign_id: Uuid, owner: &str) -> Result<(), StoreError> {
        let mut campaigns = self.campaigns.lock();
        let stored = campaigns
            .get_mut(&campaign_id)
            .filter(|c| c.owner == owner && !c.is_deleted())
            .ok_or(StoreError::NotFound {
                entity: "campaign",
                id: campaign_id,
            })?;
        stored.status = CampaignStatus::Deleted;
        stored.updated_at = Utc::now();
        Ok(())
    }
}
