use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::models::campaign::Campaign;
use crate::models::item::{BatchItem, ItemUpdate};
use crate::models::job::{BatchJob, CounterDelta, JobStatus};

pub mod memory;
pub mod queries;

/// Initialize PostgreSQL connection pool
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}

/// Durable record of batch jobs and their aggregate counters.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &BatchJob) -> Result<(), StoreError>;

    async fn get(&self, job_id: Uuid) -> Result<Option<BatchJob>, StoreError>;

    /// Jobs of a campaign created by `created_by`, newest first.
    async fn list_by_campaign(
        &self,
        campaign_id: Uuid,
        created_by: &str,
        status: Option<JobStatus>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<BatchJob>, StoreError>;

    async fn mark_processing(&self, job_id: Uuid) -> Result<(), StoreError>;

    /// Atomically add `delta` to the live counters.
    async fn update_counters(&self, job_id: Uuid, delta: CounterDelta) -> Result<(), StoreError>;

    /// Overwrite the counters with the final recount and set the terminal status.
    async fn finalize(
        &self,
        job_id: Uuid,
        completed: u32,
        failed: u32,
        status: JobStatus,
    ) -> Result<(), StoreError>;
}

/// Durable record of individual batch items.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn create(&self, item: &BatchItem) -> Result<(), StoreError>;

    async fn find(&self, item_id: Uuid) -> Result<Option<BatchItem>, StoreError>;

    /// Apply `update` unless the item is already terminal (`NotFound` then).
    async fn update_status(&self, item_id: Uuid, update: ItemUpdate) -> Result<(), StoreError>;

    /// Items of a job in creation order.
    async fn list_by_job(&self, job_id: Uuid) -> Result<Vec<BatchItem>, StoreError>;
}

/// Campaigns owned by users. Soft-deleted campaigns are invisible to every
/// read and cannot be updated.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), StoreError>;

    async fn find_campaign(&self, campaign_id: Uuid, owner: &str) -> Result<Option<Campaign>, StoreError>;

    /// Campaigns of `owner`, newest first.
    async fn list_campaigns(&self, owner: &str, skip: i64, limit: i64) -> Result<Vec<Campaign>, StoreError>;

    /// Persist every mutable field of `campaign`.
    async fn update_campaign(&self, campaign: &Campaign) -> Result<(), StoreError>;

    async fn delete_campaign(&self, campaign_id: Uuid, owner: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("unknown status '{0}' in store")]
    InvalidStatus(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
