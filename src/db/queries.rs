use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::db::{CampaignStore, ItemStore, JobStore, StoreError};
use crate::models::campaign::{Campaign, CampaignStatus};
use crate::models::item::{BatchItem, ItemStatus, ItemUpdate, PostInput};
use crate::models::job::{BatchJob, CounterDelta, JobStatus};

const JOB_COLUMNS: &str = "id, campaign_id, name, status, total_posts, completed_posts, \
                           failed_posts, created_by, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, batch_job_id, campaign_id, brand_name, topic, tone, brief, \
                            target_audience, generated_caption, generated_image_url, status, \
                            error_message, created_at, updated_at";

const CAMPAIGN_COLUMNS: &str = "id, owner, name, description, brand_name, target_audience, \
                                tone_id, status, created_at, updated_at";

/// PostgreSQL-backed campaign, job and item store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn read_count(row: &PgRow, column: &str) -> Result<u32, StoreError> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

fn job_from_row(row: &PgRow) -> Result<BatchJob, StoreError> {
    let status_str: String = row.try_get("status")?;
    let status = status_str
        .parse::<JobStatus>()
        .map_err(|_| StoreError::InvalidStatus(status_str.clone()))?;

    Ok(BatchJob {
        id: row.try_get("id")?,
        campaign_id: row.try_get("campaign_id")?,
        name: row.try_get("name")?,
        status,
        total: read_count(row, "total_posts")?,
        completed: read_count(row, "completed_posts")?,
        failed: read_count(row, "failed_posts")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<BatchItem, StoreError> {
    let status_str: String = row.try_get("status")?;
    let status = status_str
        .parse::<ItemStatus>()
        .map_err(|_| StoreError::InvalidStatus(status_str.clone()))?;

    Ok(BatchItem {
        id: row.try_get("id")?,
        batch_job_id: row.try_get("batch_job_id")?,
        campaign_id: row.try_get("campaign_id")?,
        input: PostInput {
            brand_name: row.try_get("brand_name")?,
            topic: row.try_get("topic")?,
            tone: row.try_get("tone")?,
            brief: row.try_get("brief")?,
            target_audience: row.try_get("target_audience")?,
        },
        status,
        generated_caption: row.try_get("generated_caption")?,
        generated_image_url: row.try_get("generated_image_url")?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn campaign_from_row(row: &PgRow) -> Result<Campaign, StoreError> {
    let status_str: String = row.try_get("status")?;
    let status = status_str
        .parse::<CampaignStatus>()
        .map_err(|_| StoreError::InvalidStatus(status_str.clone()))?;

    Ok(Campaign {
        id: row.try_get("id")?,
        owner: row.try_get("owner")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        brand_name: row.try_get("brand_name")?,
        target_audience: row.try_get("target_audience")?,
        tone_id: row.try_get("tone_id")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn ensure_found(rows_affected: u64, entity: &'static str, id: Uuid) -> Result<(), StoreError> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound { entity, id });
    }
    Ok(())
}

#[async_trait]
impl JobStore for PgStore {
    async fn create(&self, job: &BatchJob) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO batch_jobs
                (id, campaign_id, name, status, total_posts, completed_posts, failed_posts,
                 created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(job.id)
        .bind(job.campaign_id)
        .bind(&job.name)
        .bind(job.status.as_ref())
        .bind(i64::from(job.total))
        .bind(i64::from(job.completed))
        .bind(i64::from(job.failed))
        .bind(&job.created_by)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<BatchJob>, StoreError> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM batch_jobs WHERE id = $1"))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn list_by_campaign(
        &self,
        campaign_id: Uuid,
        created_by: &str,
        status: Option<JobStatus>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<BatchJob>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM batch_jobs
            WHERE campaign_id = $1
              AND created_by = $2
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY created_at DESC
            OFFSET $4
            LIMIT $5
            "#
        ))
        .bind(campaign_id)
        .bind(created_by)
        .bind(status.map(|s| s.to_string()))
        .bind(skip.max(0))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(job_from_row).collect()
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE batch_jobs
            SET status = 'processing', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected(), "batch job", job_id)
    }

    async fn update_counters(&self, job_id: Uuid, delta: CounterDelta) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE batch_jobs
            SET completed_posts = completed_posts + $1,
                failed_posts = failed_posts + $2,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(i64::from(delta.completed))
        .bind(i64::from(delta.failed))
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected(), "batch job", job_id)
    }

    async fn finalize(
        &self,
        job_id: Uuid,
        completed: u32,
        failed: u32,
        status: JobStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE batch_jobs
            SET completed_posts = $1,
                failed_posts = $2,
                status = $3,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(i64::from(completed))
        .bind(i64::from(failed))
        .bind(status.as_ref())
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected(), "batch job", job_id)
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn create(&self, item: &BatchItem) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO campaign_posts
                (id, batch_job_id, campaign_id, brand_name, topic, tone, brief, target_audience,
                 status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(item.id)
        .bind(item.batch_job_id)
        .bind(item.campaign_id)
        .bind(&item.input.brand_name)
        .bind(&item.input.topic)
        .bind(&item.input.tone)
        .bind(&item.input.brief)
        .bind(&item.input.target_audience)
        .bind(item.status.as_ref())
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, item_id: Uuid) -> Result<Option<BatchItem>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM campaign_posts WHERE id = $1"))
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn update_status(&self, item_id: Uuid, update: ItemUpdate) -> Result<(), StoreError> {
        // Terminal rows are never rewritten.
        let result = sqlx::query(
            r#"
            UPDATE campaign_posts
            SET status = $1,
                generated_caption = COALESCE($2, generated_caption),
                generated_image_url = COALESCE($3, generated_image_url),
                error_message = COALESCE($4, error_message),
                updated_at = NOW()
            WHERE id = $5
              AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(update.status.as_ref())
        .bind(update.caption)
        .bind(update.image_url)
        .bind(update.error)
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected(), "campaign post", item_id)
    }

    async fn list_by_job(&self, job_id: Uuid) -> Result<Vec<BatchItem>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM campaign_posts WHERE batch_job_id = $1 ORDER BY created_at ASC"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }
}

#[async_trait]
impl CampaignStore for PgStore {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO campaigns
                (id, owner, name, description, brand_name, target_audience, tone_id, status,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(campaign.id)
        .bind(&campaign.owner)
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(&campaign.brand_name)
        .bind(&campaign.target_audience)
        .bind(&campaign.tone_id)
        .bind(campaign.status.as_ref())
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_campaign(&self, campaign_id: Uuid, owner: &str) -> Result<Option<Campaign>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1 AND owner = $2 AND status <> 'deleted'"
        ))
        .bind(campaign_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(campaign_from_row).transpose()
    }

    async fn list_campaigns(&self, owner: &str, skip: i64, limit: i64) -> Result<Vec<Campaign>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CAMPAIGN_COLUMNS}
            FROM campaigns
            WHERE owner = $1 AND status <> 'deleted'
            ORDER BY created_at DESC
            OFFSET $2
            LIMIT $3
            "#
        ))
        .bind(owner)
        .bind(skip.max(0))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(campaign_from_row).collect()
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET name = $1,
                description = $2,
                brand_name = $3,
                target_audience = $4,
                tone_id = $5,
                status = $6,
                updated_at = NOW()
            WHERE id = $7
              AND owner = $8
              AND status <> 'deleted'
            "#,
        )
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(&campaign.brand_name)
        .bind(&campaign.target_audience)
        .bind(&campaign.tone_id)
        .bind(campaign.status.as_ref())
        .bind(campaign.id)
        .bind(&campaign.owner)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected(), "campaign", campaign.id)
    }

    async fn delete_campaign(&self, campaign_id: Uuid, owner: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET status = 'deleted', updated_at = NOW()
            WHERE id = $1
              AND owner = $2
              AND status <> 'deleted'
            "#,
        )
        .bind(campaign_id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        ensure_found(result.rows_affected(), "campaign", campaign_id)
    }
}
