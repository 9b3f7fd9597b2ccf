use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::item::PostInput;
use crate::models::job::{BatchJob, JobStatus, Progress};

/// Request body for `POST /api/campaigns/{campaign_id}/generate-batch`.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchRequest {
    #[garde(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[garde(dive)]
    pub posts: Vec<PostInput>,
}

/// Final report of one `process_batch` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub status: JobStatus,
    pub total: u32,
    pub completed: u32,
    /// Every item that did not complete, including `cancelled` ones.
    pub failed: u32,
    pub cancelled: u32,
    pub processing_time_seconds: f64,
    /// One entry per submitted item, in submission order.
    pub results: Vec<ItemOutcome>,
}

/// Outcome of a single item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Completed {
        post_id: Uuid,
        brand_name: String,
        topic: String,
        caption: String,
        image_url: String,
    },
    Failed {
        post_id: Option<Uuid>,
        brand_name: String,
        error: String,
    },
    /// Never admitted because the batch was cancelled first. No record exists.
    Cancelled { brand_name: String, reason: String },
}

impl ItemOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ItemOutcome::Completed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ItemOutcome::Cancelled { .. })
    }

    /// Failure reason, for failed and cancelled outcomes.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ItemOutcome::Completed { .. } => None,
            ItemOutcome::Failed { error, .. } => Some(error),
            ItemOutcome::Cancelled { reason, .. } => Some(reason),
        }
    }
}

/// Response after accepting a batch.
#[derive(Debug, Serialize)]
pub struct SubmitBatchResponse {
    pub batch_job: BatchJob,
    pub status_url: String,
    pub message: String,
}

/// Response for `GET /api/batch-jobs/{job_id}/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchStatusResponse {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: Progress,
    pub created_by: String,
}

/// Query string for listing a campaign's batches.
#[derive(Debug, Deserialize)]
pub struct ListBatchesQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<JobStatus>,
}

fn default_limit() -> i64 {
    100
}
