use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::batch::{BatchRequest, BatchStatusResponse, ListBatchesQuery, SubmitBatchResponse};
use crate::models::item::BatchItem;
use crate::models::job::BatchJob;
use crate::routes::error::{ApiError, ApiResult};
use crate::routes::user::requesting_user;
use crate::services::cancel::CancellationSignal;

/// POST /api/campaigns/{campaign_id}/generate-batch: Accept a batch and start it.
pub async fn start_batch_generation(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<BatchRequest>,
) -> ApiResult<(StatusCode, Json<SubmitBatchResponse>)> {
    request.validate()?;
    let user = requesting_user(&headers)?;

    if state.campaigns.find_campaign(campaign_id, &user).await?.is_none() {
        return Err(ApiError::NotFound(format!("campaign {campaign_id} not found")));
    }

    let total = u32::try_from(request.posts.len())
        .map_err(|_| ApiError::Validation("too many posts in one batch".to_string()))?;
    let name = request
        .name
        .unwrap_or_else(|| format!("Batch {}", Utc::now().format("%Y%m%d_%H%M%S")));

    let job = BatchJob::new(campaign_id, name, total, user);
    state.jobs.create(&job).await?;
    metrics::counter!("batch_jobs_total").increment(1);

    tracing::info!(
        job_id = %job.id,
        campaign_id = %campaign_id,
        total,
        created_by = %job.created_by,
        "Batch accepted"
    );

    let cancel = CancellationSignal::new();
    state.running.lock().insert(job.id, cancel.clone());

    let task_state = state.clone();
    let task_job = job.clone();
    let posts = request.posts;
    tokio::spawn(async move {
        match task_state
            .orchestrator
            .process_batch(&task_job, posts, &cancel)
            .await
        {
            Ok(result) => tracing::info!(
                job_id = %result.batch_id,
                status = %result.status,
                completed = result.completed,
                failed = result.failed,
                "Background batch finished"
            ),
            Err(e) => tracing::error!(job_id = %task_job.id, error = %e, "Background batch failed"),
        }
        task_state.running.lock().remove(&task_job.id);
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitBatchResponse {
            status_url: format!("/api/batch-jobs/{}/status", job.id),
            message: "Batch accepted for generation".to_string(),
            batch_job: job,
        }),
    ))
}

/// GET /api/batch-jobs/{job_id}/status: Progress of a batch.
pub async fn get_batch_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<BatchStatusResponse>> {
    let job = find_job(&state, job_id).await?;

    Ok(Json(BatchStatusResponse {
        id: job.id,
        status: job.status,
        progress: job.progress(),
        created_by: job.created_by,
    }))
}

/// GET /api/batch-jobs/{job_id}/posts: Item records of a batch.
pub async fn get_batch_posts(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<Vec<BatchItem>>> {
    find_job(&state, job_id).await?;
    Ok(Json(state.items.list_by_job(job_id).await?))
}

/// POST /api/batch-jobs/{job_id}/cancel: Stop admitting new posts.
pub async fn cancel_batch(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let signal = state
        .running
        .lock()
        .get(&job_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("batch job {job_id} is not running")))?;

    signal.cancel();
    tracing::info!(job_id = %job_id, "Batch cancellation requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "id": job_id,
            "message": "Cancellation requested; in-flight posts will finish"
        })),
    ))
}

/// GET /api/campaigns/{campaign_id}/batches: The caller's batches for a campaign.
pub async fn get_batches_by_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Query(query): Query<ListBatchesQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<BatchJob>>> {
    let jobs = state
        .jobs
        .list_by_campaign(
            campaign_id,
            &requesting_user(&headers)?,
            query.status,
            query.skip,
            query.limit,
        )
        .await?;

    Ok(Json(jobs))
}

async fn find_job(state: &AppState, job_id: Uuid) -> ApiResult<BatchJob> {
    state
        .jobs
        .get(job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("batch job {job_id} not found")))
}
