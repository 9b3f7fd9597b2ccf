//! Batch generation orchestrator.
//!
//! `BatchOrchestrator::process_batch` fans a job's posts out as independent
//! tokio tasks, each gated by a [`ConcurrencyLimiter`] slot, and waits for all
//! of them to settle before recounting and finalizing the job. An item's
//! failure is recorded on that item and never aborts its siblings.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::{ItemStore, JobStore, StoreError};
use crate::models::batch::{BatchResult, ItemOutcome};
use crate::models::item::{BatchItem, ItemStatus, ItemUpdate, PostInput};
use crate::models::job::{BatchJob, CounterDelta, JobStatus};
use crate::services::cancel::CancellationSignal;
use crate::services::generation::{Caption, GenerationCapability, GenerationError, ImageReference};
use crate::services::limiter::ConcurrencyLimiter;

const DEFAULT_MAX_CONCURRENT: usize = 5;
const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Limiter capacity for one batch run.
    pub max_concurrent: usize,
    /// Upper bound on a single caption or image call.
    pub item_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            item_timeout: DEFAULT_ITEM_TIMEOUT,
        }
    }
}

/// Runs batches of posts against the generation capability.
#[derive(Clone)]
pub struct BatchOrchestrator {
    generator: Arc<dyn GenerationCapability>,
    items: Arc<dyn ItemStore>,
    jobs: Arc<dyn JobStore>,
    config: OrchestratorConfig,
}

impl BatchOrchestrator {
    pub fn new(
        generator: Arc<dyn GenerationCapability>,
        items: Arc<dyn ItemStore>,
        jobs: Arc<dyn JobStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            generator,
            items,
            jobs,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Generate every post of `job` and settle the job.
    ///
    /// Returns only after every item has reached a terminal state (or was
    /// never admitted because `cancel` was raised). The report lists outcomes
    /// in submission order. Per-item failures are part of the report; only
    /// job-level store failures surface as `Err`.
    pub async fn process_batch(
        &self,
        job: &BatchJob,
        posts: Vec<PostInput>,
        cancel: &CancellationSignal,
    ) -> Result<BatchResult, BatchError> {
        let total = u32::try_from(posts.len())
            .map_err(|_| BatchError::Validation(format!("too many posts: {}", posts.len())))?;
        if job.total != total {
            return Err(BatchError::Validation(format!(
                "job {} expects {} posts, got {}",
                job.id, job.total, total
            )));
        }

        self.jobs.mark_processing(job.id).await.map_err(|e| match e {
            StoreError::NotFound { id, .. } => BatchError::JobNotFound(id),
            other => BatchError::Start(other),
        })?;

        let limiter = ConcurrencyLimiter::new(self.config.max_concurrent);
        let start = Instant::now();

        info!(
            job_id = %job.id,
            total,
            max_concurrent = limiter.capacity(),
            "Starting batch generation"
        );

        let job_id = job.id;
        let handles = posts.into_iter().enumerate().map(|(index, input)| {
            let brand_name = input.brand_name.clone();
            let task = ItemTask {
                job_id,
                campaign_id: job.campaign_id,
                position: index + 1,
                total,
                input,
                generator: Arc::clone(&self.generator),
                items: Arc::clone(&self.items),
                jobs: Arc::clone(&self.jobs),
                item_timeout: self.config.item_timeout,
            };
            let handle = tokio::spawn(task.run(limiter.clone(), cancel.clone()));
            async move {
                handle.await.unwrap_or_else(|e| {
                    error!(job_id = %job_id, item = index + 1, error = %e, "Item task aborted");
                    ItemOutcome::Failed {
                        post_id: None,
                        brand_name,
                        error: format!("item task aborted: {e}"),
                    }
                })
            }
        });

        let results = join_all(handles).await;
        let elapsed = start.elapsed();

        // The recount is authoritative; live counters were advisory.
        let completed = results.iter().filter(|o| o.is_completed()).count() as u32;
        let cancelled = results.iter().filter(|o| o.is_cancelled()).count() as u32;
        let failed = total - completed;
        let status = JobStatus::settled(failed);

        self.jobs
            .finalize(job.id, completed, failed, status)
            .await
            .map_err(BatchError::Finalize)?;

        metrics::histogram!("batch_processing_seconds").record(elapsed.as_secs_f64());

        info!(
            job_id = %job.id,
            status = %status,
            completed,
            failed,
            cancelled,
            elapsed_secs = elapsed.as_secs_f64(),
            "Batch settled"
        );

        Ok(BatchResult {
            batch_id: job.id,
            status,
            total,
            completed,
            failed,
            cancelled,
            processing_time_seconds: elapsed.as_secs_f64(),
            results,
        })
    }
}

/// Drives one post from admission to a terminal state.
struct ItemTask {
    job_id: Uuid,
    campaign_id: Uuid,
    position: usize,
    total: u32,
    input: PostInput,
    generator: Arc<dyn GenerationCapability>,
    items: Arc<dyn ItemStore>,
    jobs: Arc<dyn JobStore>,
    item_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
enum ItemError {
    #[error("Caption generation failed: {0}")]
    Caption(#[source] GenerationError),

    #[error("Image generation failed: {0}")]
    Image(#[source] GenerationError),

    #[error("Failed to persist post: {0}")]
    Store(#[from] StoreError),
}

impl ItemTask {
    async fn run(self, limiter: ConcurrencyLimiter, cancel: CancellationSignal) -> ItemOutcome {
        let slot = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.cancelled(),
            slot = limiter.acquire() => match slot {
                Ok(slot) => slot,
                Err(_) => return self.cancelled(),
            },
        };

        // Admission and cancellation can race; nothing is persisted after cancel.
        if cancel.is_cancelled() {
            slot.release();
            return self.cancelled();
        }

        let outcome = self.settle().await;
        slot.release();
        outcome
    }

    async fn settle(&self) -> ItemOutcome {
        info!(
            job_id = %self.job_id,
            item = self.position,
            total = self.total,
            brand = %self.input.brand_name,
            "Processing post"
        );

        let item = BatchItem::new(self.job_id, self.campaign_id, self.input.clone());
        if let Err(e) = self.items.create(&item).await {
            return self.fail(None, ItemError::Store(e)).await;
        }

        match self.generate(item.id).await {
            Ok((caption, image)) => self.complete(item.id, caption.0, image.0).await,
            Err(e) => self.fail(Some(item.id), e).await,
        }
    }

    async fn complete(&self, post_id: Uuid, caption: String, image_url: String) -> ItemOutcome {
        self.bump(CounterDelta::completed()).await;
        metrics::counter!("batch_items_completed_total").increment(1);
        info!(job_id = %self.job_id, item = self.position, post_id = %post_id, "Post completed");

        ItemOutcome::Completed {
            post_id,
            brand_name: self.input.brand_name.clone(),
            topic: self.input.topic.clone(),
            caption,
            image_url,
        }
    }

    async fn generate(&self, post_id: Uuid) -> Result<(Caption, ImageReference), ItemError> {
        self.items
            .update_status(post_id, ItemUpdate::status(ItemStatus::Processing))
            .await?;

        debug!(job_id = %self.job_id, item = self.position, "Generating caption");
        self.items
            .update_status(post_id, ItemUpdate::status(ItemStatus::GeneratingCaption))
            .await?;
        let caption = self
            .timed("caption", self.generator.generate_caption(&self.input))
            .await
            .map_err(ItemError::Caption)?;

        debug!(job_id = %self.job_id, item = self.position, "Generating image");
        self.items
            .update_status(
                post_id,
                ItemUpdate::status(ItemStatus::GeneratingImage).with_caption(caption.0.clone()),
            )
            .await?;
        let image = self
            .timed("image", self.generator.generate_image(&self.input))
            .await
            .map_err(ItemError::Image)?;

        self.items
            .update_status(
                post_id,
                ItemUpdate::status(ItemStatus::Completed).with_image_url(image.0.clone()),
            )
            .await?;

        Ok((caption, image))
    }

    /// Bound a generation call by the per-item timeout.
    async fn timed<T>(
        &self,
        kind: &'static str,
        call: impl Future<Output = Result<T, GenerationError>>,
    ) -> Result<T, GenerationError> {
        let start = Instant::now();
        let result = tokio::time::timeout(self.item_timeout, call)
            .await
            .unwrap_or(Err(GenerationError::Timeout(self.item_timeout)));
        metrics::histogram!("generation_call_seconds", "kind" => kind)
            .record(start.elapsed().as_secs_f64());
        result
    }

    async fn fail(&self, post_id: Option<Uuid>, err: ItemError) -> ItemOutcome {
        let reason = err.to_string();

        if let Some(id) = post_id {
            match self.items.update_status(id, ItemUpdate::failed(reason.clone())).await {
                Ok(()) => {}
                // The row is already terminal: an earlier write committed even
                // though the store reported an error.
                Err(StoreError::NotFound { .. }) => {
                    if let Some(outcome) = self.reconcile(id).await {
                        return outcome;
                    }
                }
                Err(e) => {
                    error!(job_id = %self.job_id, post_id = %id, error = %e, "Failed to record post failure");
                }
            }
        }

        warn!(job_id = %self.job_id, item = self.position, error = %reason, "Post failed");

        self.bump(CounterDelta::failed()).await;
        metrics::counter!("batch_items_failed_total").increment(1);

        ItemOutcome::Failed {
            post_id,
            brand_name: self.input.brand_name.clone(),
            error: reason,
        }
    }

    /// Report a post whose stored row reached `completed` as completed.
    async fn reconcile(&self, post_id: Uuid) -> Option<ItemOutcome> {
        let stored = match self.items.find(post_id).await {
            Ok(stored) => stored?,
            Err(e) => {
                error!(job_id = %self.job_id, post_id = %post_id, error = %e, "Failed to re-read post");
                return None;
            }
        };
        if stored.status != ItemStatus::Completed {
            return None;
        }

        info!(job_id = %self.job_id, post_id = %post_id, "Completion was stored despite a write error");
        Some(
            self.complete(
                post_id,
                stored.generated_caption.unwrap_or_default(),
                stored.generated_image_url.unwrap_or_default(),
            )
            .await,
        )
    }

    /// Live progress only; the final recount overwrites these counters.
    async fn bump(&self, delta: CounterDelta) {
        if let Err(e) = self.jobs.update_counters(self.job_id, delta).await {
            warn!(job_id = %self.job_id, error = %e, "Failed to update live progress counters");
        }
    }

    fn cancelled(&self) -> ItemOutcome {
        debug!(job_id = %self.job_id, item = self.position, "Post skipped, batch cancelled");
        ItemOutcome::Cancelled {
            brand_name: self.input.brand_name.clone(),
            reason: "batch cancelled before this post was started".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("invalid batch: {0}")]
    Validation(String),

    #[error("batch job {0} not found")]
    JobNotFound(Uuid),

    #[error("failed to start batch: {0}")]
    Start(#[source] StoreError),

    #[error("failed to finalize batch: {0}")]
    Finalize(#[source] StoreError),
}
