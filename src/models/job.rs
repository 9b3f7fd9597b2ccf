use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Status of a batch generation job.
///
/// A batch never settles as failed. If every item fails it is still
/// `CompletedWithErrors`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
}

impl JobStatus {
    /// Terminal status derived from the final recount.
    pub fn settled(failed: u32) -> Self {
        if failed == 0 {
            JobStatus::Completed
        } else {
            JobStatus::CompletedWithErrors
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::CompletedWithErrors)
    }
}

/// A batch generation job: one aggregate over N items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub status: JobStatus,
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatchJob {
    /// A fresh `pending` job for `total` items.
    pub fn new(campaign_id: Uuid, name: impl Into<String>, total: u32, created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            name: name.into(),
            status: JobStatus::Pending,
            total,
            completed: 0,
            failed: 0,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn progress(&self) -> Progress {
        compute_progress(self.total, self.completed, self.failed)
    }
}

/// Advisory counter increment applied while a batch is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDelta {
    pub completed: u32,
    pub failed: u32,
}

impl CounterDelta {
    pub fn completed() -> Self {
        Self { completed: 1, failed: 0 }
    }

    pub fn failed() -> Self {
        Self { completed: 0, failed: 1 }
    }
}

/// Progress snapshot of a job, derived from its counters alone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Progress {
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
    pub remaining: u32,
    pub percentage: f64,
}

/// Compute progress from `(total, completed, failed)`.
///
/// `percentage` is `completed / total * 100` rounded to one decimal place and
/// `0.0` for an empty job. `remaining` saturates at zero.
pub fn compute_progress(total: u32, completed: u32, failed: u32) -> Progress {
    let remaining = total.saturating_sub(completed).saturating_sub(failed);
    let percentage = if total == 0 {
        0.0
    } else {
        // Scale before dividing so exact tenths stay exact (3/10 -> 30.0).
        (f64::from(completed) * 1000.0 / f64::from(total)).round() / 10.0
    };

    Progress {
        total,
        completed,
        failed,
        remaining,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_is_exact_for_tenths() {
        let progress = compute_progress(10, 3, 0);
        assert_eq!(progress.percentage, 30.0);
        assert_eq!(progress.remaining, 7);
    }

    #[test]
    fn test_rounds_to_one_decimal() {
        assert_eq!(compute_progress(3, 1, 0).percentage, 33.3);
        assert_eq!(compute_progress(3, 2, 1).percentage, 66.7);
        assert_eq!(compute_progress(3, 2, 1).remaining, 0);
    }

    #[test]
    fn test_empty_job_is_zero_percent() {
        let progress = compute_progress(0, 0, 0);
        assert_eq!(progress.percentage, 0.0);
        assert_eq!(progress.remaining, 0);
    }

    #[test]
    fn test_failed_items_do_not_count_toward_percentage() {
        let progress = compute_progress(4, 2, 2);
        assert_eq!(progress.percentage, 50.0);
        assert_eq!(progress.remaining, 0);
    }

    #[test]
    fn test_remaining_never_negative() {
        assert_eq!(compute_progress(2, 2, 1).remaining, 0);
    }

    #[test]
    fn test_progress_is_deterministic() {
        assert_eq!(compute_progress(7, 3, 2), compute_progress(7, 3, 2));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(JobStatus::CompletedWithErrors.to_string(), "completed_with_errors");
        assert_eq!("processing".parse::<JobStatus>().unwrap(), JobStatus::Processing);
        assert!("failed".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_settled_status() {
        assert_eq!(JobStatus::settled(0), JobStatus::Completed);
        assert_eq!(JobStatus::settled(1), JobStatus::CompletedWithErrors);
        assert!(!JobStatus::Processing.is_terminal());
    }
}
