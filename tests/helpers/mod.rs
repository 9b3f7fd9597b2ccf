//! Test helper utilities for E2E testing

use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

use crate::fixtures::TestPostFixture;

pub const TEST_USER: &str = "e2e-tester";

/// `batch_job` portion of the POST generate-batch response
#[derive(Debug, Deserialize)]
pub struct SubmittedJob {
    pub id: Uuid,
    pub status: String,
    pub total: u32,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub batch_job: SubmittedJob,
    pub status_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Progress {
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
    pub remaining: u32,
    pub percentage: f64,
}

/// Response from GET /api/batch-jobs/{job_id}/status
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub id: Uuid,
    pub status: String,
    pub progress: Progress,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedCampaign {
    pub id: Uuid,
    pub status: String,
}

/// Create a campaign owned by `TEST_USER`
pub async fn create_campaign(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<CreatedCampaign, Box<dyn std::error::Error>> {
    let response = client
        .post(format!("{}/api/campaigns", base_url))
        .header("x-user", TEST_USER)
        .json(&serde_json::json!({
            "name": "E2E campaign",
            "brand_name": "Northwind Coffee",
            "tone_id": "warm",
        }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await?;
        return Err(format!("Campaign create failed with status {}: {}", status, error_text).into());
    }

    Ok(response.json::<CreatedCampaign>().await?)
}

/// Submit a batch for a campaign
pub async fn submit_batch(
    client: &reqwest::Client,
    base_url: &str,
    campaign_id: Uuid,
    posts: &[TestPostFixture],
) -> Result<SubmitResponse, Box<dyn std::error::Error>> {
    let body = serde_json::json!({
        "name": "E2E batch",
        "posts": posts.iter().map(TestPostFixture::to_json).collect::<Vec<_>>(),
    });

    let response = client
        .post(format!("{}/api/campaigns/{}/generate-batch", base_url, campaign_id))
        .header("x-user", TEST_USER)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await?;
        return Err(format!("Submit failed with status {}: {}", status, error_text).into());
    }

    Ok(response.json::<SubmitResponse>().await?)
}

/// Poll batch status until it settles (with timeout)
pub async fn wait_for_settlement(
    client: &reqwest::Client,
    base_url: &str,
    job_id: Uuid,
    timeout_secs: u64,
) -> Result<StatusResponse, Box<dyn std::error::Error>> {
    let max_attempts = timeout_secs * 2; // Poll every 500ms

    for attempt in 0..max_attempts {
        let response = client
            .get(format!("{}/api/batch-jobs/{}/status", base_url, job_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Status check failed: {}", error_text).into());
        }

        let status = response.json::<StatusResponse>().await?;

        match status.status.as_str() {
            "completed" | "completed_with_errors" => return Ok(status),
            "pending" | "processing" => {
                if attempt % 10 == 0 && attempt > 0 {
                    println!(
                        "  ... {}/{} settled (attempt {}/{})",
                        status.progress.completed + status.progress.failed,
                        status.progress.total,
                        attempt,
                        max_attempts
                    );
                }
                sleep(Duration::from_millis(500)).await;
            }
            other => return Err(format!("Unknown batch status: {}", other).into()),
        }
    }

    Err(format!("Batch did not settle within {} seconds", timeout_secs).into())
}
