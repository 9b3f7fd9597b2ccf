//! End-to-end tests against a running server
//!
//! These tests require:
//! 1. PostgreSQL database running
//! 2. The server running on the configured address
//! 3. Valid generation provider credentials configured on the server
//!
//! Run with: cargo test --test e2e_test -- --ignored --nocapture
//!
//! Set API_BASE_URL to override default (http://localhost:8000)

mod fixtures;
mod helpers;

use fixtures::*;
use helpers::*;
use uuid::Uuid;

/// Get base URL from env or default to localhost
fn get_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

#[tokio::test]
#[ignore] // Requires running server and database
async fn test_e2e_health_check() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/health", base_url))
        .send()
        .await
        .expect("Health check failed");

    assert!(
        response.status().is_success(),
        "Health check returned non-success status: {}",
        response.status()
    );

    println!("✓ Health check passed");
}

#[tokio::test]
#[ignore] // Requires running server, database and provider credentials
async fn test_e2e_batch_settles() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();
    let campaign = create_campaign(&client, &base_url)
        .await
        .expect("Failed to create campaign");
    assert_eq!(campaign.status, "draft");

    let submitted = submit_batch(&client, &base_url, campaign.id, TEST_POSTS)
        .await
        .expect("Failed to submit batch");

    assert_eq!(submitted.batch_job.status, "pending");
    assert_eq!(submitted.batch_job.total as usize, TEST_POSTS.len());
    assert_eq!(submitted.batch_job.created_by, TEST_USER);
    assert!(submitted.status_url.ends_with("/status"));
    println!("  ✓ Batch accepted, job_id: {}", submitted.batch_job.id);

    let settled = wait_for_settlement(&client, &base_url, submitted.batch_job.id, 300)
        .await
        .expect("Batch did not settle");

    assert_eq!(settled.id, submitted.batch_job.id);
    assert_eq!(settled.progress.remaining, 0);
    assert_eq!(
        settled.progress.completed + settled.progress.failed,
        settled.progress.total
    );
    if settled.status == "completed" {
        assert_eq!(settled.progress.percentage, 100.0);
    }

    let posts: Vec<serde_json::Value> = client
        .get(format!("{}/api/batch-jobs/{}/posts", base_url, settled.id))
        .send()
        .await
        .expect("Failed to list posts")
        .json()
        .await
        .expect("Invalid posts response");
    assert_eq!(posts.len(), TEST_POSTS.len());

    println!(
        "  ✓ Batch settled as {}: {}/{} completed",
        settled.status, settled.progress.completed, settled.progress.total
    );
}

#[tokio::test]
#[ignore]
async fn test_e2e_empty_batch_completes() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let campaign = create_campaign(&client, &base_url)
        .await
        .expect("Failed to create campaign");

    let submitted = submit_batch(&client, &base_url, campaign.id, &[])
        .await
        .expect("Failed to submit empty batch");

    let settled = wait_for_settlement(&client, &base_url, submitted.batch_job.id, 10)
        .await
        .expect("Empty batch did not settle");

    assert_eq!(settled.status, "completed");
    assert_eq!(settled.progress.total, 0);
    assert_eq!(settled.progress.percentage, 0.0);
}

#[tokio::test]
#[ignore]
async fn test_e2e_invalid_batch_rejected() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let response = client
        .post(format!(
            "{}/api/campaigns/{}/generate-batch",
            base_url,
            Uuid::new_v4()
        ))
        .json(&serde_json::json!({ "posts": [{ "brand_name": "", "tone": "bold" }] }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_e2e_unknown_campaign_is_404() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let result = submit_batch(&client, &base_url, Uuid::new_v4(), TEST_POSTS).await;
    let err = result.expect_err("Batch for an unknown campaign was accepted");
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
#[ignore]
async fn test_e2e_unknown_batch_is_404() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/batch-jobs/{}/status", base_url, Uuid::new_v4()))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
