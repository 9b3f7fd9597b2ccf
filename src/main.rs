use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use campaign_batch_gen::{
    app_state::AppState,
    config::AppConfig,
    db,
    routes::{batch, campaigns, health, metrics as metrics_route},
    services::openai::OpenAiClient,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing campaign batch generation server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("batch_jobs_total", "Total batch jobs submitted");
    metrics::describe_counter!(
        "batch_items_completed_total",
        "Posts that reached the completed state"
    );
    metrics::describe_counter!(
        "batch_items_failed_total",
        "Posts that reached the failed state"
    );
    metrics::describe_gauge!(
        "batch_items_in_flight",
        "Posts currently holding a concurrency slot"
    );
    metrics::describe_histogram!(
        "batch_processing_seconds",
        "Wall time to settle one batch"
    );
    metrics::describe_histogram!(
        "generation_call_seconds",
        "Latency of a single caption or image generation call"
    );

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let generator = OpenAiClient::new(
        &config.openai_base_url,
        &config.openai_api_key,
        &config.caption_model,
        &config.image_model,
    );

    let orchestrator_config = config.orchestrator();
    tracing::info!(
        max_concurrent = orchestrator_config.max_concurrent,
        item_timeout_secs = orchestrator_config.item_timeout.as_secs(),
        "Batch orchestrator configured"
    );

    let state = AppState::new(db_pool, Arc::new(generator), orchestrator_config);

    let app = Router::new()
        .route("/api/health", get(health::health_check))
        .route(
            "/api/campaigns",
            get(campaigns::list_campaigns).post(campaigns::create_campaign),
        )
        .route(
            "/api/campaigns/{campaign_id}",
            get(campaigns::get_campaign)
                .put(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route(
            "/api/campaigns/{campaign_id}/generate-batch",
            post(batch::start_batch_generation),
        )
        .route(
            "/api/campaigns/{campaign_id}/batches",
            get(batch::get_batches_by_campaign),
        )
        .route("/api/batch-jobs/{job_id}/status", get(batch::get_batch_status))
        .route("/api/batch-jobs/{job_id}/posts", get(batch::get_batch_posts))
        .route("/api/batch-jobs/{job_id}/cancel", post(batch::cancel_batch))
        .with_state(state)
        .route(
            "/metrics",
            get(metrics_route::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
