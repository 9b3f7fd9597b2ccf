use parking_lot::Mutex;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{queries::PgStore, CampaignStore, ItemStore, JobStore};
use crate::services::{
    cancel::CancellationSignal,
    generation::GenerationCapability,
    orchestrator::{BatchOrchestrator, OrchestratorConfig},
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub campaigns: Arc<dyn CampaignStore>,
    pub jobs: Arc<dyn JobStore>,
    pub items: Arc<dyn ItemStore>,
    pub orchestrator: BatchOrchestrator,
    /// Cancellation handles of batches running in this process.
    pub running: Arc<Mutex<HashMap<Uuid, CancellationSignal>>>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        generator: Arc<dyn GenerationCapability>,
        config: OrchestratorConfig,
    ) -> Self {
        let store = Arc::new(PgStore::new(db.clone()));
        Self::with_store(db, store, generator, config)
    }

    /// State backed by any store that holds campaigns, jobs and items.
    pub fn with_store<S>(
        db: PgPool,
        store: Arc<S>,
        generator: Arc<dyn GenerationCapability>,
        config: OrchestratorConfig,
    ) -> Self
    where
        S: CampaignStore + JobStore + ItemStore + 'static,
    {
        let campaigns: Arc<dyn CampaignStore> = store.clone();
        let jobs: Arc<dyn JobStore> = store.clone();
        let items: Arc<dyn ItemStore> = store;

        Self {
            db,
            orchestrator: BatchOrchestrator::new(generator, Arc::clone(&items), Arc::clone(&jobs), config),
            campaigns,
            jobs,
            items,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}
