pub mod batch;
pub mod campaigns;
pub mod error;
pub mod health;
pub mod metrics;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;

    use crate::app_state::AppState;
    use crate::db::{memory::MemoryStore, CampaignStore};
    use crate::models::campaign::{Campaign, CreateCampaign};
    use crate::models::item::PostInput;
    use crate::services::generation::{Caption, GenerationCapability, GenerationError, ImageReference};
    use crate::services::orchestrator::OrchestratorConfig;

    struct StaticGenerator;

    #[async_trait]
    impl GenerationCapability for StaticGenerator {
        async fn generate_caption(&self, input: &PostInput) -> Result<Caption, GenerationError> {
            Ok(Caption(format!("Hello from {}", input.brand_name)))
        }

        async fn generate_image(&self, _input: &PostInput) -> Result<ImageReference, GenerationError> {
            Ok(ImageReference("https://images.example.com/post.png".to_string()))
        }
    }

    /// Handler state over an in-memory store. The pool never connects.
    pub fn memory_state() -> (AppState, Arc<MemoryStore>) {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_store(
            pool,
            store.clone(),
            Arc::new(StaticGenerator),
            OrchestratorConfig::default(),
        );
        (state, store)
    }

    pub async fn campaign_for(store: &MemoryStore, owner: &str) -> Campaign {
        let campaign = Campaign::new(
            owner,
            CreateCampaign {
                name: "Autumn launch".to_string(),
                description: Some("Seasonal menu".to_string()),
                brand_name: "Northwind Coffee".to_string(),
                target_audience: None,
                tone_id: Some("warm".to_string()),
            },
        );
        store.insert_campaign(&campaign).await.unwrap();
        campaign
    }
}
