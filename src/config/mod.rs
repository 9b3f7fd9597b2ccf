use serde::Deserialize;
use std::time::Duration;

use crate::services::orchestrator::OrchestratorConfig;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// API key for the generation provider
    pub openai_api_key: String,

    /// Generation provider API root
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Chat model used for captions
    #[serde(default = "default_caption_model")]
    pub caption_model: String,

    /// Image model used for post images
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Items in flight per batch. Keep under the provider's rate limit.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Timeout for a single caption or image call, in seconds
    #[serde(default = "default_item_timeout_secs")]
    pub item_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_caption_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_max_concurrent() -> usize {
    5
}

fn default_item_timeout_secs() -> u64 {
    120
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_concurrent: self.max_concurrent.max(1),
            item_timeout: Duration::from_secs(self.item_timeout_secs),
        }
    }
}
