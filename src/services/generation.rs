use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::item::PostInput;

/// Generated caption text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Caption(pub String);

/// Reference (URL) to a generated image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageReference(pub String);

/// External capability producing a caption and an image for one post.
///
/// Implementations may be slow and may fail; every failure is reported as a
/// `GenerationError` and is confined to the item that triggered it.
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    async fn generate_caption(&self, input: &PostInput) -> Result<Caption, GenerationError>;

    async fn generate_image(&self, input: &PostInput) -> Result<ImageReference, GenerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("provider response missing {0}")]
    EmptyResponse(&'static str),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Rejected(String),
}
