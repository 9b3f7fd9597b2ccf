use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::item::PostInput;
use crate::services::generation::{Caption, GenerationCapability, GenerationError, ImageReference};

/// Client for the OpenAI chat and image generation endpoints.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    caption_model: String,
    image_model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        caption_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            caption_model: caption_model.into(),
            image_model: image_model.into(),
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, GenerationError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl GenerationCapability for OpenAiClient {
    async fn generate_caption(&self, input: &PostInput) -> Result<Caption, GenerationError> {
        let request_body = serde_json::json!({
            "model": self.caption_model,
            "messages": [{ "role": "user", "content": caption_prompt(input) }],
            "max_tokens": 500,
            "temperature": 0.7
        });

        let chat: ChatResponse = self.post_json("/chat/completions", &request_body).await?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .map(Caption)
            .ok_or(GenerationError::EmptyResponse("caption"))
    }

    async fn generate_image(&self, input: &PostInput) -> Result<ImageReference, GenerationError> {
        let request_body = serde_json::json!({
            "model": self.image_model,
            "prompt": image_prompt(input),
            "size": "1024x1024",
            "quality": "standard",
            "n": 1
        });

        let images: ImageResponse = self.post_json("/images/generations", &request_body).await?;

        images
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .map(ImageReference)
            .ok_or(GenerationError::EmptyResponse("image url"))
    }
}

fn caption_prompt(input: &PostInput) -> String {
    format!(
        "Create an engaging Instagram caption for:\n\
         Brand: {brand}\n\
         Topic: {topic}\n\
         Tone: {tone}\n\
         Target Audience: {audience}\n\
         Brief: {brief}\n\n\
         Requirements:\n\
         - Match the {tone} tone\n\
         - Include 5-8 relevant hashtags\n\
         - Add appropriate emojis\n\
         - Keep under 2000 characters\n\
         - Include call-to-action",
        brand = input.brand_name,
        topic = input.topic,
        tone = input.tone,
        audience = input.target_audience,
        brief = input.brief,
    )
}

fn image_prompt(input: &PostInput) -> String {
    format!(
        "Professional Instagram post image for {brand}.\n\
         Topic: {topic}\n\
         Style: {tone} and appealing\n\
         Brief: {brief}\n\
         High quality, 1:1 aspect ratio, vibrant colors, no text overlay.",
        brand = input.brand_name,
        topic = input.topic,
        tone = input.tone,
        brief = input.brief,
    )
}
