use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Lifecycle of a single generated post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Processing,
    GeneratingCaption,
    GeneratingImage,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Failed)
    }
}

/// Generation inputs for one post. Opaque to the orchestrator; only the
/// generation capability reads them.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct PostInput {
    #[garde(length(min = 1, max = 255))]
    pub brand_name: String,

    #[serde(default = "default_topic")]
    #[garde(length(max = 255))]
    pub topic: String,

    #[garde(length(min = 1, max = 50))]
    pub tone: String,

    #[serde(default)]
    #[garde(skip)]
    pub brief: String,

    #[serde(default = "default_target_audience")]
    #[garde(skip)]
    pub target_audience: String,
}

fn default_topic() -> String {
    "General".to_string()
}

fn default_target_audience() -> String {
    "General audience".to_string()
}

impl PostInput {
    pub fn new(brand_name: impl Into<String>, tone: impl Into<String>) -> Self {
        Self {
            brand_name: brand_name.into(),
            topic: default_topic(),
            tone: tone.into(),
            brief: String::new(),
            target_audience: default_target_audience(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = brief.into();
        self
    }
}

/// Persisted record of one post in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: Uuid,
    pub batch_job_id: Uuid,
    pub campaign_id: Uuid,
    #[serde(flatten)]
    pub input: PostInput,
    pub status: ItemStatus,
    pub generated_caption: Option<String>,
    pub generated_image_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatchItem {
    pub fn new(batch_job_id: Uuid, campaign_id: Uuid, input: PostInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            batch_job_id,
            campaign_id,
            input,
            status: ItemStatus::Pending,
            generated_caption: None,
            generated_image_url: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update in place. Unset fields keep their current value.
    pub fn apply(&mut self, update: &ItemUpdate) {
        self.status = update.status;
        if let Some(caption) = &update.caption {
            self.generated_caption = Some(caption.clone());
        }
        if let Some(url) = &update.image_url {
            self.generated_image_url = Some(url.clone());
        }
        if let Some(error) = &update.error {
            self.error_message = Some(error.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// A status transition plus whatever fields it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemUpdate {
    pub status: ItemStatus,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub error: Option<String>,
}

impl ItemUpdate {
    pub fn status(status: ItemStatus) -> Self {
        Self {
            status,
            caption: None,
            image_url: None,
            error: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ItemStatus::Failed,
            caption: None,
            image_url: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_input_defaults() {
        let input: PostInput =
            serde_json::from_str(r#"{"brand_name": "Acme", "tone": "playful"}"#).unwrap();
        assert_eq!(input.topic, "General");
        assert_eq!(input.brief, "");
        assert_eq!(input.target_audience, "General audience");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_post_input_rejects_empty_brand() {
        let input = PostInput::new("", "playful");
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut item = BatchItem::new(Uuid::new_v4(), Uuid::new_v4(), PostInput::new("Acme", "bold"));
        item.apply(&ItemUpdate::status(ItemStatus::GeneratingImage).with_caption("Hello"));
        item.apply(&ItemUpdate::status(ItemStatus::Completed).with_image_url("https://img/1.png"));

        assert_eq!(item.status, ItemStatus::Completed);
        assert_eq!(item.generated_caption.as_deref(), Some("Hello"));
        assert_eq!(item.generated_image_url.as_deref(), Some("https://img/1.png"));
        assert!(item.error_message.is_none());
    }

    #[test]
    fn test_item_status_strings() {
        assert_eq!(ItemStatus::GeneratingCaption.as_ref(), "generating_caption");
        assert_eq!("generating_image".parse::<ItemStatus>().unwrap(), ItemStatus::GeneratingImage);
        assert!(ItemStatus::Failed.is_terminal());
        assert!(!ItemStatus::Processing.is_terminal());
    }
}
