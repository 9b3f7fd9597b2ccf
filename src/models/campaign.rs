use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Lifecycle of a campaign. `Deleted` is a soft delete: the row stays but is
/// hidden from every read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Deleted,
}

/// A marketing campaign owned by one user. Batches are generated against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub brand_name: String,
    pub target_audience: Option<String>,
    pub tone_id: Option<String>,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// A new `draft` campaign for `owner`.
    pub fn new(owner: impl Into<String>, request: CreateCampaign) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: request.name,
            description: request.description,
            brand_name: request.brand_name,
            target_audience: request.target_audience,
            tone_id: request.tone_id,
            status: CampaignStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.status == CampaignStatus::Deleted
    }

    /// Apply a partial update. Absent fields keep their current value.
    pub fn apply(&mut self, update: UpdateCampaign) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(brand_name) = update.brand_name {
            self.brand_name = brand_name;
        }
        if let Some(target_audience) = update.target_audience {
            self.target_audience = Some(target_audience);
        }
        if let Some(tone_id) = update.tone_id {
            self.tone_id = Some(tone_id);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

/// Request body for `POST /api/campaigns`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCampaign {
    #[garde(length(min = 1, max = 255))]
    pub name: String,

    #[garde(skip)]
    pub description: Option<String>,

    #[garde(length(min = 1, max = 255))]
    pub brand_name: String,

    #[garde(skip)]
    pub target_audience: Option<String>,

    #[garde(length(min = 1, max = 20))]
    pub tone_id: Option<String>,
}

/// Request body for `PUT /api/campaigns/{campaign_id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCampaign {
    #[garde(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[garde(skip)]
    pub description: Option<String>,

    #[garde(length(min = 1, max = 255))]
    pub brand_name: Option<String>,

    #[garde(skip)]
    pub target_audience: Option<String>,

    #[garde(length(min = 1, max = 20))]
    pub tone_id: Option<String>,

    #[garde(skip)]
    pub status: Option<CampaignStatus>,
}

/// Query for `GET /api/campaigns`.
#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}
