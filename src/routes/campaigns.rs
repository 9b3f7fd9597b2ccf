use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::campaign::{Campaign, CreateCampaign, ListCampaignsQuery, UpdateCampaign};
use crate::routes::error::{ApiError, ApiResult};
use crate::routes::user::requesting_user;

/// POST /api/campaigns: Create a draft campaign for the caller.
pub async fn create_campaign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCampaign>,
) -> ApiResult<(StatusCode, Json<Campaign>)> {
    request.validate()?;
    let owner = requesting_user(&headers)?;

    let campaign = Campaign::new(owner, request);
    state.campaigns.insert_campaign(&campaign).await?;

    tracing::info!(campaign_id = %campaign.id, owner = %campaign.owner, "Campaign created");

    Ok((StatusCode::CREATED, Json(campaign)))
}

/// GET /api/campaigns: The caller's campaigns, newest first.
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<ListCampaignsQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Campaign>>> {
    let owner = requesting_user(&headers)?;
    let campaigns = state
        .campaigns
        .list_campaigns(&owner, query.skip, query.limit)
        .await?;

    Ok(Json(campaigns))
}

/// GET /api/campaigns/{campaign_id}
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<Campaign>> {
    let owner = requesting_user(&headers)?;
    Ok(Json(find_campaign(&state, campaign_id, &owner).await?))
}

/// PUT /api/campaigns/{campaign_id}: Partial update; absent fields are kept.
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    headers: HeaderMap,
    Json(update): Json<UpdateCampaign>,
) -> ApiResult<Json<Campaign>> {
    update.validate()?;
    let owner = requesting_user(&headers)?;

    let mut campaign = find_campaign(&state, campaign_id, &owner).await?;
    campaign.apply(update);
    state.campaigns.update_campaign(&campaign).await?;

    Ok(Json(campaign))
}

/// DELETE /api/campaigns/{campaign_id}: Soft delete.
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let owner = requesting_user(&headers)?;
    state.campaigns.delete_campaign(campaign_id, &owner).await?;

    tracing::info!(campaign_id = %campaign_id, owner = %owner, "Campaign deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn find_campaign(state: &AppState, campaign_id: Uuid, owner: &str) -> ApiResult<Campaign> {
    state
        .campaigns
        .find_campaign(campaign_id, owner)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("campaign {campaign_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CampaignStore, StoreError};
    use crate::models::campaign::CampaignStatus;
    use crate::routes::test_support::{campaign_for, memory_state};
    use crate::routes::user::USER_HEADER;
    use axum::http::HeaderValue;

    fn headers_for(user: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_str(user).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (state, _store) = memory_state();
        let request = CreateCampaign {
            name: "Winter gear".to_string(),
            description: None,
            brand_name: "Peak Outfitters".to_string(),
            target_audience: Some("Hikers".to_string()),
            tone_id: Some("bold".to_string()),
        };

        let (status, Json(created)) = create_campaign(State(state.clone()), headers_for("alice"), Json(request))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.status, CampaignStatus::Draft);

        let Json(fetched) = get_campaign(State(state.clone()), Path(created.id), headers_for("alice"))
            .await
            .unwrap();
        assert_eq!(fetched.brand_name, "Peak Outfitters");

        let other = get_campaign(State(state), Path(created.id), headers_for("bob")).await;
        assert!(matches!(other, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_body() {
        let (state, _store) = memory_state();
        let request = CreateCampaign {
            name: String::new(),
            description: None,
            brand_name: "Acme".to_string(),
            target_audience: None,
            tone_id: None,
        };

        let result = create_campaign(State(state), headers_for("alice"), Json(request)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let (state, store) = memory_state();
        let campaign = campaign_for(&store, "alice").await;

        let update = UpdateCampaign {
            description: Some("Holiday menu".to_string()),
            status: Some(CampaignStatus::Active),
            ..Default::default()
        };
        let Json(updated) = update_campaign(State(state), Path(campaign.id), headers_for("alice"), Json(update))
            .await
            .unwrap();

        assert_eq!(updated.description.as_deref(), Some("Holiday menu"));
        assert_eq!(updated.status, CampaignStatus::Active);
        assert_eq!(updated.name, campaign.name);

        let stored = store.find_campaign(campaign.id, "alice").await.unwrap().unwrap();
        assert_eq!(stored.status, CampaignStatus::Active);
    }

    #[tokio::test]
    async fn test_delete_hides_campaign_from_list() {
        let (state, store) = memory_state();
        let campaign = campaign_for(&store, "alice").await;

        let status = delete_campaign(State(state.clone()), Path(campaign.id), headers_for("alice"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(listed) = list_campaigns(
            State(state.clone()),
            Query(ListCampaignsQuery { skip: 0, limit: 100 }),
            headers_for("alice"),
        )
        .await
        .unwrap();
        assert!(listed.is_empty());

        let again = delete_campaign(State(state), Path(campaign.id), headers_for("alice")).await;
        assert!(matches!(again, Err(ApiError::Store(StoreError::NotFound { .. }))));
    }
}
