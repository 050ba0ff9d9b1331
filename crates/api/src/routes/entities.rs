//! Entity state, activity feed and directory endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::{AlertDelivery, AlertKind, EntityStateSnapshot};
use persistence::activity_log::ActivityPage;

/// Live view of all tracked entities.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityListResponse {
    pub entities: Vec<EntityStateSnapshot>,
    pub count: usize,
}

/// List every tracked entity, sorted by entity id.
///
/// GET /api/v1/entities
pub async fn list_entities(State(state): State<AppState>) -> Json<EntityListResponse> {
    let entities = state.monitor.entities();
    let count = entities.len();
    Json(EntityListResponse { entities, count })
}

/// Fetch the state of one tracked entity.
///
/// GET /api/v1/entities/:entity_id
pub async fn get_entity(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<EntityStateSnapshot>, ApiError> {
    state
        .monitor
        .entity_state(&entity_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Entity not found: {}", entity_id)))
}

/// Query parameters for the activity feed.
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// Page through an entity's recorded activity, newest first.
///
/// GET /api/v1/entities/:entity_id/activities
pub async fn list_activities(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityPage>, ApiError> {
    // Evicted or never-seen entities have neither state nor records
    if state.monitor.entity_state(&entity_id).is_none()
        && state.activity_log.entry_count(&entity_id) == 0
    {
        return Err(ApiError::NotFound(format!(
            "Entity not found: {}",
            entity_id
        )));
    }

    let limit = query
        .limit
        .unwrap_or(state.config.activity.default_page_limit)
        .min(state.config.activity.max_page_limit)
        .max(1);

    let page = state
        .activity_log
        .query(&entity_id, limit, query.cursor.as_deref())?;

    Ok(Json(page))
}

/// Request payload for manual alert triggering.
#[derive(Debug, Deserialize)]
pub struct TriggerAlertRequest {
    pub kind: String,
}

/// Raise an alert for a tracked entity outside the evaluation flow.
///
/// POST /api/v1/entities/:entity_id/alerts
pub async fn trigger_alert(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    Json(request): Json<TriggerAlertRequest>,
) -> Result<Json<AlertDelivery>, ApiError> {
    let kind = AlertKind::from_str(&request.kind).map_err(ApiError::Validation)?;

    let delivery = state.monitor.trigger_alert(&entity_id, kind).await?;

    info!(
        entity_id = %entity_id,
        kind = %kind,
        delivered = delivery.delivered,
        "Alert triggered manually"
    );

    Ok(Json(delivery))
}

/// Reset an entity's zone alert state without raising an exit alert.
///
/// DELETE /api/v1/entities/:entity_id/zone-alerts
pub async fn clear_zone_alerts(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<EntityStateSnapshot>, ApiError> {
    let snapshot = state.monitor.clear_zone_alerts(&entity_id)?;
    info!(entity_id = %entity_id, "Zone alert state cleared");
    Ok(Json(snapshot))
}

/// Request payload for directory registration.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDirectoryRequest {
    #[validate(custom(function = "shared::validation::validate_entity_id"))]
    pub entity_id: String,

    #[validate(custom(function = "shared::validation::validate_display_name"))]
    pub display_name: String,
}

/// Directory registration outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntryResponse {
    pub entity_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

/// Register or update an entity's display name.
///
/// POST /api/v1/directory
///
/// Names take effect for entities first seen afterwards; states already
/// tracked keep the name resolved at first contact.
pub async fn register_directory_entry(
    State(state): State<AppState>,
    Json(request): Json<RegisterDirectoryRequest>,
) -> Result<Json<DirectoryEntryResponse>, ApiError> {
    request.validate()?;

    let previous = state
        .directory
        .register(&request.entity_id, &request.display_name);

    Ok(Json(DirectoryEntryResponse {
        entity_id: request.entity_id,
        display_name: request.display_name,
        previous,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub entity_id: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListResponse {
    pub entries: Vec<DirectoryEntry>,
    pub count: usize,
}

/// List all registered display names, sorted by entity id.
///
/// GET /api/v1/directory
pub async fn list_directory(State(state): State<AppState>) -> Json<DirectoryListResponse> {
    let entries: Vec<DirectoryEntry> = state
        .directory
        .list()
        .into_iter()
        .map(|(entity_id, display_name)| DirectoryEntry {
            entity_id,
            display_name,
        })
        .collect();
    let count = entries.len();
    Json(DirectoryListResponse { entries, count })
}
