//! Zone catalog endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_zone_catalog_change;
use domain::models::{CreateZoneRequest, GeofenceZone};

/// Zone catalog listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneListResponse {
    pub zones: Vec<GeofenceZone>,
    pub count: usize,
    pub active_count: usize,
}

/// List every zone in the catalog, including deactivated ones.
///
/// GET /api/v1/zones
pub async fn list_zones(State(state): State<AppState>) -> Json<ZoneListResponse> {
    let zones = state.zone_catalog.list();
    let count = zones.len();
    let active_count = state.zone_catalog.active_count();
    Json(ZoneListResponse {
        zones,
        count,
        active_count,
    })
}

/// Create a zone and make it visible to the engine.
///
/// POST /api/v1/zones
pub async fn create_zone(
    State(state): State<AppState>,
    Json(request): Json<CreateZoneRequest>,
) -> Result<(StatusCode, Json<GeofenceZone>), ApiError> {
    request.validate()?;

    let zone = state.zone_catalog.insert(request.into_zone());

    // Drop the cached zone set so the next sample sees the new zone
    state.monitor.invalidate_zone_cache().await;
    record_zone_catalog_change("created");

    Ok((StatusCode::CREATED, Json(zone)))
}

/// Zone deactivation outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateZoneResponse {
    pub zone_id: Uuid,
    pub deactivated: bool,
}

/// Retire a zone. The zone stays listed for audit but stops matching.
///
/// DELETE /api/v1/zones/:zone_id
pub async fn deactivate_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<Uuid>,
) -> Result<Json<DeactivateZoneResponse>, ApiError> {
    if !state.zone_catalog.deactivate(zone_id) {
        return Err(ApiError::NotFound(format!("Zone not found: {}", zone_id)));
    }

    state.monitor.invalidate_zone_cache().await;
    record_zone_catalog_change("deactivated");
    info!(zone_id = %zone_id, "Zone deactivated");

    Ok(Json(DeactivateZoneResponse {
        zone_id,
        deactivated: true,
    }))
}
