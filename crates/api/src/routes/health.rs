//! Health check and status endpoint handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub zone_provider: ZoneProviderHealth,
}

/// Zone provider health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ZoneProviderHealth {
    /// True while zone lookups fall back to the empty set.
    pub degraded: bool,
    pub active_zones: usize,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Operational summary for dashboards.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub service: String,
    pub version: String,
    pub scorer: String,
    pub entities_tracked: usize,
    pub zones_active: usize,
    pub zone_cache_degraded: bool,
    pub activity_records: usize,
}

/// Full health check endpoint.
///
/// The engine keeps processing samples when the zone provider fails, so
/// a degraded provider reports as degraded but stays 200.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (active_zones, degraded) = state.monitor.zone_status().await;

    Json(HealthResponse {
        status: if degraded { "degraded" } else { "healthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        zone_provider: ZoneProviderHealth {
            degraded,
            active_zones,
        },
    })
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// All state is process-local, so the service is ready as soon as it
/// accepts connections.
pub async fn ready() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ready".to_string(),
    })
}

/// Operational status endpoint.
///
/// GET /api/v1/status
pub async fn status(State(state): State<AppState>) -> Json<StatusSummary> {
    let (zones_active, zone_cache_degraded) = state.monitor.zone_status().await;

    Json(StatusSummary {
        service: "tourist-monitor".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        scorer: state.monitor.scorer_name().to_string(),
        entities_tracked: state.monitor.entity_count(),
        zones_active,
        zone_cache_degraded,
        activity_records: state.activity_log.total_entries(),
    })
}
