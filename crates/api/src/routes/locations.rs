//! Sample ingestion endpoint handlers.

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_samples_simulated;
use domain::models::{AnalysisResult, IngestSampleRequest};

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Ingest a single location sample.
///
/// POST /api/v1/locations
pub async fn ingest_location(
    State(state): State<AppState>,
    Json(request): Json<IngestSampleRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let result = state.monitor.ingest(request).await?;
    Ok(Json(result))
}

/// Request payload for the walk simulator.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    #[validate(custom(function = "shared::validation::validate_entity_id"))]
    pub entity_id: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub start_latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub start_longitude: f64,

    /// Number of samples to generate.
    #[serde(default = "default_steps")]
    #[validate(range(min = 1, max = 500))]
    pub steps: usize,

    /// Distance covered per step in meters.
    #[serde(default = "default_step_meters")]
    #[validate(range(min = 0.0, max = 1000.0))]
    pub step_meters: f64,

    /// Initial heading in degrees (0 = north).
    #[serde(default)]
    #[validate(range(min = 0.0, max = 360.0))]
    pub heading_degrees: f64,

    /// Seconds between consecutive samples.
    #[serde(default = "default_interval_seconds")]
    #[validate(range(min = 1, max = 3600))]
    pub interval_seconds: i64,

    /// Reported speed in m/s; derived from displacement when absent.
    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed: Option<f64>,
}

fn default_steps() -> usize {
    10
}
fn default_step_meters() -> f64 {
    10.0
}
fn default_interval_seconds() -> i64 {
    5
}

/// Simulator outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub entity_id: String,
    pub samples_processed: usize,
    pub alerts_fired: usize,
    pub last_result: AnalysisResult,
}

/// Run a simulated walk through the full monitoring pipeline.
///
/// POST /api/v1/simulate
///
/// Generates `steps` samples along a jittered heading starting in the
/// past, so the walk ends at the present moment, and feeds each one
/// through the same path as live ingestion.
pub async fn simulate_walk(
    State(state): State<AppState>,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    request.validate()?;

    // Pre-compute per-step heading jitter; the RNG must not be held
    // across an await point
    let jitters: Vec<f64> = {
        let mut rng = rand::thread_rng();
        (0..request.steps).map(|_| rng.gen_range(-15.0..=15.0)).collect()
    };

    let start_time = Utc::now() - Duration::seconds(request.interval_seconds * request.steps as i64);

    let mut latitude = request.start_latitude;
    let mut longitude = request.start_longitude;
    let mut heading = request.heading_degrees;
    let mut alerts_fired = 0;
    let mut last_result: Option<AnalysisResult> = None;

    for (i, jitter) in jitters.iter().enumerate() {
        heading += jitter;
        let (next_lat, next_lng) = step_from(latitude, longitude, heading, request.step_meters);
        latitude = next_lat;
        longitude = next_lng;

        let timestamp = start_time + Duration::seconds(request.interval_seconds * (i as i64 + 1));
        let sample = IngestSampleRequest {
            entity_id: request.entity_id.clone(),
            latitude,
            longitude,
            timestamp: Some(timestamp.timestamp_millis()),
            speed: request.speed,
        };

        let result = state.monitor.ingest(sample).await?;
        alerts_fired += result.alerts.len();
        last_result = Some(result);
    }

    // steps >= 1, so at least one sample was processed
    let last_result =
        last_result.ok_or_else(|| ApiError::Internal("Simulation produced no samples".into()))?;

    record_samples_simulated(request.steps);
    info!(
        entity_id = %request.entity_id,
        samples = request.steps,
        alerts = alerts_fired,
        "Simulated walk completed"
    );

    Ok(Json(SimulateResponse {
        entity_id: request.entity_id,
        samples_processed: request.steps,
        alerts_fired,
        last_result,
    }))
}

/// Move one step of `step_meters` along `heading_degrees` using an
/// equirectangular approximation, which is accurate at walking scale.
fn step_from(latitude: f64, longitude: f64, heading_degrees: f64, step_meters: f64) -> (f64, f64) {
    let heading_rad = heading_degrees.to_radians();
    let cos_lat = latitude.to_radians().cos().max(1e-6);

    let dlat = (step_meters * heading_rad.cos()) / METERS_PER_DEGREE_LAT;
    let dlng = (step_meters * heading_rad.sin()) / (METERS_PER_DEGREE_LAT * cos_lat);

    (latitude + dlat, longitude + dlng)
}
