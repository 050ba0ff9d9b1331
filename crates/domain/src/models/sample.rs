//! Location sample domain model.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A latitude/longitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A validated position sample, ready for the monitoring pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub entity_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Reported speed in m/s; derived from displacement when absent.
    pub speed: Option<f64>,
}

impl LocationSample {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Request payload for sample ingestion.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngestSampleRequest {
    #[validate(custom(function = "shared::validation::validate_entity_id"))]
    pub entity_id: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    /// Timestamp in milliseconds since epoch; defaults to now when absent.
    #[validate(custom(function = "shared::validation::validate_timestamp_millis"))]
    pub timestamp: Option<i64>,

    /// Speed in m/s, if the device reports one.
    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed: Option<f64>,
}

impl IngestSampleRequest {
    /// Convert a validated request into a sample, filling in `now` when no
    /// timestamp was supplied.
    pub fn into_sample(self, now: DateTime<Utc>) -> LocationSample {
        let timestamp = self
            .timestamp
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .unwrap_or(now);

        LocationSample {
            entity_id: self.entity_id,
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp,
            speed: self.speed,
        }
    }
}
