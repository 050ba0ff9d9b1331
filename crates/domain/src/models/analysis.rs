//! Per-sample analysis outcome and recorded activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alert::{AlertDelivery, AlertKind};
use super::sample::GeoPoint;
use super::zone::ZoneType;

/// Structured record of one processed sample, handed to the activity
/// recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    pub entity_id: String,
    pub name: String,
    pub location: GeoPoint,
    pub speed: f64,
    pub distance_moved: f64,
    pub current_zone: ZoneType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    pub anomaly_score: f64,
    pub is_anomalous: bool,
    pub alerts: Vec<AlertKind>,
    pub timestamp: DateTime<Utc>,
}

/// Result returned to the ingest caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub entity_id: String,
    pub name: String,
    pub anomaly_score: f64,
    pub is_anomalous: bool,
    pub alerts: Vec<AlertDelivery>,
    pub current_zone: ZoneType,
    pub repeating_alert_active: bool,
    pub unsafe_zone_duration_seconds: i64,
    pub speed: f64,
    pub history_size: usize,
    /// True when a collaborator failure degraded this tick (e.g. zone
    /// lookup fell back to the empty set).
    pub degraded: bool,
    /// False when the activity recorder rejected or timed out.
    pub persisted: bool,
    pub timestamp: DateTime<Utc>,
}
