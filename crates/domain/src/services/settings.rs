//! Tunable thresholds for the monitoring engine.
//!
//! Defaults match the behaviour the field teams calibrated against:
//! a tourist is stationary after five minutes without meaningful
//! displacement, connectivity is considered lost after five minutes of
//! silence, and sustained speeds above 15 m/s are flagged as suspicious.

use serde::Deserialize;

/// Engine-wide thresholds. Loaded from configuration by the API layer
/// and handed to [`super::LocationMonitor`] at construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Displacement below this many meters keeps a stationary episode alive.
    pub stationary_displacement_meters: f64,
    /// Stationary duration must exceed this many seconds before an alert fires.
    pub stationary_threshold_seconds: i64,
    /// Gap between samples must exceed this many seconds to count as a
    /// connectivity loss.
    pub connectivity_threshold_seconds: i64,
    /// Mean recent speed above this many m/s scores as suspicious.
    pub suspicious_speed_mps: f64,
    /// Upper bound of the pedestrian speed envelope used by the motion
    /// profile scorer.
    pub max_walking_speed_mps: f64,
    /// Extra tolerance applied around circular zone boundaries.
    pub geofence_buffer_meters: f64,
    /// Minimum seconds between repeated alerts while inside an alerting zone.
    pub repeat_interval_seconds: i64,
    /// Shared cooldown applied to anomaly notifications.
    pub notification_cooldown_seconds: i64,
    /// Maximum number of retained movement history points per entity.
    pub history_limit: usize,
    /// How long a fetched zone set stays fresh.
    pub zone_cache_ttl_seconds: u64,
    /// How long to wait before retrying the zone provider after a failure.
    pub provider_retry_seconds: u64,
    /// Soft timeout applied to activity recording and alert dispatch.
    pub downstream_timeout_seconds: u64,
    /// Number of independent locks the entity map is split across.
    pub shard_count: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            stationary_displacement_meters: 5.0,
            stationary_threshold_seconds: 300,
            connectivity_threshold_seconds: 300,
            suspicious_speed_mps: 15.0,
            max_walking_speed_mps: 5.0,
            geofence_buffer_meters: 50.0,
            repeat_interval_seconds: 5,
            notification_cooldown_seconds: 60,
            history_limit: 20,
            zone_cache_ttl_seconds: 30,
            provider_retry_seconds: 5,
            downstream_timeout_seconds: 5,
            shard_count: 16,
        }
    }
}
