//! Per-entity tracking state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

use super::alert::{AlertKind, AlertZoneInfo};
use super::sample::{GeoPoint, LocationSample};
use super::zone::ZoneType;

/// One point of retained movement history. `speed` is the effective speed
/// (reported, or derived from displacement).
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
}

/// Motion derived from applying one sample against the previous state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionDelta {
    /// Great-circle displacement from the previous location, meters.
    pub distance_moved: f64,
    /// Seconds since the previous sample; 0 for the first sample.
    pub elapsed_seconds: f64,
    /// Effective speed in m/s.
    pub speed: f64,
}

/// Mutable tracking state for one entity. Created on the first sample and
/// mutated only by the state tracker.
#[derive(Debug, Clone)]
pub struct EntityState {
    pub entity_id: String,
    pub display_name: String,
    pub last_location: GeoPoint,
    pub last_update_time: DateTime<Utc>,
    pub stationary_since: DateTime<Utc>,
    pub movement_history: VecDeque<HistoryPoint>,
    pub current_zone: ZoneType,
    pub current_zone_info: Option<AlertZoneInfo>,
    pub zone_entered_at: Option<DateTime<Utc>>,
    /// Kinds latched until their episode clears (stationary, connectivity).
    pub fired_alert_kinds: HashSet<AlertKind>,
    /// Shared cooldown gate for non-zone alerts.
    pub last_notification_time: Option<DateTime<Utc>>,
    pub last_repeat_alert_time: Option<DateTime<Utc>>,
    pub repeating_active: bool,
    pub last_anomaly_score: f64,
    pub last_anomalous: bool,
}

impl EntityState {
    /// First-sample initialization: the entity starts at the sample
    /// location, stationary timer armed, outside any alerting zone.
    pub fn new(sample: &LocationSample, display_name: String) -> Self {
        Self {
            entity_id: sample.entity_id.clone(),
            display_name,
            last_location: sample.location(),
            last_update_time: sample.timestamp,
            stationary_since: sample.timestamp,
            movement_history: VecDeque::new(),
            current_zone: ZoneType::Safe,
            current_zone_info: None,
            zone_entered_at: None,
            fired_alert_kinds: HashSet::new(),
            last_notification_time: None,
            last_repeat_alert_time: None,
            repeating_active: false,
            last_anomaly_score: 0.0,
            last_anomalous: false,
        }
    }

    /// Append a history point, trimming to `limit` oldest-first.
    pub fn push_history(&mut self, point: HistoryPoint, limit: usize) {
        self.movement_history.push_back(point);
        while self.movement_history.len() > limit {
            self.movement_history.pop_front();
        }
    }

    /// Seconds the entity has been stationary as of `now`, clamped at 0.
    pub fn stationary_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.stationary_since).num_seconds().max(0)
    }

    /// Seconds since the current zone was entered, 0 outside alerting zones.
    pub fn zone_seconds(&self, now: DateTime<Utc>) -> i64 {
        match self.zone_entered_at {
            Some(entered_at) => (now - entered_at).num_seconds().max(0),
            None => 0,
        }
    }

    /// Effective speed of the newest history point, 0 when empty.
    pub fn last_speed(&self) -> f64 {
        self.movement_history.back().map(|p| p.speed).unwrap_or(0.0)
    }
}

/// Read-only snapshot of an entity's state for queries and the live view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStateSnapshot {
    pub entity_id: String,
    pub display_name: String,
    pub last_location: GeoPoint,
    pub last_update_time: DateTime<Utc>,
    pub speed: f64,
    pub stationary_since: DateTime<Utc>,
    pub stationary_duration_seconds: i64,
    pub current_zone: ZoneType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_entered_at: Option<DateTime<Utc>>,
    pub repeating_alert_active: bool,
    pub history_size: usize,
    pub anomaly_score: f64,
    pub is_anomalous: bool,
    pub fired_alert_kinds: Vec<AlertKind>,
}

impl EntityStateSnapshot {
    pub fn from_state(state: &EntityState, now: DateTime<Utc>) -> Self {
        let mut fired: Vec<AlertKind> = state.fired_alert_kinds.iter().copied().collect();
        fired.sort_by_key(|k| k.as_str());

        Self {
            entity_id: state.entity_id.clone(),
            display_name: state.display_name.clone(),
            last_location: state.last_location,
            last_update_time: state.last_update_time,
            speed: state.last_speed(),
            stationary_since: state.stationary_since,
            stationary_duration_seconds: state.stationary_seconds(now),
            current_zone: state.current_zone,
            zone_name: state
                .current_zone_info
                .as_ref()
                .map(|z| z.zone_name.clone()),
            zone_entered_at: state.zone_entered_at,
            repeating_alert_active: state.repeating_active,
            history_size: state.movement_history.len(),
            anomaly_score: state.last_anomaly_score,
            is_anomalous: state.last_anomalous,
            fired_alert_kinds: fired,
        }
    }
}
