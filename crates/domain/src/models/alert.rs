//! Alert domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::sample::GeoPoint;
use super::zone::ZoneType;

/// The closed set of alert kinds the policy engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Stationary,
    Connectivity,
    ZoneEntered,
    ZoneRepeat,
    ZoneChanged,
    ZoneExited,
    Anomaly,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Stationary => "stationary",
            AlertKind::Connectivity => "connectivity",
            AlertKind::ZoneEntered => "zone_entered",
            AlertKind::ZoneRepeat => "zone_repeat",
            AlertKind::ZoneChanged => "zone_changed",
            AlertKind::ZoneExited => "zone_exited",
            AlertKind::Anomaly => "anomaly",
        }
    }

    /// Kinds tied to zone membership rather than motion/connectivity.
    pub fn is_zone_kind(&self) -> bool {
        matches!(
            self,
            AlertKind::ZoneEntered
                | AlertKind::ZoneRepeat
                | AlertKind::ZoneChanged
                | AlertKind::ZoneExited
        )
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stationary" => Ok(AlertKind::Stationary),
            "connectivity" => Ok(AlertKind::Connectivity),
            "zone_entered" => Ok(AlertKind::ZoneEntered),
            "zone_repeat" => Ok(AlertKind::ZoneRepeat),
            "zone_changed" => Ok(AlertKind::ZoneChanged),
            "zone_exited" => Ok(AlertKind::ZoneExited),
            "anomaly" => Ok(AlertKind::Anomaly),
            _ => Err(format!(
                "Invalid alert kind: {}. Valid values: stationary, connectivity, zone_entered, zone_repeat, zone_changed, zone_exited, anomaly",
                s
            )),
        }
    }
}

/// Alert severity as delivered downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    High,
    Medium,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::High => "HIGH",
            AlertSeverity::Medium => "MEDIUM",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Zone context attached to zone-membership alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertZoneInfo {
    pub zone_id: Uuid,
    pub zone_name: String,
    pub zone_type: ZoneType,
}

/// A single alert decided by the policy engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub id: Uuid,
    pub entity_id: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<AlertZoneInfo>,
}

impl AlertEvent {
    pub fn new(
        entity_id: impl Into<String>,
        kind: AlertKind,
        severity: AlertSeverity,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
        location: GeoPoint,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_id: entity_id.into(),
            kind,
            severity,
            message: message.into(),
            timestamp,
            location,
            zone: None,
        }
    }

    pub fn with_zone(mut self, zone: AlertZoneInfo) -> Self {
        self.zone = Some(zone);
        self
    }
}

/// An alert together with its downstream delivery outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDelivery {
    #[serde(flatten)]
    pub event: AlertEvent,
    pub delivered: bool,
}
