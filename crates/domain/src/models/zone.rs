//! Geofence zone domain model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::sample::GeoPoint;

/// Classification of a zone. Ordering for conflict resolution is
/// `unsafe > restricted > safe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Safe,
    Restricted,
    Unsafe,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Safe => "safe",
            ZoneType::Restricted => "restricted",
            ZoneType::Unsafe => "unsafe",
        }
    }

    /// Rank used when several zones contain the same point.
    pub fn severity_rank(&self) -> u8 {
        match self {
            ZoneType::Safe => 0,
            ZoneType::Restricted => 1,
            ZoneType::Unsafe => 2,
        }
    }

    /// Whether presence in this zone keeps the repeating alert cadence on.
    pub fn is_alerting(&self) -> bool {
        matches!(self, ZoneType::Restricted | ZoneType::Unsafe)
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ZoneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(ZoneType::Safe),
            "restricted" => Ok(ZoneType::Restricted),
            "unsafe" => Ok(ZoneType::Unsafe),
            _ => Err(format!(
                "Invalid zone type: {}. Valid values: safe, restricted, unsafe",
                s
            )),
        }
    }
}

/// Zone geometry: a buffered circle or a closed polygon ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ZoneGeometry {
    #[serde(rename_all = "camelCase")]
    Circle {
        center_lat: f64,
        center_lng: f64,
        radius_meters: f64,
    },
    #[serde(rename_all = "camelCase")]
    Polygon { vertices: Vec<GeoPoint> },
}

/// Validates a geometry payload: circle radius in range, polygon ring with
/// at least three in-range vertices.
pub fn validate_geometry(geometry: &ZoneGeometry) -> Result<(), ValidationError> {
    match geometry {
        ZoneGeometry::Circle {
            center_lat,
            center_lng,
            radius_meters,
        } => {
            shared::validation::validate_latitude(*center_lat)?;
            shared::validation::validate_longitude(*center_lng)?;
            shared::validation::validate_zone_radius(*radius_meters)?;
        }
        ZoneGeometry::Polygon { vertices } => {
            if vertices.len() < 3 {
                let mut err = ValidationError::new("polygon_ring");
                err.message = Some("Polygon must have at least 3 vertices".into());
                return Err(err);
            }
            for vertex in vertices {
                shared::validation::validate_latitude(vertex.latitude)?;
                shared::validation::validate_longitude(vertex.longitude)?;
            }
        }
    }
    Ok(())
}

/// An active or retired geofence zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceZone {
    pub id: Uuid,
    pub name: String,
    pub zone_type: ZoneType,
    pub geometry: ZoneGeometry,
    pub active: bool,
}

/// Request payload for creating a zone.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoneRequest {
    #[validate(custom(function = "shared::validation::validate_display_name"))]
    pub name: String,

    pub zone_type: ZoneType,

    #[validate(custom(function = "validate_geometry"))]
    pub geometry: ZoneGeometry,
}

impl CreateZoneRequest {
    pub fn into_zone(self) -> GeofenceZone {
        GeofenceZone {
            id: Uuid::new_v4(),
            name: self.name,
            zone_type: self.zone_type,
            geometry: self.geometry,
            active: true,
        }
    }
}
