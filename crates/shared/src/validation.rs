//! Common validation utilities.

use chrono::{TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum length of an entity identifier.
const MAX_ENTITY_ID_LENGTH: usize = 64;

/// Maximum length of a display name.
const MAX_DISPLAY_NAME_LENGTH: usize = 100;

/// Maximum zone radius in meters.
const MAX_ZONE_RADIUS_METERS: f64 = 100_000.0;

lazy_static! {
    static ref ENTITY_ID_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9_.-]+$").expect("entity id pattern is valid");
}

/// Validates that a latitude value is within valid range (-90 to 90).
/// NaN fails the range check.
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
/// NaN fails the range check.
pub fn validate_longitude(lng: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lng) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that speed is a finite, non-negative value in m/s.
pub fn validate_speed(speed: f64) -> Result<(), ValidationError> {
    if speed.is_finite() && speed >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("speed_range");
        err.message = Some("Speed must be non-negative".into());
        Err(err)
    }
}

/// Validates that a zone radius is positive and within the supported range.
pub fn validate_zone_radius(radius_meters: f64) -> Result<(), ValidationError> {
    if radius_meters.is_finite() && radius_meters > 0.0 && radius_meters <= MAX_ZONE_RADIUS_METERS {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be between 0 and 100000 meters".into());
        Err(err)
    }
}

/// Validates that a millisecond timestamp maps to a representable instant.
pub fn validate_timestamp_millis(timestamp_millis: i64) -> Result<(), ValidationError> {
    match Utc.timestamp_millis_opt(timestamp_millis).single() {
        Some(_) => Ok(()),
        None => {
            let mut err = ValidationError::new("timestamp_invalid");
            err.message = Some("Invalid timestamp".into());
            Err(err)
        }
    }
}

/// Validates an entity identifier: 1 to 64 characters from
/// `[A-Za-z0-9_.-]`.
pub fn validate_entity_id(entity_id: &str) -> Result<(), ValidationError> {
    if entity_id.is_empty() || entity_id.len() > MAX_ENTITY_ID_LENGTH {
        let mut err = ValidationError::new("entity_id_length");
        err.message = Some("Entity id must be between 1 and 64 characters".into());
        return Err(err);
    }
    if !ENTITY_ID_PATTERN.is_match(entity_id) {
        let mut err = ValidationError::new("entity_id_chars");
        err.message =
            Some("Entity id may only contain letters, digits, '_', '.' and '-'".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a display name: non-empty, at most 100 characters.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_DISPLAY_NAME_LENGTH {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some("Display name must be between 1 and 100 characters".into());
        return Err(err);
    }
    Ok(())
}
