//! In-memory persistence for the tourist location monitor.
//!
//! This crate contains:
//! - The rolling activity log with cursor pagination
//! - The zone catalog backing the geofence provider seam
//! - The entity directory mapping ids to display names

pub mod activity_log;
pub mod directory;
pub mod metrics;
pub mod zone_catalog;
