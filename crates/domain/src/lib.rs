//! Domain layer for the tourist safety monitor.
//!
//! This crate contains:
//! - Domain models (samples, entity state, zones, alerts)
//! - The monitoring engine services (tracker, geofence index, scorer,
//!   alert policy, monitor facade)
//! - Collaborator traits and domain error types

pub mod error;
pub mod models;
pub mod services;
