//! Shared utilities for the tourist safety monitor.
//!
//! This crate provides common functionality used across all other crates:
//! - Geodesic math (haversine distance, bearings, point-in-polygon)
//! - Common validation logic
//! - Cursor-based pagination helpers

pub mod geodesy;
pub mod pagination;
pub mod validation;
