//! Motion feature extraction from movement history.
//!
//! Condenses a history window into the summary vector consumed by the
//! motion profile scorer: speed statistics, acceleration, heading
//! change and displacement spread.

use std::collections::VecDeque;

use shared::geodesy::{bearing_change_degrees, haversine_distance_meters, initial_bearing_degrees};

use crate::models::HistoryPoint;

/// Number of trailing history points the speed mean is taken over.
pub const RECENT_SPEED_WINDOW: usize = 5;

/// Summary of an entity's recent motion.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionFeatures {
    /// Mean speed over the trailing window, m/s.
    pub mean_speed: f64,
    /// Population standard deviation of all recorded speeds, m/s.
    pub speed_std_dev: f64,
    /// Speed change between the last two points divided by their time gap, m/s^2.
    pub acceleration: f64,
    /// Heading change between the last two travel segments, degrees in [0, 180].
    pub direction_change: f64,
    /// Whether total displacement across the window stayed under the
    /// stationary threshold.
    pub is_stationary: bool,
    /// Population variance of consecutive segment lengths, m^2.
    pub distance_variance: f64,
}

impl MotionFeatures {
    /// Extracts features from a history window. An empty window yields
    /// all-zero features with `is_stationary` set.
    pub fn extract(history: &VecDeque<HistoryPoint>, stationary_displacement_meters: f64) -> Self {
        if history.is_empty() {
            return Self {
                mean_speed: 0.0,
                speed_std_dev: 0.0,
                acceleration: 0.0,
                direction_change: 0.0,
                is_stationary: true,
                distance_variance: 0.0,
            };
        }

        let speeds: Vec<f64> = history.iter().map(|p| p.speed).collect();
        let mean_speed = trailing_mean(&speeds, RECENT_SPEED_WINDOW);
        let speed_std_dev = population_std_dev(&speeds);

        let segments = segment_distances(history);
        let distance_variance = population_variance(&segments);

        let acceleration = last_acceleration(history);
        let direction_change = last_direction_change(history);

        let first = history.front().map(|p| (p.latitude, p.longitude));
        let last = history.back().map(|p| (p.latitude, p.longitude));
        let is_stationary = match (first, last) {
            (Some((lat1, lng1)), Some((lat2, lng2))) => {
                haversine_distance_meters(lat1, lng1, lat2, lng2) < stationary_displacement_meters
            }
            _ => true,
        };

        Self {
            mean_speed,
            speed_std_dev,
            acceleration,
            direction_change,
            is_stationary,
            distance_variance,
        }
    }
}

/// Mean over the last `window` values, or all of them when fewer exist.
pub fn trailing_mean(values: &[f64], window: usize) -> f64 {
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

fn segment_distances(history: &VecDeque<HistoryPoint>) -> Vec<f64> {
    history
        .iter()
        .zip(history.iter().skip(1))
        .map(|(a, b)| haversine_distance_meters(a.latitude, a.longitude, b.latitude, b.longitude))
        .collect()
}

fn last_acceleration(history: &VecDeque<HistoryPoint>) -> f64 {
    let len = history.len();
    if len < 2 {
        return 0.0;
    }
    let prev = &history[len - 2];
    let last = &history[len - 1];
    let elapsed = (last.timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
    if elapsed <= 0.0 {
        return 0.0;
    }
    (last.speed - prev.speed) / elapsed
}

fn last_direction_change(history: &VecDeque<HistoryPoint>) -> f64 {
    let len = history.len();
    if len < 3 {
        return 0.0;
    }
    let a = &history[len - 3];
    let b = &history[len - 2];
    let c = &history[len - 1];
    let first_leg = initial_bearing_degrees(a.latitude, a.longitude, b.latitude, b.longitude);
    let second_leg = initial_bearing_degrees(b.latitude, b.longitude, c.latitude, c.longitude);
    bearing_change_degrees(first_leg, second_leg)
}
