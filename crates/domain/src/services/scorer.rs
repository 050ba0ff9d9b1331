//! Anomaly scoring over movement history.
//!
//! Two interchangeable scorers sit behind [`AnomalyScorer`]: the
//! threshold-based [`HeuristicScorer`] used by default, and the
//! [`MotionProfileScorer`] which classifies against a pedestrian
//! motion envelope. Scorers are pure: same history in, same verdict out.

use std::collections::VecDeque;

use crate::models::HistoryPoint;
use crate::services::features::{trailing_mean, MotionFeatures, RECENT_SPEED_WINDOW};

/// Score assigned when recent speed exceeds the suspicious threshold.
pub const SUSPICIOUS_SPEED_SCORE: f64 = 0.8;
/// Score assigned to a prolonged stillness pattern.
pub const STATIONARY_PATTERN_SCORE: f64 = 0.6;
/// Mean speed below this many m/s counts as stillness.
pub const STILLNESS_SPEED_MPS: f64 = 0.1;
/// History must be strictly longer than this before stillness scores.
pub const MIN_STILLNESS_HISTORY: usize = 10;

/// Verdict produced by a scorer for one history window.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub is_anomalous: bool,
    /// Confidence in [0, 1]. Zero when nothing matched.
    pub score: f64,
    /// Short label describing what matched, absent for normal motion.
    pub reason: Option<String>,
}

impl ScoreOutcome {
    pub fn normal() -> Self {
        Self {
            is_anomalous: false,
            score: 0.0,
            reason: None,
        }
    }

    pub fn anomalous(score: f64, reason: &str) -> Self {
        Self {
            is_anomalous: true,
            score,
            reason: Some(reason.to_string()),
        }
    }
}

/// Strategy seam for anomaly detection.
pub trait AnomalyScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Scores the given history window. Must not block or perform I/O;
    /// this runs inside the per-entity critical section.
    fn score(&self, history: &VecDeque<HistoryPoint>) -> ScoreOutcome;
}

/// Threshold rules tuned for tourist movement.
///
/// Flags sustained high speed over the trailing window, and stillness
/// that persists across a mostly-full history buffer.
pub struct HeuristicScorer {
    suspicious_speed_mps: f64,
}

impl HeuristicScorer {
    pub fn new(suspicious_speed_mps: f64) -> Self {
        Self {
            suspicious_speed_mps,
        }
    }
}

impl AnomalyScorer for HeuristicScorer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn score(&self, history: &VecDeque<HistoryPoint>) -> ScoreOutcome {
        if history.is_empty() {
            return ScoreOutcome::normal();
        }

        let speeds: Vec<f64> = history.iter().map(|p| p.speed).collect();
        let recent_mean = trailing_mean(&speeds, RECENT_SPEED_WINDOW);

        if recent_mean > self.suspicious_speed_mps {
            return ScoreOutcome::anomalous(SUSPICIOUS_SPEED_SCORE, "suspicious speed");
        }
        if recent_mean < STILLNESS_SPEED_MPS && history.len() > MIN_STILLNESS_HISTORY {
            return ScoreOutcome::anomalous(STATIONARY_PATTERN_SCORE, "abnormal stationary pattern");
        }
        ScoreOutcome::normal()
    }
}

/// Classifies motion against a pedestrian envelope built from extracted
/// features: speeds within walking range and no sharp heading reversals.
pub struct MotionProfileScorer {
    max_walking_speed_mps: f64,
    max_direction_change_degrees: f64,
    stationary_displacement_meters: f64,
}

impl MotionProfileScorer {
    pub fn new(max_walking_speed_mps: f64, stationary_displacement_meters: f64) -> Self {
        Self {
            max_walking_speed_mps,
            max_direction_change_degrees: 45.0,
            stationary_displacement_meters,
        }
    }
}

impl AnomalyScorer for MotionProfileScorer {
    fn name(&self) -> &'static str {
        "profile"
    }

    fn score(&self, history: &VecDeque<HistoryPoint>) -> ScoreOutcome {
        // Too little signal to classify against the envelope.
        if history.len() < 3 {
            return ScoreOutcome::normal();
        }

        let features = MotionFeatures::extract(history, self.stationary_displacement_meters);

        if features.mean_speed > self.max_walking_speed_mps {
            return ScoreOutcome::anomalous(SUSPICIOUS_SPEED_SCORE, "outside walking speed envelope");
        }
        if !features.is_stationary
            && features.direction_change > self.max_direction_change_degrees
            && features.mean_speed > STILLNESS_SPEED_MPS
        {
            return ScoreOutcome::anomalous(STATIONARY_PATTERN_SCORE, "erratic movement pattern");
        }
        ScoreOutcome::normal()
    }
}
