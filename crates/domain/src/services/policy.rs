//! Alert governance.
//!
//! Decides which alerts a processed sample raises and mutates the
//! entity's latches, cooldowns and zone bookkeeping accordingly. All
//! decisions are deterministic functions of the entity state, the
//! motion delta, the zone lookup result, the scorer verdict and the
//! sample timestamp.

use chrono::{DateTime, Utc};

use crate::models::{
    AlertEvent, AlertKind, AlertSeverity, AlertZoneInfo, EntityState, MotionDelta, ZoneType,
};
use crate::services::scorer::ScoreOutcome;
use crate::services::settings::MonitorSettings;

/// Anomaly scores at or above this are escalated to high severity.
pub const HIGH_ANOMALY_SCORE: f64 = 0.7;

/// Severity assigned to each alert kind when raised outside the normal
/// evaluation flow, e.g. by a manual trigger.
pub fn default_severity(kind: AlertKind) -> AlertSeverity {
    match kind {
        AlertKind::Connectivity | AlertKind::ZoneExited => AlertSeverity::Medium,
        AlertKind::Stationary
        | AlertKind::ZoneEntered
        | AlertKind::ZoneRepeat
        | AlertKind::ZoneChanged
        | AlertKind::Anomaly => AlertSeverity::High,
    }
}

pub struct AlertPolicyEngine {
    stationary_displacement_meters: f64,
    stationary_threshold_seconds: i64,
    connectivity_threshold_seconds: i64,
    repeat_interval_seconds: i64,
    notification_cooldown_seconds: i64,
}

impl AlertPolicyEngine {
    pub fn new(settings: &MonitorSettings) -> Self {
        Self {
            stationary_displacement_meters: settings.stationary_displacement_meters,
            stationary_threshold_seconds: settings.stationary_threshold_seconds,
            connectivity_threshold_seconds: settings.connectivity_threshold_seconds,
            repeat_interval_seconds: settings.repeat_interval_seconds,
            notification_cooldown_seconds: settings.notification_cooldown_seconds,
        }
    }

    /// Evaluates all alert rules for one processed sample. Checks run in
    /// a fixed order (stationary, connectivity, zone, anomaly) so that
    /// cooldown updates from earlier checks gate later ones within the
    /// same tick.
    pub fn evaluate(
        &self,
        state: &mut EntityState,
        delta: &MotionDelta,
        zone_match: Option<&AlertZoneInfo>,
        verdict: &ScoreOutcome,
        now: DateTime<Utc>,
    ) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();
        if let Some(alert) = self.check_stationary(state, delta, now) {
            alerts.push(alert);
        }
        if let Some(alert) = self.check_connectivity(state, delta, now) {
            alerts.push(alert);
        }
        if let Some(alert) = self.check_zone(state, zone_match, now) {
            alerts.push(alert);
        }
        if let Some(alert) = self.check_anomaly(state, verdict, now) {
            alerts.push(alert);
        }
        alerts
    }

    /// Latched per episode: fires once when the stationary duration
    /// crosses the threshold, re-arms when real movement resumes.
    fn check_stationary(
        &self,
        state: &mut EntityState,
        delta: &MotionDelta,
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        if delta.distance_moved >= self.stationary_displacement_meters {
            state.fired_alert_kinds.remove(&AlertKind::Stationary);
            return None;
        }
        let duration = state.stationary_seconds(now);
        if duration <= self.stationary_threshold_seconds {
            return None;
        }
        if !state.fired_alert_kinds.insert(AlertKind::Stationary) {
            return None;
        }
        state.last_notification_time = Some(now);
        Some(AlertEvent::new(
            state.entity_id.clone(),
            AlertKind::Stationary,
            AlertSeverity::High,
            format!("No movement for {} seconds", duration),
            now,
            state.last_location,
        ))
    }

    /// Latched per episode: a gap longer than the threshold fires once;
    /// consecutive long gaps count as the same outage until a timely
    /// sample arrives.
    fn check_connectivity(
        &self,
        state: &mut EntityState,
        delta: &MotionDelta,
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        if delta.elapsed_seconds <= self.connectivity_threshold_seconds as f64 {
            state.fired_alert_kinds.remove(&AlertKind::Connectivity);
            return None;
        }
        if !state.fired_alert_kinds.insert(AlertKind::Connectivity) {
            return None;
        }
        state.last_notification_time = Some(now);
        Some(AlertEvent::new(
            state.entity_id.clone(),
            AlertKind::Connectivity,
            AlertSeverity::Medium,
            format!("No location updates for {} seconds", delta.elapsed_seconds as i64),
            now,
            state.last_location,
        ))
    }

    /// Zone membership transitions: enter and change fire immediately,
    /// presence repeats on the configured cadence, leaving fires an exit.
    fn check_zone(
        &self,
        state: &mut EntityState,
        zone_match: Option<&AlertZoneInfo>,
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        let was_alerting = state.current_zone.is_alerting();
        let now_alerting = zone_match
            .map(|info| info.zone_type.is_alerting())
            .unwrap_or(false);

        if now_alerting {
            let info = zone_match?.clone();
            if !was_alerting {
                state.current_zone = info.zone_type;
                state.current_zone_info = Some(info.clone());
                state.zone_entered_at = Some(now);
                state.repeating_active = true;
                state.last_repeat_alert_time = Some(now);
                return Some(
                    AlertEvent::new(
                        state.entity_id.clone(),
                        AlertKind::ZoneEntered,
                        AlertSeverity::High,
                        format!("Entered {} zone: {}", info.zone_type, info.zone_name),
                        now,
                        state.last_location,
                    )
                    .with_zone(info),
                );
            }
            if state.current_zone != info.zone_type {
                let previous = state.current_zone;
                state.current_zone = info.zone_type;
                state.current_zone_info = Some(info.clone());
                state.zone_entered_at = Some(now);
                state.last_repeat_alert_time = Some(now);
                return Some(
                    AlertEvent::new(
                        state.entity_id.clone(),
                        AlertKind::ZoneChanged,
                        AlertSeverity::High,
                        format!(
                            "Zone changed from {} to {}: {}",
                            previous, info.zone_type, info.zone_name
                        ),
                        now,
                        state.last_location,
                    )
                    .with_zone(info),
                );
            }
            // Still inside the same zone type. Keep the match fresh so the
            // reported name follows the governing zone.
            state.current_zone_info = Some(info.clone());
            let due = match state.last_repeat_alert_time {
                None => true,
                Some(last) => (now - last).num_seconds() >= self.repeat_interval_seconds,
            };
            if !due {
                return None;
            }
            state.last_repeat_alert_time = Some(now);
            let held = state.zone_seconds(now);
            return Some(
                AlertEvent::new(
                    state.entity_id.clone(),
                    AlertKind::ZoneRepeat,
                    AlertSeverity::High,
                    format!(
                        "Still inside {} zone: {} ({} seconds)",
                        info.zone_type, info.zone_name, held
                    ),
                    now,
                    state.last_location,
                )
                .with_zone(info),
            );
        }

        if was_alerting {
            let previous = state.current_zone;
            let exited = state.current_zone_info.take();
            state.current_zone = ZoneType::Safe;
            state.zone_entered_at = None;
            state.repeating_active = false;
            state.last_repeat_alert_time = None;
            let message = match &exited {
                Some(info) => format!("Left {} zone: {}", previous, info.zone_name),
                None => format!("Left {} zone", previous),
            };
            let mut event = AlertEvent::new(
                state.entity_id.clone(),
                AlertKind::ZoneExited,
                AlertSeverity::Medium,
                message,
                now,
                state.last_location,
            );
            if let Some(info) = exited {
                event = event.with_zone(info);
            }
            return Some(event);
        }

        state.current_zone = ZoneType::Safe;
        state.current_zone_info = None;
        None
    }

    /// Gated by the shared cooldown rather than latched: anomalies may
    /// re-fire once the gate reopens even while the condition persists.
    fn check_anomaly(
        &self,
        state: &mut EntityState,
        verdict: &ScoreOutcome,
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        if !verdict.is_anomalous {
            return None;
        }
        let gate_open = match state.last_notification_time {
            None => true,
            Some(last) => (now - last).num_seconds() > self.notification_cooldown_seconds,
        };
        if !gate_open {
            return None;
        }
        state.last_notification_time = Some(now);
        let severity = if verdict.score >= HIGH_ANOMALY_SCORE {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        };
        let reason = verdict
            .reason
            .clone()
            .unwrap_or_else(|| "unusual movement".to_string());
        Some(AlertEvent::new(
            state.entity_id.clone(),
            AlertKind::Anomaly,
            severity,
            format!("Anomalous movement: {} (score {:.2})", reason, verdict.score),
            now,
            state.last_location,
        ))
    }
}
