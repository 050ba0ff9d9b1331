//! Sample ingestion pipeline.
//!
//! [`LocationMonitor`] owns the full per-sample flow: validate, resolve
//! the zone set and display name, update motion state under the entity
//! lock, score, run alert policy, then hand results to the activity
//! recorder and alert dispatcher. Collaborator calls happen outside the
//! entity lock and are bounded by a soft timeout so a slow backend can
//! not stall ingestion.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, gauge};

use crate::error::{validation_message, MonitorError};
use crate::models::{
    ActivitySnapshot, AlertDelivery, AlertEvent, AlertKind, AnalysisResult, EntityStateSnapshot,
    GeoPoint, IngestSampleRequest, ZoneType,
};
use crate::services::collaborators::{
    ActivityRecorder, AlertDispatcher, DispatchResult, EntityDirectory, GeofenceProvider,
    RecordResult,
};
use crate::services::geofence::GeofenceIndex;
use crate::services::policy::{default_severity, AlertPolicyEngine};
use crate::services::scorer::{AnomalyScorer, ScoreOutcome};
use crate::services::settings::MonitorSettings;
use crate::services::tracker::EntityStateTracker;
use validator::Validate;

/// Everything computed inside the entity critical section for one sample.
struct TickOutcome {
    display_name: String,
    location: GeoPoint,
    speed: f64,
    distance_moved: f64,
    history_size: usize,
    current_zone: ZoneType,
    zone_name: Option<String>,
    repeating_active: bool,
    zone_seconds: i64,
    verdict: ScoreOutcome,
    alerts: Vec<AlertEvent>,
}

pub struct LocationMonitor {
    settings: MonitorSettings,
    tracker: EntityStateTracker,
    geofence: GeofenceIndex,
    policy: AlertPolicyEngine,
    scorer: Arc<dyn AnomalyScorer>,
    directory: Arc<dyn EntityDirectory>,
    recorder: Arc<dyn ActivityRecorder>,
    dispatcher: Arc<dyn AlertDispatcher>,
    call_timeout: Duration,
}

impl LocationMonitor {
    pub fn new(
        settings: MonitorSettings,
        scorer: Arc<dyn AnomalyScorer>,
        provider: Arc<dyn GeofenceProvider>,
        directory: Arc<dyn EntityDirectory>,
        recorder: Arc<dyn ActivityRecorder>,
        dispatcher: Arc<dyn AlertDispatcher>,
    ) -> Self {
        let tracker = EntityStateTracker::new(&settings);
        let geofence = GeofenceIndex::new(provider, &settings);
        let policy = AlertPolicyEngine::new(&settings);
        let call_timeout = Duration::from_secs(settings.downstream_timeout_seconds);
        Self {
            settings,
            tracker,
            geofence,
            policy,
            scorer,
            directory,
            recorder,
            dispatcher,
            call_timeout,
        }
    }

    /// Processes one location sample end to end and returns the analysis
    /// outcome, including delivery results for any alerts raised.
    pub async fn ingest(&self, request: IngestSampleRequest) -> Result<AnalysisResult, MonitorError> {
        if let Err(errors) = request.validate() {
            counter!("samples_rejected_total").increment(1);
            return Err(MonitorError::Validation(validation_message(&errors)));
        }
        let sample = request.into_sample(Utc::now());

        // Zone set and display name are resolved before taking the entity
        // lock; nothing awaits while the lock is held.
        let zones = self.geofence.snapshot().await;
        let display_name = if self.tracker.contains(&sample.entity_id) {
            None
        } else {
            Some(
                self.directory
                    .lookup_name(&sample.entity_id)
                    .await
                    .unwrap_or_else(|| "Unknown".to_string()),
            )
        };

        let tick = self.tracker.process(&sample, display_name, |state, delta| {
            let zone_match = zones.locate(sample.latitude, sample.longitude);
            let verdict = self.scorer.score(&state.movement_history);
            state.last_anomaly_score = verdict.score;
            state.last_anomalous = verdict.is_anomalous;
            let alerts =
                self.policy
                    .evaluate(state, &delta, zone_match.as_ref(), &verdict, sample.timestamp);
            TickOutcome {
                display_name: state.display_name.clone(),
                location: state.last_location,
                speed: delta.speed,
                distance_moved: delta.distance_moved,
                history_size: state.movement_history.len(),
                current_zone: state.current_zone,
                zone_name: state
                    .current_zone_info
                    .as_ref()
                    .map(|info| info.zone_name.clone()),
                repeating_active: state.repeating_active,
                zone_seconds: state.zone_seconds(sample.timestamp),
                verdict,
                alerts,
            }
        });

        counter!("samples_processed_total").increment(1);
        gauge!("entities_tracked").set(self.tracker.entity_count() as f64);

        let snapshot = ActivitySnapshot {
            entity_id: sample.entity_id.clone(),
            name: tick.display_name.clone(),
            location: tick.location,
            speed: tick.speed,
            distance_moved: tick.distance_moved,
            current_zone: tick.current_zone,
            zone_name: tick.zone_name.clone(),
            anomaly_score: tick.verdict.score,
            is_anomalous: tick.verdict.is_anomalous,
            alerts: tick.alerts.iter().map(|alert| alert.kind).collect(),
            timestamp: sample.timestamp,
        };
        let persisted = self.record_activity(snapshot).await;

        let mut deliveries = Vec::with_capacity(tick.alerts.len());
        for event in tick.alerts {
            counter!("alerts_fired_total", "kind" => event.kind.as_str()).increment(1);
            let delivered = self.dispatch_alert(&event).await;
            deliveries.push(AlertDelivery { event, delivered });
        }

        Ok(AnalysisResult {
            entity_id: sample.entity_id,
            name: tick.display_name,
            anomaly_score: tick.verdict.score,
            is_anomalous: tick.verdict.is_anomalous,
            alerts: deliveries,
            current_zone: tick.current_zone,
            repeating_alert_active: tick.repeating_active,
            unsafe_zone_duration_seconds: tick.zone_seconds,
            speed: tick.speed,
            history_size: tick.history_size,
            degraded: zones.degraded,
            persisted,
            timestamp: sample.timestamp,
        })
    }

    /// Raises an alert of the given kind for a tracked entity outside the
    /// normal evaluation flow. Zone kinds restart the repeat cadence.
    pub async fn trigger_alert(
        &self,
        entity_id: &str,
        kind: AlertKind,
    ) -> Result<AlertDelivery, MonitorError> {
        let now = Utc::now();
        let event = self
            .tracker
            .with_state(entity_id, |state| {
                if kind.is_zone_kind() {
                    state.last_repeat_alert_time = Some(now);
                }
                let mut event = AlertEvent::new(
                    state.entity_id.clone(),
                    kind,
                    default_severity(kind),
                    format!("Manually triggered {} alert", kind),
                    now,
                    state.last_location,
                );
                if kind.is_zone_kind() {
                    if let Some(info) = state.current_zone_info.clone() {
                        event = event.with_zone(info);
                    }
                }
                event
            })
            .ok_or_else(|| MonitorError::EntityNotFound(entity_id.to_string()))?;

        counter!("alerts_fired_total", "kind" => event.kind.as_str()).increment(1);
        let delivered = self.dispatch_alert(&event).await;
        Ok(AlertDelivery { event, delivered })
    }

    /// Resets zone membership and repeat bookkeeping without raising an
    /// exit alert. Stationary and connectivity latches are untouched.
    pub fn clear_zone_alerts(&self, entity_id: &str) -> Result<EntityStateSnapshot, MonitorError> {
        let now = Utc::now();
        self.tracker
            .with_state(entity_id, |state| {
                state.current_zone = ZoneType::Safe;
                state.current_zone_info = None;
                state.zone_entered_at = None;
                state.repeating_active = false;
                state.last_repeat_alert_time = None;
                EntityStateSnapshot::from_state(state, now)
            })
            .ok_or_else(|| MonitorError::EntityNotFound(entity_id.to_string()))
    }

    pub fn entity_state(&self, entity_id: &str) -> Option<EntityStateSnapshot> {
        self.tracker.snapshot(entity_id, Utc::now())
    }

    pub fn entities(&self) -> Vec<EntityStateSnapshot> {
        self.tracker.snapshots(Utc::now())
    }

    pub fn entity_count(&self) -> usize {
        self.tracker.entity_count()
    }

    /// Drops entities that have not reported within `max_idle`.
    pub fn evict_idle(&self, max_idle: chrono::Duration) -> Vec<String> {
        let evicted = self.tracker.evict_idle(max_idle, Utc::now());
        if !evicted.is_empty() {
            tracing::info!(evicted = evicted.len(), "Evicted idle entities");
            gauge!("entities_tracked").set(self.tracker.entity_count() as f64);
        }
        evicted
    }

    /// Current zone cache status: active zone count and degraded flag.
    pub async fn zone_status(&self) -> (usize, bool) {
        let view = self.geofence.snapshot().await;
        (view.zone_count(), view.degraded)
    }

    /// Forces the next sample to refetch zones. Called after zone
    /// administration changes.
    pub async fn invalidate_zone_cache(&self) {
        self.geofence.invalidate().await;
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    async fn record_activity(&self, snapshot: ActivitySnapshot) -> bool {
        let entity_id = snapshot.entity_id.clone();
        match tokio::time::timeout(self.call_timeout, self.recorder.record(snapshot)).await {
            Ok(RecordResult::Recorded) => true,
            Ok(RecordResult::Failed(reason)) => {
                tracing::warn!(entity_id = %entity_id, %reason, "Failed to record activity");
                false
            }
            Err(_) => {
                tracing::warn!(
                    entity_id = %entity_id,
                    timeout_seconds = self.call_timeout.as_secs(),
                    "Activity recording timed out"
                );
                false
            }
        }
    }

    async fn dispatch_alert(&self, event: &AlertEvent) -> bool {
        match tokio::time::timeout(self.call_timeout, self.dispatcher.dispatch(event)).await {
            Ok(DispatchResult::Delivered) => true,
            Ok(DispatchResult::Failed(reason)) => {
                tracing::warn!(
                    entity_id = %event.entity_id,
                    kind = %event.kind,
                    %reason,
                    "Failed to dispatch alert"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    entity_id = %event.entity_id,
                    kind = %event.kind,
                    timeout_seconds = self.call_timeout.as_secs(),
                    "Alert dispatch timed out"
                );
                false
            }
        }
    }
}
