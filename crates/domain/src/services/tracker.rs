//! Per-entity state storage and motion bookkeeping.
//!
//! Entities live in a hash map sharded across independent locks so
//! concurrent ingest for different entities rarely contends. All
//! closures run under a single shard lock and must stay free of I/O
//! and awaits.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use shared::geodesy::haversine_distance_meters;

use crate::models::{EntityState, EntityStateSnapshot, HistoryPoint, LocationSample, MotionDelta};
use crate::services::settings::MonitorSettings;

pub struct EntityStateTracker {
    shards: Vec<RwLock<HashMap<String, EntityState>>>,
    history_limit: usize,
    stationary_displacement_meters: f64,
}

impl EntityStateTracker {
    pub fn new(settings: &MonitorSettings) -> Self {
        let shard_count = settings.shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            shards,
            history_limit: settings.history_limit,
            stationary_displacement_meters: settings.stationary_displacement_meters,
        }
    }

    fn shard_for(&self, entity_id: &str) -> &RwLock<HashMap<String, EntityState>> {
        let mut hasher = DefaultHasher::new();
        entity_id.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.shard_for(entity_id)
            .read()
            .unwrap()
            .contains_key(entity_id)
    }

    pub fn entity_count(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().unwrap().len())
            .sum()
    }

    /// Applies a sample to the entity's motion state and runs `evaluate`
    /// under the same shard lock. The entity is created on first contact
    /// using `display_name` (already resolved by the caller so no await
    /// happens while the lock is held).
    pub fn process<R>(
        &self,
        sample: &LocationSample,
        display_name: Option<String>,
        evaluate: impl FnOnce(&mut EntityState, MotionDelta) -> R,
    ) -> R {
        let shard = self.shard_for(&sample.entity_id);
        let mut entities = shard.write().unwrap();

        match entities.get_mut(&sample.entity_id) {
            Some(state) => {
                let delta = apply_motion(
                    state,
                    sample,
                    self.history_limit,
                    self.stationary_displacement_meters,
                );
                evaluate(state, delta)
            }
            None => {
                let name = display_name.unwrap_or_else(|| "Unknown".to_string());
                let mut state = EntityState::new(sample, name);
                let speed = sample.speed.unwrap_or(0.0);
                state.push_history(
                    HistoryPoint {
                        latitude: sample.latitude,
                        longitude: sample.longitude,
                        timestamp: sample.timestamp,
                        speed,
                    },
                    self.history_limit,
                );
                let delta = MotionDelta {
                    distance_moved: 0.0,
                    elapsed_seconds: 0.0,
                    speed,
                };
                let result = evaluate(&mut state, delta);
                entities.insert(sample.entity_id.clone(), state);
                result
            }
        }
    }

    /// Runs `mutate` against an existing entity under its shard lock.
    /// Returns `None` for unknown entities.
    pub fn with_state<R>(
        &self,
        entity_id: &str,
        mutate: impl FnOnce(&mut EntityState) -> R,
    ) -> Option<R> {
        let shard = self.shard_for(entity_id);
        let mut entities = shard.write().unwrap();
        entities.get_mut(entity_id).map(mutate)
    }

    pub fn snapshot(&self, entity_id: &str, now: DateTime<Utc>) -> Option<EntityStateSnapshot> {
        let shard = self.shard_for(entity_id);
        let entities = shard.read().unwrap();
        entities
            .get(entity_id)
            .map(|state| EntityStateSnapshot::from_state(state, now))
    }

    /// Snapshots every tracked entity, sorted by entity id for stable output.
    pub fn snapshots(&self, now: DateTime<Utc>) -> Vec<EntityStateSnapshot> {
        let mut all: Vec<EntityStateSnapshot> = self
            .shards
            .iter()
            .flat_map(|shard| {
                shard
                    .read()
                    .unwrap()
                    .values()
                    .map(|state| EntityStateSnapshot::from_state(state, now))
                    .collect::<Vec<_>>()
            })
            .collect();
        all.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        all
    }

    /// Removes entities that have not reported within `max_idle`.
    /// Returns the ids of the evicted entities.
    pub fn evict_idle(&self, max_idle: Duration, now: DateTime<Utc>) -> Vec<String> {
        let cutoff = now - max_idle;
        let mut evicted = Vec::new();
        for shard in &self.shards {
            let mut entities = shard.write().unwrap();
            let stale: Vec<String> = entities
                .iter()
                .filter(|(_, state)| state.last_update_time < cutoff)
                .map(|(id, _)| id.clone())
                .collect();
            for id in stale {
                entities.remove(&id);
                evicted.push(id);
            }
        }
        evicted
    }

    pub fn remove(&self, entity_id: &str) -> bool {
        self.shard_for(entity_id)
            .write()
            .unwrap()
            .remove(entity_id)
            .is_some()
    }
}

/// Updates motion state for a subsequent sample and returns the computed
/// delta. Speed falls back to displacement over elapsed time when the
/// sample does not report one, and to zero when timestamps do not advance.
fn apply_motion(
    state: &mut EntityState,
    sample: &LocationSample,
    history_limit: usize,
    stationary_displacement_meters: f64,
) -> MotionDelta {
    let distance_moved = haversine_distance_meters(
        state.last_location.latitude,
        state.last_location.longitude,
        sample.latitude,
        sample.longitude,
    );
    let elapsed_seconds =
        (sample.timestamp - state.last_update_time).num_milliseconds() as f64 / 1000.0;
    let speed = sample.speed.unwrap_or_else(|| {
        if elapsed_seconds > 0.0 {
            distance_moved / elapsed_seconds
        } else {
            0.0
        }
    });

    if distance_moved >= stationary_displacement_meters {
        state.stationary_since = sample.timestamp;
    }

    state.push_history(
        HistoryPoint {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp: sample.timestamp,
            speed,
        },
        history_limit,
    );

    state.last_location = sample.location();
    state.last_update_time = sample.timestamp;

    MotionDelta {
        distance_moved,
        elapsed_seconds,
        speed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const METERS_PER_DEGREE_LAT: f64 = std::f64::consts::PI * 6_371_000.0 / 180.0;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn sample(entity_id: &str, lat: f64, lng: f64, offset_seconds: i64) -> LocationSample {
        LocationSample {
            entity_id: entity_id.to_string(),
            latitude: lat,
            longitude: lng,
            timestamp: base_time() + Duration::seconds(offset_seconds),
            speed: None,
        }
    }

    fn tracker() -> EntityStateTracker {
        EntityStateTracker::new(&MonitorSettings::default())
    }

    #[test]
    fn first_sample_creates_entity_with_zero_delta() {
        let tracker = tracker();
        let first = sample("tourist-1", 28.6139, 77.2090, 0);
        let delta = tracker.process(&first, Some("Asha".to_string()), |state, delta| {
            assert_eq!(state.display_name, "Asha");
            assert_eq!(state.movement_history.len(), 1);
            delta
        });
        assert_eq!(delta.distance_moved, 0.0);
        assert_eq!(delta.elapsed_seconds, 0.0);
        assert_eq!(delta.speed, 0.0);
        assert!(tracker.contains("tourist-1"));
        assert_eq!(tracker.entity_count(), 1);
    }

    #[test]
    fn missing_display_name_defaults_to_unknown() {
        let tracker = tracker();
        let first = sample("tourist-1", 28.6139, 77.2090, 0);
        tracker.process(&first, None, |_, _| ());
        let snap = tracker.snapshot("tourist-1", base_time()).unwrap();
        assert_eq!(snap.display_name, "Unknown");
    }

    #[test]
    fn derived_speed_from_displacement_over_time() {
        let tracker = tracker();
        tracker.process(&sample("tourist-1", 28.6139, 77.2090, 0), None, |_, _| ());

        // 120 m north over 10 s: derived speed 12 m/s.
        let offset = 120.0 / METERS_PER_DEGREE_LAT;
        let delta = tracker.process(
            &sample("tourist-1", 28.6139 + offset, 77.2090, 10),
            None,
            |_, delta| delta,
        );
        assert!((delta.distance_moved - 120.0).abs() < 1.0);
        assert!((delta.speed - 12.0).abs() < 0.1);
    }

    #[test]
    fn reported_speed_wins_over_derived() {
        let tracker = tracker();
        tracker.process(&sample("tourist-1", 28.6139, 77.2090, 0), None, |_, _| ());

        let mut second = sample("tourist-1", 28.6149, 77.2090, 10);
        second.speed = Some(3.5);
        let delta = tracker.process(&second, None, |_, delta| delta);
        assert_eq!(delta.speed, 3.5);
    }

    #[test]
    fn non_advancing_timestamp_yields_zero_speed() {
        let tracker = tracker();
        tracker.process(&sample("tourist-1", 28.6139, 77.2090, 0), None, |_, _| ());

        let delta = tracker.process(&sample("tourist-1", 28.6149, 77.2090, 0), None, |_, delta| {
            delta
        });
        assert!(delta.distance_moved > 0.0);
        assert_eq!(delta.speed, 0.0);
    }

    #[test]
    fn movement_resets_stationary_anchor_small_jitter_does_not() {
        let tracker = tracker();
        tracker.process(&sample("tourist-1", 28.6139, 77.2090, 0), None, |_, _| ());

        // ~1 m of jitter keeps the anchor.
        let jitter = 1.0 / METERS_PER_DEGREE_LAT;
        tracker.process(
            &sample("tourist-1", 28.6139 + jitter, 77.2090, 60),
            None,
            |state, _| assert_eq!(state.stationary_since, base_time()),
        );

        // 50 m of real movement resets it.
        let jump = 50.0 / METERS_PER_DEGREE_LAT;
        tracker.process(
            &sample("tourist-1", 28.6139 + jump, 77.2090, 120),
            None,
            |state, _| {
                assert_eq!(state.stationary_since, base_time() + Duration::seconds(120));
            },
        );
    }

    #[test]
    fn history_is_capped_at_configured_limit() {
        let tracker = tracker();
        for i in 0..30 {
            tracker.process(
                &sample("tourist-1", 28.6139 + 0.001 * i as f64, 77.2090, i * 10),
                None,
                |_, _| (),
            );
        }
        tracker.process(
            &sample("tourist-1", 28.6139, 77.2090, 400),
            None,
            |state, _| assert_eq!(state.movement_history.len(), 20),
        );
    }

    #[test]
    fn eviction_removes_only_idle_entities() {
        let tracker = tracker();
        tracker.process(&sample("stale", 28.6139, 77.2090, 0), None, |_, _| ());
        tracker.process(&sample("fresh", 28.6139, 77.2090, 3600), None, |_, _| ());

        let now = base_time() + Duration::seconds(3700);
        let evicted = tracker.evict_idle(Duration::seconds(1800), now);
        assert_eq!(evicted, vec!["stale".to_string()]);
        assert!(!tracker.contains("stale"));
        assert!(tracker.contains("fresh"));
    }

    #[test]
    fn snapshots_are_sorted_by_entity_id() {
        let tracker = tracker();
        for id in ["zed", "alpha", "mid"] {
            tracker.process(&sample(id, 28.6139, 77.2090, 0), None, |_, _| ());
        }
        let snaps = tracker.snapshots(base_time());
        let ids: Vec<&str> = snaps.iter().map(|s| s.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zed"]);
    }

    #[test]
    fn sharding_keeps_many_entities_addressable() {
        use fake::faker::name::en::Name;
        use fake::Fake;

        let tracker = tracker();
        for i in 0..100 {
            let id = format!("tourist-{}", i);
            let name: String = Name().fake();
            tracker.process(&sample(&id, 28.6139, 77.2090, 0), Some(name), |_, _| ());
        }

        assert_eq!(tracker.entity_count(), 100);
        for i in 0..100 {
            assert!(tracker.contains(&format!("tourist-{}", i)));
        }
    }

    #[test]
    fn with_state_returns_none_for_unknown_entity() {
        let tracker = tracker();
        assert!(tracker.with_state("ghost", |_| ()).is_none());
    }

    #[test]
    fn concurrent_ingest_matches_sequential_outcome() {
        use std::sync::Arc;
        use std::thread;

        let concurrent = Arc::new(tracker());
        let mut handles = Vec::new();
        for entity in ["walker-a", "walker-b", "walker-c", "walker-d"] {
            let tracker = Arc::clone(&concurrent);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    tracker.process(
                        &sample(entity, 28.6139 + 0.0001 * i as f64, 77.2090, i * 5),
                        None,
                        |_, _| (),
                    );
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let sequential = tracker();
        for entity in ["walker-a", "walker-b", "walker-c", "walker-d"] {
            for i in 0..50 {
                sequential.process(
                    &sample(entity, 28.6139 + 0.0001 * i as f64, 77.2090, i * 5),
                    None,
                    |_, _| (),
                );
            }
        }

        let now = base_time() + Duration::seconds(300);
        let left = concurrent.snapshots(now);
        let right = sequential.snapshots(now);
        assert_eq!(left.len(), right.len());
        for (a, b) in left.iter().zip(right.iter()) {
            assert_eq!(a.entity_id, b.entity_id);
            assert_eq!(a.last_location.latitude, b.last_location.latitude);
            assert_eq!(a.history_size, b.history_size);
            assert_eq!(a.speed, b.speed);
        }
    }
}
