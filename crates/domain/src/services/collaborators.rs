//! Collaborator seams for the monitoring engine.
//!
//! The engine core never talks to storage or delivery channels directly.
//! Zone definitions, entity names, activity recording and alert delivery
//! all go through these traits so the API layer can wire real backends
//! while tests substitute the in-memory mocks below.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use crate::models::{ActivitySnapshot, AlertEvent, GeofenceZone};

/// Outcome of recording an activity snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordResult {
    /// Snapshot accepted by the backing store.
    Recorded,
    /// Store rejected or failed to persist the snapshot.
    Failed(String),
}

/// Outcome of delivering an alert event.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    /// Alert handed to the delivery channel.
    Delivered,
    /// Delivery channel reported an error.
    Failed(String),
}

/// Source of geofence zone definitions.
#[async_trait::async_trait]
pub trait GeofenceProvider: Send + Sync {
    /// Returns currently active zones. Errors are surfaced so the cache
    /// can enter degraded mode instead of serving stale truth as fresh.
    async fn list_active(&self) -> Result<Vec<GeofenceZone>, String>;
}

/// Resolves entity identifiers to human-readable display names.
#[async_trait::async_trait]
pub trait EntityDirectory: Send + Sync {
    async fn lookup_name(&self, entity_id: &str) -> Option<String>;
}

/// Sink for per-sample activity snapshots.
#[async_trait::async_trait]
pub trait ActivityRecorder: Send + Sync {
    async fn record(&self, snapshot: ActivitySnapshot) -> RecordResult;
}

/// Delivery channel for alert events.
#[async_trait::async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(&self, event: &AlertEvent) -> DispatchResult;
}

/// Mock zone provider backed by an in-memory list.
pub struct MockGeofenceProvider {
    zones: RwLock<Vec<GeofenceZone>>,
    simulate_failure: AtomicBool,
    calls: AtomicUsize,
}

impl MockGeofenceProvider {
    pub fn new(zones: Vec<GeofenceZone>) -> Self {
        Self {
            zones: RwLock::new(zones),
            simulate_failure: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn failing() -> Self {
        let provider = Self::empty();
        provider.simulate_failure.store(true, Ordering::SeqCst);
        provider
    }

    pub fn set_zones(&self, zones: Vec<GeofenceZone>) {
        *self.zones.write().unwrap() = zones;
    }

    pub fn set_failing(&self, failing: bool) {
        self.simulate_failure.store(failing, Ordering::SeqCst);
    }

    /// Number of `list_active` calls observed, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GeofenceProvider for MockGeofenceProvider {
    async fn list_active(&self) -> Result<Vec<GeofenceZone>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.simulate_failure.load(Ordering::SeqCst) {
            tracing::warn!("Mock geofence provider simulating failure");
            return Err("Simulated provider failure".to_string());
        }
        Ok(self.zones.read().unwrap().clone())
    }
}

/// Mock directory backed by a name map.
pub struct MockEntityDirectory {
    names: RwLock<HashMap<String, String>>,
}

impl MockEntityDirectory {
    pub fn new() -> Self {
        Self {
            names: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_names(entries: &[(&str, &str)]) -> Self {
        let directory = Self::new();
        for (entity_id, name) in entries {
            directory.register(entity_id, name);
        }
        directory
    }

    pub fn register(&self, entity_id: &str, name: &str) {
        self.names
            .write()
            .unwrap()
            .insert(entity_id.to_string(), name.to_string());
    }
}

impl Default for MockEntityDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EntityDirectory for MockEntityDirectory {
    async fn lookup_name(&self, entity_id: &str) -> Option<String> {
        self.names.read().unwrap().get(entity_id).cloned()
    }
}

/// Mock recorder that keeps every snapshot for inspection.
pub struct MockActivityRecorder {
    snapshots: Mutex<Vec<ActivitySnapshot>>,
    simulate_failure: AtomicBool,
}

impl MockActivityRecorder {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(Vec::new()),
            simulate_failure: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let recorder = Self::new();
        recorder.simulate_failure.store(true, Ordering::SeqCst);
        recorder
    }

    pub fn recorded(&self) -> Vec<ActivitySnapshot> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl Default for MockActivityRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ActivityRecorder for MockActivityRecorder {
    async fn record(&self, snapshot: ActivitySnapshot) -> RecordResult {
        if self.simulate_failure.load(Ordering::SeqCst) {
            tracing::warn!(
                entity_id = %snapshot.entity_id,
                "Mock activity recorder simulating failure"
            );
            return RecordResult::Failed("Simulated recorder failure".to_string());
        }
        self.snapshots.lock().unwrap().push(snapshot);
        RecordResult::Recorded
    }
}

/// Mock dispatcher that keeps every delivered event for inspection.
pub struct MockAlertDispatcher {
    events: Mutex<Vec<AlertEvent>>,
    simulate_failure: AtomicBool,
}

impl MockAlertDispatcher {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            simulate_failure: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let dispatcher = Self::new();
        dispatcher.simulate_failure.store(true, Ordering::SeqCst);
        dispatcher
    }

    pub fn dispatched(&self) -> Vec<AlertEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Default for MockAlertDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AlertDispatcher for MockAlertDispatcher {
    async fn dispatch(&self, event: &AlertEvent) -> DispatchResult {
        if self.simulate_failure.load(Ordering::SeqCst) {
            tracing::warn!(
                entity_id = %event.entity_id,
                kind = %event.kind,
                "Mock alert dispatcher simulating failure"
            );
            return DispatchResult::Failed("Simulated dispatch failure".to_string());
        }
        tracing::info!(
            entity_id = %event.entity_id,
            kind = %event.kind,
            severity = %event.severity.as_str(),
            "Mock dispatch: {}",
            event.message
        );
        self.events.lock().unwrap().push(event.clone());
        DispatchResult::Delivered
    }
}
