//! Domain services for the tourist location monitor.
//!
//! Services contain the monitoring pipeline: state tracking, zone
//! lookup, anomaly scoring, alert policy and the orchestrating monitor.

pub mod collaborators;
pub mod features;
pub mod geofence;
pub mod monitor;
pub mod policy;
pub mod scorer;
pub mod settings;
pub mod tracker;

pub use collaborators::{
    ActivityRecorder, AlertDispatcher, DispatchResult, EntityDirectory, GeofenceProvider,
    MockActivityRecorder, MockAlertDispatcher, MockEntityDirectory, MockGeofenceProvider,
    RecordResult,
};

pub use features::{MotionFeatures, RECENT_SPEED_WINDOW};

pub use geofence::{GeofenceIndex, PreparedZone, ZoneView};

pub use monitor::LocationMonitor;

pub use policy::{default_severity, AlertPolicyEngine, HIGH_ANOMALY_SCORE};

pub use scorer::{
    AnomalyScorer, HeuristicScorer, MotionProfileScorer, ScoreOutcome, STATIONARY_PATTERN_SCORE,
    SUSPICIOUS_SPEED_SCORE,
};

pub use settings::MonitorSettings;

pub use tracker::EntityStateTracker;
