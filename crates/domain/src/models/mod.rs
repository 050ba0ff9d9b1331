//! Domain models for the tourist safety monitor.

pub mod alert;
pub mod analysis;
pub mod entity_state;
pub mod sample;
pub mod zone;

pub use alert::{AlertDelivery, AlertEvent, AlertKind, AlertSeverity, AlertZoneInfo};
pub use analysis::{ActivitySnapshot, AnalysisResult};
pub use entity_state::{EntityState, EntityStateSnapshot, HistoryPoint, MotionDelta};
pub use sample::{GeoPoint, IngestSampleRequest, LocationSample};
pub use zone::{CreateZoneRequest, GeofenceZone, ZoneGeometry, ZoneType};
