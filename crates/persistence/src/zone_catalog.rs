//! Zone catalog backing the geofence provider seam.
//!
//! Holds the authoritative zone definitions for the deployment. The
//! monitor reads them through [`GeofenceProvider`]; administration
//! endpoints mutate them and invalidate the monitor's cache.

use std::sync::RwLock;

use uuid::Uuid;

use domain::models::GeofenceZone;
use domain::services::GeofenceProvider;

use crate::metrics::record_store_size;

pub struct InMemoryZoneCatalog {
    zones: RwLock<Vec<GeofenceZone>>,
}

impl InMemoryZoneCatalog {
    pub fn new() -> Self {
        Self {
            zones: RwLock::new(Vec::new()),
        }
    }

    pub fn with_seed(zones: Vec<GeofenceZone>) -> Self {
        tracing::info!(zones = zones.len(), "Seeding zone catalog");
        Self {
            zones: RwLock::new(zones),
        }
    }

    /// Adds a zone and returns the stored definition.
    pub fn insert(&self, zone: GeofenceZone) -> GeofenceZone {
        let mut zones = self.zones.write().unwrap();
        zones.push(zone.clone());
        record_store_size("zone_catalog", zones.len());
        tracing::info!(
            zone_id = %zone.id,
            name = %zone.name,
            zone_type = %zone.zone_type,
            "Registered geofence zone"
        );
        zone
    }

    /// Marks a zone inactive. Returns false for unknown ids.
    pub fn deactivate(&self, zone_id: Uuid) -> bool {
        let mut zones = self.zones.write().unwrap();
        match zones.iter_mut().find(|zone| zone.id == zone_id) {
            Some(zone) => {
                zone.active = false;
                tracing::info!(zone_id = %zone_id, name = %zone.name, "Deactivated geofence zone");
                true
            }
            None => false,
        }
    }

    /// All zones including inactive ones, for administration listings.
    pub fn list(&self) -> Vec<GeofenceZone> {
        self.zones.read().unwrap().clone()
    }

    pub fn active_count(&self) -> usize {
        self.zones
            .read()
            .unwrap()
            .iter()
            .filter(|zone| zone.active)
            .count()
    }
}

impl Default for InMemoryZoneCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GeofenceProvider for InMemoryZoneCatalog {
    async fn list_active(&self) -> Result<Vec<GeofenceZone>, String> {
        Ok(self
            .zones
            .read()
            .unwrap()
            .iter()
            .filter(|zone| zone.active)
            .cloned()
            .collect())
    }
}
