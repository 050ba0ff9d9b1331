//! Cached geofence zone index.
//!
//! Zone definitions come from a [`GeofenceProvider`] and are cached for a
//! short TTL with geometry prepared for point lookups. Provider failures
//! fail open: an empty degraded set is served and the provider is retried
//! after a backoff instead of on every sample.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use shared::geodesy::{haversine_distance_meters, PolygonRing};

use crate::models::{AlertZoneInfo, GeofenceZone, ZoneGeometry};
use crate::services::collaborators::GeofenceProvider;
use crate::services::settings::MonitorSettings;

/// A zone with containment geometry ready for repeated queries.
pub struct PreparedZone {
    pub zone: GeofenceZone,
    ring: Option<PolygonRing>,
}

impl PreparedZone {
    fn prepare(zone: GeofenceZone) -> Self {
        let ring = match &zone.geometry {
            ZoneGeometry::Polygon { vertices } => {
                let coords: Vec<(f64, f64)> =
                    vertices.iter().map(|v| (v.latitude, v.longitude)).collect();
                let ring = PolygonRing::new(&coords);
                if ring.is_none() {
                    tracing::warn!(
                        zone_id = %zone.id,
                        name = %zone.name,
                        "Ignoring polygon zone with a degenerate ring"
                    );
                }
                ring
            }
            ZoneGeometry::Circle { .. } => None,
        };
        Self { zone, ring }
    }

    /// Whether the point falls inside this zone. The buffer widens
    /// circular boundaries only; polygon edges are exact.
    pub fn contains(&self, latitude: f64, longitude: f64, buffer_meters: f64) -> bool {
        match &self.zone.geometry {
            ZoneGeometry::Circle {
                center_lat,
                center_lng,
                radius_meters,
            } => {
                let distance =
                    haversine_distance_meters(latitude, longitude, *center_lat, *center_lng);
                distance <= radius_meters + buffer_meters
            }
            ZoneGeometry::Polygon { .. } => self
                .ring
                .as_ref()
                .map(|ring| ring.contains(latitude, longitude))
                .unwrap_or(false),
        }
    }
}

/// Immutable view over one cached zone set.
#[derive(Clone)]
pub struct ZoneView {
    zones: Arc<Vec<PreparedZone>>,
    /// True when this view is the fail-open fallback after a provider failure.
    pub degraded: bool,
    buffer_meters: f64,
}

impl ZoneView {
    /// Finds the governing zone for a point. When zones overlap the most
    /// severe type wins (unsafe over restricted over safe); ties keep the
    /// first zone in provider order.
    pub fn locate(&self, latitude: f64, longitude: f64) -> Option<AlertZoneInfo> {
        let mut best: Option<&PreparedZone> = None;
        for candidate in self.zones.iter() {
            if !candidate.contains(latitude, longitude, self.buffer_meters) {
                continue;
            }
            let better = match best {
                None => true,
                Some(current) => {
                    candidate.zone.zone_type.severity_rank() > current.zone.zone_type.severity_rank()
                }
            };
            if better {
                best = Some(candidate);
            }
        }
        best.map(|prepared| AlertZoneInfo {
            zone_id: prepared.zone.id,
            zone_name: prepared.zone.name.clone(),
            zone_type: prepared.zone.zone_type,
        })
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }
}

struct CacheSlot {
    zones: Arc<Vec<PreparedZone>>,
    fetched_at: Instant,
    degraded: bool,
}

impl CacheSlot {
    fn is_fresh(&self, ttl: Duration, retry_backoff: Duration) -> bool {
        let deadline = if self.degraded { retry_backoff } else { ttl };
        self.fetched_at.elapsed() < deadline
    }
}

pub struct GeofenceIndex {
    provider: Arc<dyn GeofenceProvider>,
    cache: RwLock<Option<CacheSlot>>,
    ttl: Duration,
    retry_backoff: Duration,
    call_timeout: Duration,
    buffer_meters: f64,
}

impl GeofenceIndex {
    pub fn new(provider: Arc<dyn GeofenceProvider>, settings: &MonitorSettings) -> Self {
        Self {
            provider,
            cache: RwLock::new(None),
            ttl: Duration::from_secs(settings.zone_cache_ttl_seconds),
            retry_backoff: Duration::from_secs(settings.provider_retry_seconds),
            call_timeout: Duration::from_secs(settings.downstream_timeout_seconds),
            buffer_meters: settings.geofence_buffer_meters,
        }
    }

    /// Returns the current zone view, refreshing from the provider when
    /// the cached set has expired. Never fails: a provider error yields a
    /// degraded empty view.
    pub async fn snapshot(&self) -> ZoneView {
        {
            let cache = self.cache.read().await;
            if let Some(slot) = cache.as_ref() {
                if slot.is_fresh(self.ttl, self.retry_backoff) {
                    return self.view_of(slot);
                }
            }
        }
        self.refresh().await
    }

    /// Drops the cached set so the next snapshot refetches. Called after
    /// zone administration changes.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn refresh(&self) -> ZoneView {
        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(slot) = cache.as_ref() {
            if slot.is_fresh(self.ttl, self.retry_backoff) {
                return self.view_of(slot);
            }
        }

        let slot = match tokio::time::timeout(self.call_timeout, self.provider.list_active()).await
        {
            Ok(Ok(zones)) => {
                let prepared: Vec<PreparedZone> = zones
                    .into_iter()
                    .filter(|zone| zone.active)
                    .map(PreparedZone::prepare)
                    .collect();
                tracing::debug!(zones = prepared.len(), "Refreshed geofence zone cache");
                CacheSlot {
                    zones: Arc::new(prepared),
                    fetched_at: Instant::now(),
                    degraded: false,
                }
            }
            Ok(Err(reason)) => {
                tracing::warn!(%reason, "Zone provider failed, serving empty zone set");
                CacheSlot {
                    zones: Arc::new(Vec::new()),
                    fetched_at: Instant::now(),
                    degraded: true,
                }
            }
            Err(_) => {
                tracing::warn!(
                    timeout_seconds = self.call_timeout.as_secs(),
                    "Zone provider timed out, serving empty zone set"
                );
                CacheSlot {
                    zones: Arc::new(Vec::new()),
                    fetched_at: Instant::now(),
                    degraded: true,
                }
            }
        };

        let view = self.view_of(&slot);
        *cache = Some(slot);
        view
    }

    fn view_of(&self, slot: &CacheSlot) -> ZoneView {
        ZoneView {
            zones: Arc::clone(&slot.zones),
            degraded: slot.degraded,
            buffer_meters: self.buffer_meters,
        }
    }
}
