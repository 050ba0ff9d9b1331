//! Geodesic math helpers.
//!
//! Distances are great-circle (haversine) on a sphere; containment tests
//! treat coordinates as WGS84 latitude/longitude degrees.

use geo::{Contains, LineString, Point, Polygon};

/// Mean Earth radius in meters used for all haversine math.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two lat/lng points.
pub fn haversine_distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Initial bearing in degrees from the first point to the second,
/// normalized to `[0, 360)`.
pub fn initial_bearing_degrees(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Absolute angular difference between two bearings, in `[0, 180]`.
pub fn bearing_change_degrees(from: f64, to: f64) -> f64 {
    let diff = (to - from).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// A polygon ring prepared for repeated containment queries.
///
/// The bounding box is a pre-filter only; points passing it are tested
/// against the exact ring, so non-convex shapes are handled correctly.
#[derive(Debug, Clone)]
pub struct PolygonRing {
    polygon: Polygon<f64>,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl PolygonRing {
    /// Build a ring from `(lat, lng)` vertices. The ring is closed
    /// implicitly. Returns `None` for fewer than three vertices.
    pub fn new(vertices: &[(f64, f64)]) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }

        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;
        for &(lat, lng) in vertices {
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
            min_lng = min_lng.min(lng);
            max_lng = max_lng.max(lng);
        }

        // geo uses (x, y) = (lng, lat)
        let exterior: LineString<f64> = vertices
            .iter()
            .map(|&(lat, lng)| (lng, lat))
            .collect::<Vec<_>>()
            .into();

        Some(Self {
            polygon: Polygon::new(exterior, vec![]),
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Exact containment test with a bounding-box fast path.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        if lat < self.min_lat || lat > self.max_lat || lng < self.min_lng || lng > self.max_lng {
            return false;
        }
        self.polygon.contains(&Point::new(lng, lat))
    }
}
