//! Common test utilities for integration tests.
//!
//! The service keeps all state in process memory, so each test builds a
//! fresh router and drives it directly with `tower::ServiceExt::oneshot`.

// Allow dead code in this module - these are helper utilities that may not be
// used by all integration tests but are intentionally available for future use.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use serde_json::Value;

use tourist_monitor_api::app::{build_state, create_app, AppState};
use tourist_monitor_api::config::{
    ActivityConfig, Config, DispatchConfig, EvictionConfig, LoggingConfig, MonitorConfig,
    ServerConfig, ZonesConfig,
};
use domain::services::MonitorSettings;

/// Test configuration: console dispatch, no seed zones, eviction off.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
            max_body_size: 1_048_576,
            cors_origins: Vec::new(),
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
        monitor: MonitorConfig {
            scorer: "heuristic".to_string(),
            thresholds: MonitorSettings::default(),
        },
        dispatch: DispatchConfig {
            mode: "console".to_string(),
            webhook_url: String::new(),
            webhook_secret: String::new(),
            timeout_secs: 5,
        },
        activity: ActivityConfig {
            capacity_per_entity: 100,
            default_page_limit: 50,
            max_page_limit: 200,
        },
        eviction: EvictionConfig {
            enabled: false,
            max_idle_hours: 24,
            interval_minutes: 60,
        },
        zones: ZonesConfig::default(),
    }
}

/// Build the application state for a test.
pub fn create_test_state() -> AppState {
    build_state(test_config())
}

/// Build a router over fresh state.
pub fn create_test_app() -> Router {
    create_app(create_test_state())
}

/// Build a router sharing the given state, e.g. to inspect stores after
/// requests.
pub fn create_test_app_with_state(state: AppState) -> Router {
    create_app(state)
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

/// Build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

/// Build a DELETE request.
pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

/// Parse a response body as JSON.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&body).expect("Response body is not valid JSON")
}

/// Roughly one degree of latitude in meters on the engine's sphere.
pub const METERS_PER_DEGREE_LAT: f64 = std::f64::consts::PI * 6_371_000.0 / 180.0;

/// Base coordinates used across tests (Connaught Place, Delhi).
pub const BASE_LAT: f64 = 28.6139;
pub const BASE_LNG: f64 = 77.2090;

/// Base timestamp in epoch milliseconds.
pub const BASE_MILLIS: i64 = 1_700_000_000_000;

/// Ingest request body for an entity at an offset in seconds.
pub fn sample_body(entity_id: &str, lat: f64, lng: f64, offset_seconds: i64) -> Value {
    serde_json::json!({
        "entityId": entity_id,
        "latitude": lat,
        "longitude": lng,
        "timestamp": BASE_MILLIS + offset_seconds * 1000,
    })
}
