//! Integration tests for health, status and metrics endpoints.
//!
//! Run with: cargo test --test health_integration

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_test_app, create_test_app_with_state, create_test_state, get_request, json_request,
    parse_response_body, sample_body, BASE_LAT, BASE_LNG,
};
use tower::ServiceExt;

// ============================================================================
// Health probes
// ============================================================================

#[tokio::test]
async fn test_health_check_reports_zone_provider() {
    let app = create_test_app();

    let response = app.oneshot(get_request("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["zone_provider"]["degraded"], false);
    assert_eq!(body["zone_provider"]["active_zones"], 0);
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = create_test_app();

    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_probe() {
    let app = create_test_app();

    let response = app.oneshot(get_request("/api/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "ready");
}

// ============================================================================
// Status summary
// ============================================================================

#[tokio::test]
async fn test_status_summary_counts_entities_and_records() {
    let state = create_test_state();

    for offset in 0..3 {
        let app = create_test_app_with_state(state.clone());
        app.oneshot(json_request(
            Method::POST,
            "/api/v1/locations",
            sample_body("tourist-1", BASE_LAT, BASE_LNG, offset * 60),
        ))
        .await
        .unwrap();
    }

    let app = create_test_app_with_state(state);
    let response = app.oneshot(get_request("/api/v1/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["service"], "tourist-monitor");
    assert_eq!(body["scorer"], "heuristic");
    assert_eq!(body["entitiesTracked"], 1);
    assert_eq!(body["zonesActive"], 0);
    assert_eq!(body["zoneCacheDegraded"], false);
    assert_eq!(body["activityRecords"], 3);
}

// ============================================================================
// Metrics export
// ============================================================================

// Sole test touching the global recorder; installing it twice panics, so
// this file must not gain a second init_metrics call.
#[tokio::test]
async fn test_metrics_endpoint_exports_request_counters() {
    tourist_monitor_api::middleware::metrics::init_metrics();

    let state = create_test_state();
    let app = create_test_app_with_state(state.clone());
    app.oneshot(json_request(
        Method::POST,
        "/api/v1/locations",
        sample_body("tourist-1", BASE_LAT, BASE_LNG, 0),
    ))
    .await
    .unwrap();

    let app = create_test_app_with_state(state);
    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("samples_processed_total"));
}

// ============================================================================
// Unknown routes
// ============================================================================

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = create_test_app();

    let response = app
        .oneshot(get_request("/api/v1/nonexistent"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
