//! Integration tests for entity state, activity feed and directory endpoints.
//!
//! Run with: cargo test --test entities_integration

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_test_app, create_test_app_with_state, create_test_state, delete_request, get_request,
    json_request, parse_response_body, sample_body, BASE_LAT, BASE_LNG,
};
use serde_json::json;
use tower::ServiceExt;

// ============================================================================
// Entity state
// ============================================================================

#[tokio::test]
async fn test_list_entities_empty() {
    let app = create_test_app();

    let response = app.oneshot(get_request("/api/v1/entities")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["entities"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_get_entity_after_ingest() {
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
    let response = app
        .oneshot(get_request("/api/v1/entities/tourist-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["entityId"], "tourist-1");
    assert_eq!(body["displayName"], "Unknown");
    assert_eq!(body["currentZone"], "safe");
    assert_eq!(body["historySize"], 1);
    assert_eq!(body["repeatingAlertActive"], false);
    assert_eq!(body["lastLocation"]["latitude"], BASE_LAT);
}

#[tokio::test]
async fn test_get_unknown_entity_returns_404() {
    let app = create_test_app();

    let response = app
        .oneshot(get_request("/api/v1/entities/ghost"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "not_found");
}

// ============================================================================
// Activity feed
// ============================================================================

#[tokio::test]
async fn test_activity_feed_pages_newest_first() {
    let state = create_test_state();

    for offset in 0..5 {
        let app = create_test_app_with_state(state.clone());
        app.oneshot(json_request(
            Method::POST,
            "/api/v1/locations",
            sample_body("tourist-1", BASE_LAT, BASE_LNG, offset * 60),
        ))
        .await
        .unwrap();
    }

    let app = create_test_app_with_state(state.clone());
    let response = app
        .oneshot(get_request("/api/v1/entities/tourist-1/activities?limit=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(body["hasMore"], true);
    let first_ts = entries[0]["timestamp"].as_str().unwrap().to_string();
    let second_ts = entries[1]["timestamp"].as_str().unwrap().to_string();
    assert!(first_ts > second_ts, "entries must be newest first");

    // Follow the cursor to the next page
    let cursor = body["nextCursor"].as_str().unwrap().to_string();
    let app = create_test_app_with_state(state);
    let response = app
        .oneshot(get_request(&format!(
            "/api/v1/entities/tourist-1/activities?limit=2&cursor={}",
            cursor
        )))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0]["timestamp"].as_str().unwrap() < second_ts.as_str());
}

#[tokio::test]
async fn test_activity_feed_unknown_entity_returns_404() {
    let app = create_test_app();

    let response = app
        .oneshot(get_request("/api/v1/entities/ghost/activities"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_activity_feed_rejects_garbage_cursor() {
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
    let response = app
        .oneshot(get_request(
            "/api/v1/entities/tourist-1/activities?cursor=not-a-cursor",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Manual alerts
// ============================================================================

#[tokio::test]
async fn test_trigger_alert_for_tracked_entity() {
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
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/entities/tourist-1/alerts",
            json!({"kind": "zone_repeat"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["kind"], "zone_repeat");
    assert_eq!(body["severity"], "HIGH");
    assert_eq!(body["delivered"], true);
    assert_eq!(body["entityId"], "tourist-1");
}

#[tokio::test]
async fn test_trigger_alert_rejects_unknown_kind() {
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
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/entities/tourist-1/alerts",
            json!({"kind": "panic"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("Valid values"));
}

#[tokio::test]
async fn test_trigger_alert_unknown_entity_returns_404() {
    let app = create_test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/entities/ghost/alerts",
            json!({"kind": "anomaly"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_zone_alerts_resets_state() {
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
    let response = app
        .oneshot(delete_request("/api/v1/entities/tourist-1/zone-alerts"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["currentZone"], "safe");
    assert_eq!(body["repeatingAlertActive"], false);
    assert!(body.get("zoneEnteredAt").is_none());
}

// ============================================================================
// Directory
// ============================================================================

#[tokio::test]
async fn test_directory_name_applies_to_new_entities() {
    let state = create_test_state();

    let app = create_test_app_with_state(state.clone());
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/directory",
            json!({"entityId": "tourist-1", "displayName": "Asha Verma"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["entityId"], "tourist-1");
    assert_eq!(body["displayName"], "Asha Verma");
    assert!(body.get("previous").is_none());

    let app = create_test_app_with_state(state);
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/locations",
            sample_body("tourist-1", BASE_LAT, BASE_LNG, 0),
        ))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["name"], "Asha Verma");
}

#[tokio::test]
async fn test_directory_reregistration_reports_previous_name() {
    let state = create_test_state();

    let app = create_test_app_with_state(state.clone());
    app.oneshot(json_request(
        Method::POST,
        "/api/v1/directory",
        json!({"entityId": "tourist-1", "displayName": "Asha Verma"}),
    ))
    .await
    .unwrap();

    let app = create_test_app_with_state(state);
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/directory",
            json!({"entityId": "tourist-1", "displayName": "A. Verma"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["displayName"], "A. Verma");
    assert_eq!(body["previous"], "Asha Verma");
}

#[tokio::test]
async fn test_directory_list_sorted() {
    let state = create_test_state();

    for (id, name) in [("walker-b", "Ravi"), ("walker-a", "Meera")] {
        let app = create_test_app_with_state(state.clone());
        app.oneshot(json_request(
            Method::POST,
            "/api/v1/directory",
            json!({"entityId": id, "displayName": name}),
        ))
        .await
        .unwrap();
    }

    let app = create_test_app_with_state(state);
    let response = app.oneshot(get_request("/api/v1/directory")).await.unwrap();
    let body = parse_response_body(response).await;

    assert_eq!(body["count"], 2);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries[0]["entityId"], "walker-a");
    assert_eq!(entries[1]["entityId"], "walker-b");
}

#[tokio::test]
async fn test_directory_holds_many_entries() {
    use fake::faker::name::en::Name;
    use fake::Fake;

    let state = create_test_state();

    for i in 0..30 {
        let name: String = Name().fake();
        let app = create_test_app_with_state(state.clone());
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/directory",
                json!({"entityId": format!("tourist-{}", i), "displayName": name}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let app = create_test_app_with_state(state);
    let response = app.oneshot(get_request("/api/v1/directory")).await.unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["count"], 30);
}

#[tokio::test]
async fn test_directory_rejects_blank_name() {
    let app = create_test_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/directory",
            json!({"entityId": "tourist-1", "displayName": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
