use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use validator::Validate;

use domain::services::{
    ActivityRecorder, AlertDispatcher, AnomalyScorer, EntityDirectory, GeofenceProvider,
    HeuristicScorer, LocationMonitor, MotionProfileScorer,
};
use persistence::activity_log::InMemoryActivityLog;
use persistence::directory::InMemoryDirectory;
use persistence::zone_catalog::InMemoryZoneCatalog;

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes;
use crate::services::{ConsoleAlertDispatcher, WebhookAlertDispatcher};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<LocationMonitor>,
    pub zone_catalog: Arc<InMemoryZoneCatalog>,
    pub directory: Arc<InMemoryDirectory>,
    pub activity_log: Arc<InMemoryActivityLog>,
    pub config: Arc<Config>,
}

/// Builds the shared state from configuration: stores, scorer, dispatcher
/// and the monitor wired together.
pub fn build_state(config: Config) -> AppState {
    let activity_log = Arc::new(InMemoryActivityLog::new(config.activity.capacity_per_entity));
    let directory = Arc::new(InMemoryDirectory::new());

    let zone_catalog = Arc::new(InMemoryZoneCatalog::new());
    for seed in &config.zones.seed {
        let name = seed.name.clone();
        match seed.clone().into_request() {
            Ok(request) => match request.validate() {
                Ok(()) => {
                    zone_catalog.insert(request.into_zone());
                }
                Err(err) => {
                    warn!(zone = %name, error = %err, "Skipping invalid seed zone");
                }
            },
            Err(err) => {
                warn!(zone = %name, error = %err, "Skipping invalid seed zone");
            }
        }
    }

    let thresholds = config.monitor.thresholds.clone();
    let scorer: Arc<dyn AnomalyScorer> = match config.monitor.scorer.as_str() {
        "profile" => Arc::new(MotionProfileScorer::new(
            thresholds.max_walking_speed_mps,
            thresholds.stationary_displacement_meters,
        )),
        _ => Arc::new(HeuristicScorer::new(thresholds.suspicious_speed_mps)),
    };

    let dispatcher: Arc<dyn AlertDispatcher> = match config.dispatch.mode.as_str() {
        "webhook" => Arc::new(WebhookAlertDispatcher::new(
            config.dispatch.webhook_url.clone(),
            config.dispatch.webhook_secret.clone(),
            config.dispatch.timeout_secs,
        )),
        _ => Arc::new(ConsoleAlertDispatcher),
    };

    let monitor = Arc::new(LocationMonitor::new(
        thresholds,
        scorer,
        zone_catalog.clone() as Arc<dyn GeofenceProvider>,
        directory.clone() as Arc<dyn EntityDirectory>,
        activity_log.clone() as Arc<dyn ActivityRecorder>,
        dispatcher,
    ));

    AppState {
        monitor,
        zone_catalog,
        directory,
        activity_log,
        config: Arc::new(config),
    }
}

/// Creates the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // An empty origin list keeps the permissive default for local use.
    let cors = if state.config.server.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = state
            .config
            .server
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Health and metrics endpoints, outside the versioned API surface.
    let public_routes = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/health/ready", get(routes::health::ready))
        .route("/api/health/live", get(routes::health::live))
        .route("/metrics", get(metrics_handler));

    let api_routes = Router::new()
        .route("/api/v1/status", get(routes::health::status))
        .route("/api/v1/locations", post(routes::locations::ingest_location))
        .route("/api/v1/simulate", post(routes::locations::simulate_walk))
        .route("/api/v1/entities", get(routes::entities::list_entities))
        .route("/api/v1/entities/:entity_id", get(routes::entities::get_entity))
        .route(
            "/api/v1/entities/:entity_id/activities",
            get(routes::entities::list_activities),
        )
        .route(
            "/api/v1/entities/:entity_id/alerts",
            post(routes::entities::trigger_alert),
        )
        .route(
            "/api/v1/entities/:entity_id/zone-alerts",
            delete(routes::entities::clear_zone_alerts),
        )
        .route(
            "/api/v1/directory",
            get(routes::entities::list_directory).post(routes::entities::register_directory_entry),
        )
        .route(
            "/api/v1/zones",
            get(routes::zones::list_zones).post(routes::zones::create_zone),
        )
        .route("/api/v1/zones/:zone_id", delete(routes::zones::deactivate_zone));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
