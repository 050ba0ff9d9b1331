use anyhow::Result;
use std::time::Duration;
use tracing::info;

use tourist_monitor_api::jobs::{EvictEntitiesJob, JobScheduler};
use tourist_monitor_api::{app, config, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging and metrics
    middleware::logging::init_logging(&config.logging);
    middleware::metrics::init_metrics();

    info!("Starting Tourist Monitor v{}", env!("CARGO_PKG_VERSION"));

    // Build shared state: stores, scorer, dispatcher and the monitor
    let state = app::build_state(config);

    // Start background jobs
    let mut scheduler = JobScheduler::new();
    if state.config.eviction.enabled {
        scheduler.register(EvictEntitiesJob::new(
            state.monitor.clone(),
            state.activity_log.clone(),
            state.config.eviction.max_idle_hours,
            state.config.eviction.interval_minutes,
        ));
    }
    scheduler.start();

    // Build application
    let addr = state.config.socket_addr();
    let app = app::create_app(state);

    // Start server
    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop background jobs before exiting
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Shutdown signal received");
}
