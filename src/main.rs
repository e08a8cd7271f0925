use anyhow::Context;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use booking_system::{config::Config, controllers, services::cleanup::CleanupService, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Excursion Booking API");

    let app_state = AppState::new(config.clone())
        .await
        .context("failed to initialize application state")?;
    info!("Database and Redis connected");

    // --- Start background tasks ---

    // Периодическая отмена просроченных PENDING-броней
    let cleanup = CleanupService::new(app_state.clone());
    let cleanup_interval = config.reservation.cleanup_interval_seconds;
    task::spawn(async move {
        loop {
            cleanup.run_full_cleanup().await;
            tokio::time::sleep(Duration::from_secs(cleanup_interval)).await;
        }
    });

    // --- Start the web server ---

    let app = Router::new()
        .route("/", get(|| async { "Excursion Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        // Mount the routes from the controllers module
        .nest("/api", controllers::routes())
        .with_state(app_state.clone())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
