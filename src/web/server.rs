//! Axum server setup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::Config;

use super::routes::api_router;
use super::state::{spawn_snapshot_relay, AppState};
use super::websocket::ws_handler;

/// Id the web server registers its simulation under
pub const MAIN_SIMULATION: &str = "main";

/// Run the web server until Ctrl-C, then stop the simulation with a final save
pub async fn run_server(
    config: Config,
    bind: SocketAddr,
    static_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(config, MAIN_SIMULATION)?);

    // Start snapshot relay task
    spawn_snapshot_relay(state.clone());

    // CORS layer for development
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .merge(api_router())
        .fallback_service(ServeDir::new(&static_dir).append_index_html_on_directories(true))
        .layer(cors)
        .with_state(state.clone());

    log::info!("Starting web server on http://{} (static files from {})", bind, static_dir.display());

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Web server stopped, shutting down simulations");
    state.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
