//! HTTP surface of the event hub: the `/events` subscription endpoint, the
//! producer endpoints that publish to it, and server startup/shutdown.

use axum::http::{HeaderValue, Method};
use axum::Router;
use log::*;
use service::config::Config;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub use service::AppState;

pub use error::Error;

mod controller;
pub mod directory;
mod error;
mod params;
pub mod router;
pub mod sse;

/// Builds the full application router with CORS applied.
pub fn build_app(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);
    router::define_routes(app_state).layer(cors)
}

/// Binds the configured address and serves until Ctrl-C or SIGTERM.
///
/// On shutdown every subscriber queue is closed first so open event streams
/// finish and the graceful drain does not wait on them forever.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let listen_addr = app_state.config.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Server starting... listening for connections on http://{listen_addr}");

    let shutdown_state = app_state.clone();
    axum::serve(listener, build_app(app_state))
        .with_graceful_shutdown(shutdown_signal(shutdown_state))
        .await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal(app_state: AppState) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, closing SSE connections");
    app_state.sse_manager.shutdown();
}
