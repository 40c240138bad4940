use std::net::SocketAddr;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::info;

use super::{
    services::{
        from_header_binding, generic_command, generic_processor, health, metrics,
        nullable_enum_query, registry, response_caching, verify_post_processor,
    },
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generic-processor", post(generic_processor))
        .route("/verify-post-processor", get(verify_post_processor))
        .route("/nullable-enum-query-test", get(nullable_enum_query))
        .route("/from-header-binding", get(from_header_binding))
        .route("/response-caching", get(response_caching))
        .route("/generic-command", post(generic_command))
        .route("/operators/metrics", get(metrics))
        .route("/operators/registry", get(registry))
        .route("/operators/health", get(health))
        .route("/health", get(health))
        .with_state(state)
        // Transparently decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
}

/// Build the app state from `config` and serve until a shutdown signal.
///
/// `address` overrides `server.bind_addr`.
pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    info!(mode = ?config.resolver.mode, "Building application state");
    let state = AppState::build(config).map_err(|e| format!("Failed to start: {}", e))?;

    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "aot-checker listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
