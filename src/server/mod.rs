//! HTTP trigger surface
//!
//! `POST /mongodump` runs today's backup on demand for holders of an admin
//! token. `GET /health` is unauthenticated.

mod auth;
mod error;
mod handlers;
mod routes;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::backup::BackupOrchestrator;
use crate::config::ServerConfig;

pub use auth::JwtAuthority;
pub use routes::create_router;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BackupOrchestrator>,
    pub auth: Arc<JwtAuthority>,
}

impl AppState {
    pub fn new(orchestrator: Arc<BackupOrchestrator>, auth: JwtAuthority) -> Self {
        AppState {
            orchestrator,
            auth: Arc::new(auth),
        }
    }
}

/// Serves the API until `shutdown` is cancelled, letting in-flight requests finish.
pub async fn run(config: &ServerConfig, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(addr = %address, "Server running");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;

    tracing::info!("Server shut down");
    Ok(())
}

/// Cancels `shutdown` on Ctrl+C or SIGTERM.
pub async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => return,
    }
    shutdown.cancel();
}
