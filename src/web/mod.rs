//! HTTP surface: upload form, `/process`, and `/downloads/{filename}`.

pub mod error;
pub mod flash;
pub mod handlers;
pub mod page;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, ReelpressError};
use crate::workflow::Workflow;
use flash::FlashSigner;

/// Shared per-process state handed to every handler.
pub struct AppState {
    pub workflow: Arc<Workflow>,
    pub flash: FlashSigner,
}

impl AppState {
    pub fn new(config: &Config, workflow: Workflow) -> Self {
        Self {
            workflow: Arc::new(workflow),
            flash: FlashSigner::new(&config.server.secret),
        }
    }
}

pub fn router(config: &Config, state: AppState) -> Router {
    let body_limit = usize::try_from(config.server.max_upload_mb.saturating_mul(1024 * 1024))
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(handlers::index))
        .route("/process", post(handlers::process))
        .route("/downloads/{filename}", get(handlers::download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &Config, workflow: Workflow) -> Result<()> {
    workflow.storage().ensure_dirs().await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| ReelpressError::Config(format!("Invalid listen address: {}", e)))?;

    let app = router(config, AppState::new(config, workflow));
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!("Cannot listen for Ctrl-C, running until killed: {}", e);
            std::future::pending::<()>().await
        }
    }
}
