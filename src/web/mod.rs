//! HTTP interface
//!
//! JSON endpoints for UI events, the SSE stream and static model assets.

pub mod api;
pub mod routes;

use axum::Router;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, WebError};
use crate::AppState;

/// Web server for the renderer and control API
pub struct WebServer {
    app_state: Arc<AppState>,
    config: Config,
}

impl WebServer {
    /// Create a new web server
    pub fn new(app_state: Arc<AppState>, config: &Config) -> Self {
        Self {
            app_state,
            config: config.clone(),
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        routes::create_router(
            Arc::clone(&self.app_state),
            &self.config.http,
            &self.config.animation.models_dir,
        )
    }

    fn address(&self) -> String {
        format!("{}:{}", self.config.http.host, self.config.http.port)
    }

    /// Serve until shutdown is signalled
    pub async fn serve(self) -> Result<()> {
        let addr = self.address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| WebError::Bind(format!("{}: {}", addr, e)))?;
        tracing::info!("HTTP server listening on {}", addr);

        let mut shutdown_rx = self.app_state.subscribe_shutdown();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
