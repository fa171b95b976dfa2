//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, redirection)
//! - Bind server to listener and shut down gracefully
//!
//! Forum pages are served elsewhere; this host only carries what sits in
//! front of them.

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ForumConfig;
use crate::hashing::HashingPool;
use crate::http::handlers;
use crate::http::middleware::redirect_middleware;
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::redirection::RedirectStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub redirects: Arc<RedirectStore>,
    pub hashing: Arc<HashingPool>,
}

/// HTTP server for the forum edge.
pub struct HttpServer {
    router: Router,
    config: ForumConfig,
}

impl HttpServer {
    pub fn new(config: ForumConfig, redirects: Arc<RedirectStore>, hashing: Arc<HashingPool>) -> Self {
        let state = AppState { redirects, hashing };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ForumConfig, state: AppState) -> Router {
        let redirects = state.redirects.clone();

        Router::new()
            .route("/health", get(handlers::get_health))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(middleware::from_fn_with_state(redirects, redirect_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ForumConfig {
        &self.config
    }
}
