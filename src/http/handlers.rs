use axum::{
    extract::State,
    http::{StatusCode, Uri},
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::redirection::LoadState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub redirections: RedirectionStatus,
    pub hashing: HashingStatus,
}

#[derive(Serialize)]
pub struct RedirectionStatus {
    pub state: LoadState,
    pub rules: usize,
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct HashingStatus {
    pub pool_size: usize,
    pub spawned: u64,
    pub idle: usize,
    pub in_flight: usize,
    pub pending: usize,
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    // peek: reporting must not be what triggers the first rule load.
    let table = state.redirects.peek();
    let pool = &state.hashing;

    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        redirections: RedirectionStatus {
            state: table.state(),
            rules: table.len(),
            source: table.source().map(|p| p.display().to_string()),
        },
        hashing: HashingStatus {
            pool_size: pool.pool_size(),
            spawned: pool.spawned(),
            idle: pool.idle(),
            in_flight: pool.in_flight(),
            pending: pool.pending(),
        },
    })
}

/// Whatever got past the redirection middleware without a route.
pub async fn not_found(uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    tracing::debug!(path = %uri.path(), "No handler for path");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "not-found",
            "path": uri.path(),
        })),
    )
}
