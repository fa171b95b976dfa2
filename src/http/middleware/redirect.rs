//! Legacy path redirection middleware.
//! Answers `301 Moved Permanently` for paths matched by the rule table,
//! passes everything else to the next handler untouched.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::redirection::RedirectStore;

pub async fn redirect_middleware(
    State(store): State<Arc<RedirectStore>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // One snapshot per request: a concurrent reload cannot change the
    // rules halfway through.
    let table = store.snapshot();
    let path = request.uri().path().to_string();

    let target = match table.resolve(&path) {
        Some(target) => target,
        None => return next.run(request).await,
    };

    let location = match HeaderValue::from_str(&target) {
        Ok(location) => location,
        Err(_) => {
            tracing::warn!(path = %path, target = %target, "Redirect target is not a valid header value, passing through");
            return next.run(request).await;
        }
    };

    let referer = request
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info!(path = %path, target = %target, referer = %referer, "Redirecting");
    metrics::record_redirect();

    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}
