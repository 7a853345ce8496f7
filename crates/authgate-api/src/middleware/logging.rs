//! Per-request span and access log.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::field::Empty;
use tracing::{Instrument, Span, info, info_span};

/// Name of the span field filled in once the caller is identified.
pub const USER_FIELD: &str = "user";

/// Wraps the request in an `http_request` span and logs method, path,
/// status, duration and (when authenticated) the username.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = info_span!("http_request", method = %method, path = %path, user = Empty);
    let start = Instant::now();

    let response = next.run(request).instrument(span.clone()).await;

    info!(
        parent: &span,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "HTTP request"
    );

    response
}

/// Records the authenticated username on the enclosing request span.
pub fn record_user(username: &str) {
    Span::current().record(USER_FIELD, username);
}
