//! Authentication middleware for protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::exchange::{exchange_from_parts, with_headers};
use crate::state::AppState;

use super::logging::record_user;

/// Rejects requests that carry neither a valid bearer token nor a valid
/// session cookie. On success the identity is placed in the request
/// extensions for the `CurrentUser` extractor.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let exchange = exchange_from_parts(&parts);

    state
        .orchestrator
        .authenticate(
            exchange,
            |mut exchange| async move {
                let mut request = Request::from_parts(parts, body);
                if let Some(identity) = exchange.identity().cloned() {
                    record_user(identity.username());
                    request.extensions_mut().insert(identity);
                }
                let response = next.run(request).await;
                with_headers(exchange.take_response_headers(), response)
            },
            |_exchange, err| async move {
                tracing::debug!(error = %err, "Request rejected");
                ApiError::from(err).into_response()
            },
        )
        .await
}
