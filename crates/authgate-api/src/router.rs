//! Route definitions for the AuthGate HTTP API.
//!
//! All routes are mounted under `/api`.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()));

    Router::new()
        .nest("/api", api_routes)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Login, logout and health: no authentication required
fn public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(handlers::auth::login).get(handlers::auth::login),
        )
        .route("/logout", post(handlers::auth::logout))
        .route("/health", get(handlers::health::health))
}

/// Endpoints behind `require_auth`
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::auth::me))
        .route("/jwt", get(handlers::auth::issue_token))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}
