//! # authgate-api
//!
//! HTTP API layer for AuthGate built on Axum.
//!
//! Adapts the authentication orchestrator to HTTP: login, logout and
//! identity endpoints, the `require_auth` middleware, extractors, DTOs and
//! error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod exchange;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
