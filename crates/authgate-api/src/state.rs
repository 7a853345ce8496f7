//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use authgate_auth::{AuthOrchestrator, TokenIssuer};
use authgate_core::config::AppConfig;

/// Shared state, cloned into every request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Login, authenticate and logout.
    pub orchestrator: Arc<AuthOrchestrator>,
    /// Signs bearer tokens for `GET /api/jwt`; `None` without a usable `jwt` block.
    pub token_issuer: Option<Arc<TokenIssuer>>,
}

impl AppState {
    /// Builds the state. Token issuance is disabled, with a warning, when
    /// the `jwt` key cannot sign.
    pub fn new(config: AppConfig, orchestrator: Arc<AuthOrchestrator>) -> Self {
        let token_issuer = config.auth.jwt.as_ref().and_then(|jwt| {
            match TokenIssuer::from_config(&jwt.key, jwt.max_age_seconds) {
                Ok(issuer) => Some(Arc::new(issuer)),
                Err(e) => {
                    tracing::warn!(error = %e, "Token issuance disabled");
                    None
                }
            }
        });

        Self {
            config: Arc::new(config),
            orchestrator,
            token_issuer,
        }
    }
}
