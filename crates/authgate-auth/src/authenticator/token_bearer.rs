//! Stateless bearer-token authentication.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use authgate_core::config::JwtConfig;

use crate::error::AuthError;
use crate::exchange::Exchange;
use crate::identity::{AuthMode, Identity};
use crate::jwt::TokenVerifier;
use crate::user::UserStore;

use super::token_user::TokenUserResolver;
use super::{Authenticator, InitContext, Initialize};

/// Verifies the token in `X-Auth-Token` or `Authorization: Bearer`.
#[derive(Debug, Clone)]
pub struct TokenBearerAuthenticator {
    verifier: TokenVerifier,
    resolver: TokenUserResolver,
}

impl TokenBearerAuthenticator {
    /// With `validate_user`, the token subject must be a stored user and the
    /// stored roles and projects apply.
    pub fn new(verifier: TokenVerifier, users: Arc<dyn UserStore>, validate_user: bool) -> Self {
        Self {
            verifier,
            resolver: TokenUserResolver::new(users, validate_user, !validate_user),
        }
    }

    /// Stage one of request authentication. `None` when the request has no
    /// token or the token is not acceptable.
    pub async fn authenticate(&self, exchange: &Exchange) -> Option<Identity> {
        let token = exchange.bearer_token()?;
        let claims = self.verifier.verify(token).ok()?;
        let identity = self.resolver.resolve(&claims, None, AuthMode::Token).await.ok()?;
        (!identity.is_expired()).then_some(identity)
    }
}

impl Initialize for TokenBearerAuthenticator {
    type Config = JwtConfig;

    fn initialize(ctx: &InitContext, config: &JwtConfig) -> Result<Self, AuthError> {
        let verifier = TokenVerifier::from_config(&config.key).map_err(|e| {
            error!(error = %e, "Invalid bearer token key");
            AuthError::init_failed("jwt")
        })?;
        Ok(Self::new(
            verifier,
            Arc::clone(&ctx.users),
            config.validate_user,
        ))
    }
}

#[async_trait]
impl Authenticator for TokenBearerAuthenticator {
    fn name(&self) -> &'static str {
        "jwt"
    }

    async fn can_handle(&self, _candidate: Option<&Identity>, exchange: &Exchange) -> bool {
        exchange.bearer_token().is_some()
    }

    async fn attempt_login(
        &self,
        candidate: Option<&Identity>,
        exchange: &mut Exchange,
    ) -> Result<Identity, AuthError> {
        let token = exchange
            .bearer_token()
            .ok_or_else(|| AuthError::login_failed("missing token"))?;
        let claims = self.verifier.verify(token)?;
        self.resolver
            .resolve(&claims, candidate, AuthMode::Token)
            .await
    }
}
