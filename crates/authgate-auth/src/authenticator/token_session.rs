//! Exchanges a login token for a session.

use std::sync::Arc;

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use tracing::error;

use authgate_core::config::JwtConfig;

use crate::error::AuthError;
use crate::exchange::Exchange;
use crate::identity::{AuthMode, Identity};
use crate::jwt::TokenVerifier;
use crate::user::UserStore;

use super::token_user::TokenUserResolver;
use super::{Authenticator, InitContext, Initialize};

/// Query parameter that may carry the login token.
pub const LOGIN_TOKEN_PARAM: &str = "login-token";

/// Handles logins that present a token in the `Authorization` header or the
/// `login-token` query parameter.
#[derive(Debug, Clone)]
pub struct TokenSessionAuthenticator {
    verifier: TokenVerifier,
    resolver: TokenUserResolver,
}

impl TokenSessionAuthenticator {
    pub fn new(
        verifier: TokenVerifier,
        users: Arc<dyn UserStore>,
        validate_user: bool,
        sync_user_on_login: bool,
    ) -> Self {
        Self {
            verifier,
            resolver: TokenUserResolver::new(users, validate_user, sync_user_on_login),
        }
    }

    fn token<'a>(exchange: &'a Exchange) -> Option<&'a str> {
        exchange
            .query_value(LOGIN_TOKEN_PARAM)
            .or_else(|| exchange.bearer_token())
    }
}

impl Initialize for TokenSessionAuthenticator {
    type Config = JwtConfig;

    fn initialize(ctx: &InitContext, config: &JwtConfig) -> Result<Self, AuthError> {
        let Some(login_token) = config.login_token.as_ref() else {
            return Err(AuthError::init_failed("jwt.login_token"));
        };
        let verifier = TokenVerifier::from_config(&login_token.key).map_err(|e| {
            error!(error = %e, "Invalid login token key");
            AuthError::init_failed("jwt.login_token")
        })?;
        Ok(Self::new(
            verifier,
            Arc::clone(&ctx.users),
            config.validate_user,
            login_token.sync_user_on_login,
        ))
    }
}

#[async_trait]
impl Authenticator for TokenSessionAuthenticator {
    fn name(&self) -> &'static str {
        "jwt-session"
    }

    async fn can_handle(&self, _candidate: Option<&Identity>, exchange: &Exchange) -> bool {
        exchange.headers().contains_key(AUTHORIZATION)
            || exchange.query_value(LOGIN_TOKEN_PARAM).is_some()
    }

    async fn attempt_login(
        &self,
        candidate: Option<&Identity>,
        exchange: &mut Exchange,
    ) -> Result<Identity, AuthError> {
        let token =
            Self::token(exchange).ok_or_else(|| AuthError::login_failed("missing login token"))?;
        let claims = self.verifier.verify(token)?;
        self.resolver
            .resolve(&claims, candidate, AuthMode::Session)
            .await
    }
}
