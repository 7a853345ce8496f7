//! Login with a token delivered in a dedicated cookie by a trusted issuer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use authgate_core::config::JwtConfig;

use crate::cookies::removal_cookie;
use crate::error::AuthError;
use crate::exchange::Exchange;
use crate::identity::{AuthMode, Identity};
use crate::jwt::TokenVerifier;
use crate::user::UserStore;

use super::token_user::TokenUserResolver;
use super::{Authenticator, InitContext, Initialize};

/// Consumes the token cookie and turns it into a session.
#[derive(Debug, Clone)]
pub struct TokenCookieSessionAuthenticator {
    cookie_name: String,
    verifier: TokenVerifier,
    resolver: TokenUserResolver,
}

impl TokenCookieSessionAuthenticator {
    /// `verifier` should already require the trusted issuer.
    pub fn new(
        cookie_name: impl Into<String>,
        verifier: TokenVerifier,
        users: Arc<dyn UserStore>,
        validate_user: bool,
        sync_user_on_login: bool,
    ) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            verifier,
            resolver: TokenUserResolver::new(users, validate_user, sync_user_on_login),
        }
    }
}

impl Initialize for TokenCookieSessionAuthenticator {
    type Config = JwtConfig;

    fn initialize(ctx: &InitContext, config: &JwtConfig) -> Result<Self, AuthError> {
        let Some(cookie) = config.cookie.as_ref() else {
            return Err(AuthError::init_failed("jwt.cookie"));
        };
        if cookie.cookie_name.is_empty() || cookie.trusted_issuer.is_empty() {
            error!("Token cookie needs both 'cookie_name' and 'trusted_issuer'");
            return Err(AuthError::init_failed("jwt.cookie"));
        }
        let verifier = TokenVerifier::from_config(&cookie.key)
            .map_err(|e| {
                error!(error = %e, "Invalid token cookie key");
                AuthError::init_failed("jwt.cookie")
            })?
            .require_issuer(&cookie.trusted_issuer);

        Ok(Self::new(
            &cookie.cookie_name,
            verifier,
            Arc::clone(&ctx.users),
            config.validate_user,
            cookie.sync_user_on_login,
        ))
    }
}

#[async_trait]
impl Authenticator for TokenCookieSessionAuthenticator {
    fn name(&self) -> &'static str {
        "jwt-cookie"
    }

    async fn can_handle(&self, _candidate: Option<&Identity>, exchange: &Exchange) -> bool {
        exchange
            .cookie(&self.cookie_name)
            .is_some_and(|v| !v.is_empty())
    }

    async fn attempt_login(
        &self,
        candidate: Option<&Identity>,
        exchange: &mut Exchange,
    ) -> Result<Identity, AuthError> {
        let token = exchange
            .cookie(&self.cookie_name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::login_failed("missing token cookie"))?;
        let claims = self.verifier.verify(&token)?;
        let identity = self
            .resolver
            .resolve(&claims, candidate, AuthMode::Session)
            .await?;

        exchange
            .set_cookie(&removal_cookie(&self.cookie_name))
            .map_err(|e| {
                error!(error = %e, "Failed to expire token cookie");
                AuthError::login_failed("invalid token cookie")
            })?;

        Ok(identity)
    }
}
