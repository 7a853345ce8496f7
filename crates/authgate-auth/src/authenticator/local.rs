//! Username/password login against locally stored argon2 hashes.

use async_trait::async_trait;
use tracing::error;

use crate::error::AuthError;
use crate::exchange::Exchange;
use crate::identity::{AuthMode, AuthSource, Identity};
use crate::password::PasswordHasher;

use super::{Authenticator, InitContext, Initialize, PASSWORD_FIELD};

const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Verifies the submitted password of a local user.
#[derive(Debug, Clone, Default)]
pub struct LocalPasswordAuthenticator {
    hasher: PasswordHasher,
}

impl LocalPasswordAuthenticator {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self { hasher }
    }
}

impl Initialize for LocalPasswordAuthenticator {
    type Config = ();

    fn initialize(ctx: &InitContext, _config: &()) -> Result<Self, AuthError> {
        Ok(Self::new(ctx.hasher.clone()))
    }
}

#[async_trait]
impl Authenticator for LocalPasswordAuthenticator {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn can_handle(&self, candidate: Option<&Identity>, _exchange: &Exchange) -> bool {
        candidate.is_some_and(|c| {
            c.auth_source() == AuthSource::LocalPassword && c.credential_ref().is_some()
        })
    }

    async fn attempt_login(
        &self,
        candidate: Option<&Identity>,
        exchange: &mut Exchange,
    ) -> Result<Identity, AuthError> {
        let candidate = candidate.ok_or_else(|| AuthError::login_failed(INVALID_CREDENTIALS))?;
        let credential = candidate
            .credential_ref()
            .ok_or_else(|| AuthError::login_failed(INVALID_CREDENTIALS))?;
        let password = exchange
            .form_value(PASSWORD_FIELD)
            .ok_or_else(|| AuthError::login_failed(INVALID_CREDENTIALS))?;

        let valid = self
            .hasher
            .verify_password(password, credential)
            .map_err(|e| {
                error!(username = %candidate.username(), error = %e, "Password verification error");
                AuthError::login_failed(INVALID_CREDENTIALS)
            })?;

        if !valid {
            return Err(AuthError::login_failed(INVALID_CREDENTIALS));
        }

        Ok(candidate.reissue(AuthMode::Session, AuthSource::LocalPassword))
    }
}
