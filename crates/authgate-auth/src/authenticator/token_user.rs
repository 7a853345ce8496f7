//! Maps verified token claims onto an identity, consulting the user store.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::AuthError;
use crate::identity::{AuthMode, Identity};
use crate::jwt::TokenClaims;
use crate::user::UserStore;

#[derive(Debug, Clone)]
pub(crate) struct TokenUserResolver {
    users: Arc<dyn UserStore>,
    /// Known users take roles and projects from their stored record.
    validate_user: bool,
    /// Subjects missing from the store are accepted.
    accept_unknown: bool,
}

impl TokenUserResolver {
    pub(crate) fn new(users: Arc<dyn UserStore>, validate_user: bool, accept_unknown: bool) -> Self {
        Self {
            users,
            validate_user,
            accept_unknown,
        }
    }

    pub(crate) async fn resolve(
        &self,
        claims: &TokenClaims,
        candidate: Option<&Identity>,
        auth_mode: AuthMode,
    ) -> Result<Identity, AuthError> {
        if !self.validate_user && self.accept_unknown {
            return Ok(claims.to_identity(auth_mode));
        }

        let stored;
        let record = match candidate.filter(|c| c.username() == claims.sub) {
            Some(candidate) => Some(candidate),
            None => {
                stored = self.users.find_by_username(&claims.sub).await.map_err(|e| {
                    error!(username = %claims.sub, error = %e, "User lookup failed");
                    AuthError::login_failed("user lookup failed")
                })?;
                stored.as_ref()
            }
        };

        match record {
            Some(record) if self.validate_user => {
                Ok(claims.to_identity_from_record(record, auth_mode))
            }
            Some(_) => Ok(claims.to_identity(auth_mode)),
            None if self.accept_unknown => Ok(claims.to_identity(auth_mode)),
            None => {
                debug!(username = %claims.sub, "Token subject is not a known user");
                Err(AuthError::login_failed("unknown user"))
            }
        }
    }
}
