//! Ordered list of login authenticators.

use std::sync::Arc;

use tracing::{debug, info, warn};

use authgate_core::config::AuthConfig;

use crate::error::AuthError;
use crate::exchange::Exchange;
use crate::identity::Identity;

use super::{
    Authenticator, AuthenticatorDispatch, DirectoryAuthenticator, InitContext, Initialize,
    LocalPasswordAuthenticator, TokenCookieSessionAuthenticator, TokenSessionAuthenticator,
};

/// Authenticators consulted by login, highest priority first.
///
/// Built once at startup and never modified afterwards.
#[derive(Debug, Clone)]
pub struct AuthenticatorRegistry<A = AuthenticatorDispatch> {
    authenticators: Vec<A>,
}

impl<A: Authenticator> AuthenticatorRegistry<A> {
    pub fn new(authenticators: Vec<A>) -> Self {
        Self { authenticators }
    }

    pub fn len(&self) -> usize {
        self.authenticators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }

    /// Names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.authenticators.iter().map(|a| a.name()).collect()
    }

    /// Returns the first authenticator willing to handle the login. Later
    /// authenticators are not asked once one accepts.
    pub async fn select(&self, candidate: Option<&Identity>, exchange: &Exchange) -> Option<&A> {
        for authenticator in &self.authenticators {
            if authenticator.can_handle(candidate, exchange).await {
                return Some(authenticator);
            }
            debug!(authenticator = authenticator.name(), "Authenticator declined login");
        }
        None
    }
}

impl AuthenticatorRegistry<AuthenticatorDispatch> {
    /// Builds the registry from configuration.
    ///
    /// Order: `ldap`, `jwt.login_token`, `jwt.cookie`, then local passwords.
    /// The directory and local authenticators are mandatory once configured;
    /// the token authenticators are dropped with a warning if they fail to
    /// initialize.
    pub fn from_config(ctx: &InitContext, config: &AuthConfig) -> Result<Self, AuthError> {
        let mut authenticators = Vec::new();

        if let Some(ldap) = &config.ldap {
            let directory = DirectoryAuthenticator::initialize(ctx, ldap)?;
            authenticators.push(AuthenticatorDispatch::Directory(Arc::new(directory)));
        }

        if let Some(jwt) = &config.jwt {
            if jwt.login_token.is_some() {
                match TokenSessionAuthenticator::initialize(ctx, jwt) {
                    Ok(auth) => authenticators.push(AuthenticatorDispatch::TokenSession(auth)),
                    Err(e) => warn!(error = %e, "Skipping optional authenticator"),
                }
            }
            if jwt.cookie.is_some() {
                match TokenCookieSessionAuthenticator::initialize(ctx, jwt) {
                    Ok(auth) => {
                        authenticators.push(AuthenticatorDispatch::TokenCookieSession(auth))
                    }
                    Err(e) => warn!(error = %e, "Skipping optional authenticator"),
                }
            }
        }

        let local = LocalPasswordAuthenticator::initialize(ctx, &())?;
        authenticators.push(AuthenticatorDispatch::Local(local));

        let registry = Self::new(authenticators);
        info!(authenticators = ?registry.names(), "Authenticator registry initialized");
        Ok(registry)
    }

    /// The directory authenticator, if registered.
    pub fn directory(&self) -> Option<&Arc<DirectoryAuthenticator>> {
        self.authenticators.iter().find_map(|a| match a {
            AuthenticatorDispatch::Directory(directory) => Some(directory),
            _ => None,
        })
    }
}
