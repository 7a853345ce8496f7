//! Pluggable authentication strategies.
//!
//! Each strategy implements [`Authenticator`]; the closed set of strategies
//! is collected in [`AuthenticatorDispatch`], which is what the registry
//! stores and the orchestrator calls.

pub mod directory;
pub mod local;
pub mod registry;
pub mod token_bearer;
pub mod token_cookie;
pub mod token_session;
mod token_user;

use std::sync::Arc;

use async_trait::async_trait;

use crate::directory::DirectoryClient;
use crate::error::AuthError;
use crate::exchange::Exchange;
use crate::identity::Identity;
use crate::password::PasswordHasher;
use crate::user::UserStore;

pub use directory::{DirectoryAuthenticator, SyncReport};
pub use local::LocalPasswordAuthenticator;
pub use registry::AuthenticatorRegistry;
pub use token_bearer::TokenBearerAuthenticator;
pub use token_cookie::TokenCookieSessionAuthenticator;
pub use token_session::TokenSessionAuthenticator;

/// Form field carrying the login name.
pub const USERNAME_FIELD: &str = "username";
/// Form field carrying the password.
pub const PASSWORD_FIELD: &str = "password";

/// A strategy that can verify one category of credential.
#[async_trait]
pub trait Authenticator: Send + Sync + std::fmt::Debug {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Whether this authenticator wants to handle the login.
    ///
    /// `candidate` is the stored user matching the submitted username, or
    /// `None` when there was no username or no such user. Must not change
    /// any state.
    async fn can_handle(&self, candidate: Option<&Identity>, exchange: &Exchange) -> bool;

    /// Verifies the credentials and produces the authenticated identity.
    ///
    /// May queue response headers on the exchange.
    async fn attempt_login(
        &self,
        candidate: Option<&Identity>,
        exchange: &mut Exchange,
    ) -> Result<Identity, AuthError>;
}

/// Shared collaborators handed to authenticators at startup.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub users: Arc<dyn UserStore>,
    pub hasher: PasswordHasher,
    /// Client for the `ldap` authenticator, when one is available.
    pub directory: Option<Arc<dyn DirectoryClient>>,
}

impl InitContext {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(),
            directory: None,
        }
    }

    pub fn with_directory(mut self, client: Arc<dyn DirectoryClient>) -> Self {
        self.directory = Some(client);
        self
    }
}

/// One-time construction of an authenticator from its configuration block.
pub trait Initialize: Sized {
    type Config;

    /// Fails with [`AuthError::InitializationFailed`]; the cause is logged.
    fn initialize(ctx: &InitContext, config: &Self::Config) -> Result<Self, AuthError>;
}

/// The closed set of authenticators.
#[derive(Debug, Clone)]
pub enum AuthenticatorDispatch {
    Local(LocalPasswordAuthenticator),
    Directory(Arc<DirectoryAuthenticator>),
    TokenBearer(TokenBearerAuthenticator),
    TokenSession(TokenSessionAuthenticator),
    TokenCookieSession(TokenCookieSessionAuthenticator),
}

#[async_trait]
impl Authenticator for AuthenticatorDispatch {
    fn name(&self) -> &'static str {
        match self {
            Self::Local(inner) => inner.name(),
            Self::Directory(inner) => inner.name(),
            Self::TokenBearer(inner) => inner.name(),
            Self::TokenSession(inner) => inner.name(),
            Self::TokenCookieSession(inner) => inner.name(),
        }
    }

    async fn can_handle(&self, candidate: Option<&Identity>, exchange: &Exchange) -> bool {
        match self {
            Self::Local(inner) => inner.can_handle(candidate, exchange).await,
            Self::Directory(inner) => inner.can_handle(candidate, exchange).await,
            Self::TokenBearer(inner) => inner.can_handle(candidate, exchange).await,
            Self::TokenSession(inner) => inner.can_handle(candidate, exchange).await,
            Self::TokenCookieSession(inner) => inner.can_handle(candidate, exchange).await,
        }
    }

    async fn attempt_login(
        &self,
        candidate: Option<&Identity>,
        exchange: &mut Exchange,
    ) -> Result<Identity, AuthError> {
        match self {
            Self::Local(inner) => inner.attempt_login(candidate, exchange).await,
            Self::Directory(inner) => inner.attempt_login(candidate, exchange).await,
            Self::TokenBearer(inner) => inner.attempt_login(candidate, exchange).await,
            Self::TokenSession(inner) => inner.attempt_login(candidate, exchange).await,
            Self::TokenCookieSession(inner) => inner.attempt_login(candidate, exchange).await,
        }
    }
}
