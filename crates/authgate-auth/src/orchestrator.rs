//! Login, authenticate and logout as request-handling wrappers.
//!
//! Each operation takes the exchange and one or two continuations. The
//! orchestrator decides which continuation runs and with what; it never
//! builds a response itself.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use authgate_core::AppResult;
use authgate_core::config::AppConfig;
use authgate_core::error::ErrorKind;

use crate::authenticator::{
    Authenticator, AuthenticatorRegistry, InitContext, Initialize, TokenBearerAuthenticator,
    USERNAME_FIELD,
};
use crate::error::AuthError;
use crate::exchange::Exchange;
use crate::identity::{AuthMode, AuthSource, Identity};
use crate::session::{CookieSessionStore, SessionKey, SessionManager};
use crate::user::UserStore;

/// Entry point for every authentication decision of the service.
///
/// Holds no per-request state; share it behind an `Arc`.
#[derive(Debug)]
pub struct AuthOrchestrator {
    registry: AuthenticatorRegistry,
    sessions: SessionManager,
    users: Arc<dyn UserStore>,
    bearer: Option<TokenBearerAuthenticator>,
}

impl AuthOrchestrator {
    /// Assembles an orchestrator from already-built parts.
    pub fn new(
        registry: AuthenticatorRegistry,
        sessions: SessionManager,
        users: Arc<dyn UserStore>,
        bearer: Option<TokenBearerAuthenticator>,
    ) -> Self {
        Self {
            registry,
            sessions,
            users,
            bearer,
        }
    }

    /// Builds everything from configuration. Runs once at startup.
    ///
    /// The session key is resolved before the session store is created. A
    /// `jwt` block that cannot be turned into a verifier aborts startup.
    pub fn initialize(ctx: &InitContext, config: &AppConfig) -> AppResult<Self> {
        let key = SessionKey::resolve(config.session.key.as_deref())?;
        let store = CookieSessionStore::new(key, config.session.clone())?;
        let sessions = SessionManager::new(Arc::new(store), config.session.max_age_seconds)?;

        let registry = AuthenticatorRegistry::from_config(ctx, &config.auth)?;

        let bearer = config
            .auth
            .jwt
            .as_ref()
            .map(|jwt| TokenBearerAuthenticator::initialize(ctx, jwt))
            .transpose()?;
        if bearer.is_none() {
            info!("No 'jwt' block configured, bearer tokens are not accepted");
        }

        Ok(Self::new(registry, sessions, Arc::clone(&ctx.users), bearer))
    }

    pub fn registry(&self) -> &AuthenticatorRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Logs a user in and establishes the session.
    ///
    /// `on_failure` receives every authentication failure. `Err` is returned
    /// only when the session could not be created or persisted.
    pub async fn login<R, S, SF, F, FF>(
        &self,
        mut exchange: Exchange,
        on_success: S,
        on_failure: F,
    ) -> Result<R, AuthError>
    where
        S: FnOnce(Exchange) -> SF,
        SF: Future<Output = R>,
        F: FnOnce(Exchange, AuthError) -> FF,
        FF: Future<Output = R>,
    {
        let candidate = self.resolve_candidate(&exchange).await;

        let Some(authenticator) = self.registry.select(candidate.as_ref(), &exchange).await else {
            debug!("No authenticator applicable to login request");
            return Ok(on_failure(exchange, AuthError::NoApplicableAuthenticator).await);
        };

        let identity = match authenticator
            .attempt_login(candidate.as_ref(), &mut exchange)
            .await
        {
            Ok(identity) if identity.is_expired() => {
                warn!(
                    authenticator = authenticator.name(),
                    username = %identity.username(),
                    "Login rejected, credentials expired"
                );
                let err = AuthError::login_failed("credentials have expired");
                return Ok(on_failure(exchange, err).await);
            }
            Ok(identity) => identity,
            Err(e) => {
                warn!(authenticator = authenticator.name(), error = %e, "Login failed");
                return Ok(on_failure(exchange, e).await);
            }
        };

        let mut session = self.sessions.create()?;
        if let Some(expiration) = identity.expiration() {
            self.sessions.cap_lifetime(&mut session, expiration);
        }
        self.sessions.populate(&mut session, &identity);
        self.sessions.save(&mut exchange, &session).await?;

        if candidate.is_none() {
            self.register(&identity).await;
        }

        info!(
            authenticator = authenticator.name(),
            username = %identity.username(),
            source = %identity.auth_source(),
            "Login succeeded"
        );

        exchange.attach_identity(Arc::new(identity));
        Ok(on_success(exchange).await)
    }

    /// Identifies the caller by bearer token, then by session cookie.
    pub async fn authenticate<R, S, SF, F, FF>(
        &self,
        mut exchange: Exchange,
        on_success: S,
        on_failure: F,
    ) -> R
    where
        S: FnOnce(Exchange) -> SF,
        SF: Future<Output = R>,
        F: FnOnce(Exchange, AuthError) -> FF,
        FF: Future<Output = R>,
    {
        let mut identity = match &self.bearer {
            Some(bearer) => bearer.authenticate(&exchange).await,
            None => None,
        };

        if identity.is_none() {
            let session = self.sessions.get(&exchange).await;
            if !session.is_new() {
                match self.sessions.decode(&session) {
                    Ok(data) => {
                        identity = Some(
                            Identity::builder(data.username, AuthMode::Session, AuthSource::Unknown)
                                .roles(data.roles)
                                .projects(data.projects)
                                .build(),
                        );
                    }
                    Err(e) => {
                        warn!(error = %e, "Session could not be decoded");
                        return on_failure(exchange, e).await;
                    }
                }
            }
        }

        match identity {
            Some(identity) => {
                exchange.attach_identity(Arc::new(identity));
                on_success(exchange).await
            }
            None => on_failure(exchange, AuthError::Unauthorized).await,
        }
    }

    /// Expires the session cookie, then runs `on_success`.
    pub async fn logout<R, S, SF>(&self, mut exchange: Exchange, on_success: S) -> Result<R, AuthError>
    where
        S: FnOnce(Exchange) -> SF,
        SF: Future<Output = R>,
    {
        let mut session = self.sessions.get(&exchange).await;
        if !session.is_new() {
            self.sessions.expire(&mut session);
            self.sessions.save(&mut exchange, &session).await?;
        }
        Ok(on_success(exchange).await)
    }

    /// The stored user named by the `username` form field. Store failures
    /// degrade to `None`.
    async fn resolve_candidate(&self, exchange: &Exchange) -> Option<Identity> {
        let username = exchange.form_value(USERNAME_FIELD)?;
        match self.users.find_by_username(username).await {
            Ok(candidate) => candidate,
            Err(e) => {
                error!(username = %username, error = %e, "User lookup failed, continuing without candidate");
                None
            }
        }
    }

    /// Records a first-time user. Failures are logged only.
    async fn register(&self, identity: &Identity) {
        match self.users.add_user(identity).await {
            Ok(()) => info!(username = %identity.username(), "Registered new user"),
            Err(e) if e.kind == ErrorKind::Conflict => {
                debug!(username = %identity.username(), "User already registered");
            }
            Err(e) => error!(username = %identity.username(), error = %e, "Failed to register user"),
        }
    }
}
