//! Authentication error taxonomy.
//!
//! Descriptions are safe to show to clients: they never contain credential
//! material or store internals. Details are logged where the error is raised.

use thiserror::Error;

use authgate_core::error::{AppError, ErrorKind};

/// Errors produced by authenticators and the login orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No registered authenticator accepted the login request.
    #[error("no authenticator applied")]
    NoApplicableAuthenticator,
    /// The chosen authenticator rejected the credentials.
    #[error("login failed: {0}")]
    AuthenticatorLoginFailed(String),
    /// A fresh session could not be allocated.
    #[error("session creation failed")]
    SessionCreationFailed,
    /// The session could not be written back to the client.
    #[error("session could not be persisted")]
    SessionPersistFailed,
    /// The session cookie lacks a required field.
    #[error("session is missing field '{0}'")]
    SessionDecodeFailed(String),
    /// Neither a token nor a session identified the caller.
    #[error("unauthorized (please login first)")]
    Unauthorized,
    /// A component could not be initialized at startup.
    #[error("initialization of {0} failed")]
    InitializationFailed(String),
}

impl AuthError {
    /// Shorthand for [`AuthError::AuthenticatorLoginFailed`].
    pub fn login_failed(reason: impl Into<String>) -> Self {
        Self::AuthenticatorLoginFailed(reason.into())
    }

    /// Shorthand for [`AuthError::InitializationFailed`].
    pub fn init_failed(component: impl Into<String>) -> Self {
        Self::InitializationFailed(component.into())
    }

    /// Whether the caller presented something that was rejected, as opposed
    /// to presenting nothing at all.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthenticatorLoginFailed(_) | Self::SessionDecodeFailed(_)
        )
    }

    /// Whether the error is a server-side failure rather than a client one.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::SessionCreationFailed | Self::SessionPersistFailed | Self::InitializationFailed(_)
        )
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let kind = match &err {
            AuthError::NoApplicableAuthenticator
            | AuthError::AuthenticatorLoginFailed(_)
            | AuthError::SessionDecodeFailed(_)
            | AuthError::Unauthorized => ErrorKind::Authentication,
            AuthError::SessionCreationFailed | AuthError::SessionPersistFailed => {
                ErrorKind::Internal
            }
            AuthError::InitializationFailed(_) => ErrorKind::Configuration,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
