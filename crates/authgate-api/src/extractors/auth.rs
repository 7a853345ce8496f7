//! `CurrentUser` extractor — the identity attached by `require_auth`.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use authgate_auth::{AuthError, Identity};

use crate::error::ApiError;

/// The authenticated identity of the request.
///
/// Only available on routes behind the `require_auth` middleware; elsewhere
/// extraction fails with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<Identity>);

impl CurrentUser {
    /// Reads the identity from request extensions, if present.
    pub fn from_parts(parts: &Parts) -> Option<Self> {
        parts.extensions.get::<Arc<Identity>>().cloned().map(Self)
    }
}

impl std::ops::Deref for CurrentUser {
    type Target = Identity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts).ok_or_else(|| ApiError::from(AuthError::Unauthorized))
    }
}
