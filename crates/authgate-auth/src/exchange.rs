//! Transport-neutral request/response exchange.
//!
//! The HTTP layer copies what the authenticators need out of the incoming
//! request (headers, query and form fields) and applies the collected
//! response headers to whatever response the continuation produces.

use std::collections::HashMap;
use std::sync::Arc;

use cookie::Cookie;
use http::header::{AUTHORIZATION, COOKIE, HeaderName, SET_COOKIE};
use http::{HeaderMap, HeaderValue};

use authgate_core::error::AppError;

use crate::cookies::find_cookie;
use crate::identity::Identity;

/// Header carrying a bare token, as an alternative to `Authorization: Bearer`.
pub const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");

/// One request/response round trip as seen by the authentication core.
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    headers: HeaderMap,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    response_headers: HeaderMap,
    identity: Option<Arc<Identity>>,
}

impl Exchange {
    /// Creates an exchange for a request with the given headers.
    pub fn new(headers: HeaderMap) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    /// Attaches decoded query parameters.
    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Attaches decoded form fields.
    pub fn with_form(mut self, form: HashMap<String, String>) -> Self {
        self.form = form;
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a request header as a string, if present and valid UTF-8.
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a non-empty query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Returns a non-empty form field.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Returns the value of a request cookie.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|header| find_cookie(header, name))
    }

    /// Returns the token from `X-Auth-Token` or `Authorization: Bearer`.
    pub fn bearer_token(&self) -> Option<&str> {
        if let Some(token) = self.header(X_AUTH_TOKEN).filter(|t| !t.is_empty()) {
            return Some(token);
        }
        self.header(AUTHORIZATION)
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Queues a `Set-Cookie` header on the response.
    pub fn set_cookie(&mut self, cookie: &Cookie<'_>) -> Result<(), AppError> {
        let value = HeaderValue::from_str(&cookie.to_string()).map_err(|e| {
            AppError::session(format!("Invalid cookie '{}': {e}", cookie.name()))
        })?;
        self.response_headers.append(SET_COOKIE, value);
        Ok(())
    }

    /// Headers to add to the response.
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Moves the queued response headers out of the exchange.
    pub fn take_response_headers(&mut self) -> HeaderMap {
        std::mem::take(&mut self.response_headers)
    }

    /// The identity attached by a successful login or authentication.
    pub fn identity(&self) -> Option<&Arc<Identity>> {
        self.identity.as_ref()
    }

    pub(crate) fn attach_identity(&mut self, identity: Arc<Identity>) {
        self.identity = Some(identity);
    }
}
