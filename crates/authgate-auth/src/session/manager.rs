//! Session lifecycle on top of a [`SessionStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::{debug, error};

use authgate_core::{AppError, AppResult};

use crate::error::AuthError;
use crate::exchange::Exchange;
use crate::identity::Identity;

use super::store::{EXPIRE_IMMEDIATELY, Session, SessionStore};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

const FIELD_USERNAME: &str = "username";
const FIELD_PROJECTS: &str = "projects";
const FIELD_ROLES: &str = "roles";

/// The identity attributes kept in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub username: String,
    pub roles: Vec<String>,
    pub projects: Vec<String>,
}

/// Creates, persists, decodes and expires the `session` cookie.
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    max_age: i64,
}

impl SessionManager {
    /// `max_age_seconds == 0` keeps the store's default lifetime. Values that
    /// do not fit a signed lifetime are rejected.
    pub fn new(store: Arc<dyn SessionStore>, max_age_seconds: u64) -> AppResult<Self> {
        let max_age = i64::try_from(max_age_seconds)
            .map_err(|_| AppError::configuration("session.max_age_seconds is out of range"))?;
        Ok(Self { store, max_age })
    }

    pub async fn get(&self, exchange: &Exchange) -> Session {
        self.store.get(exchange, SESSION_COOKIE).await
    }

    /// Allocates a fresh session with the configured max-age applied.
    pub fn create(&self) -> Result<Session, AuthError> {
        let mut session = self.store.new_session(SESSION_COOKIE).map_err(|e| {
            error!(error = %e, "Failed to create session");
            AuthError::SessionCreationFailed
        })?;
        if self.max_age != 0 {
            session.set_max_age(self.max_age);
        }
        Ok(session)
    }

    pub async fn save(&self, exchange: &mut Exchange, session: &Session) -> Result<(), AuthError> {
        self.store.save(exchange, session).await.map_err(|e| {
            error!(error = %e, session = %session.name(), "Failed to save session");
            AuthError::SessionPersistFailed
        })
    }

    /// Shortens the session so it ends no later than `expiration`.
    ///
    /// Sessions seeded from a token must not outlive the token.
    pub fn cap_lifetime(&self, session: &mut Session, expiration: DateTime<Utc>) {
        let remaining = (expiration - Utc::now()).num_seconds().max(1);
        let current = session.options().max_age;
        if current <= 0 || remaining < current {
            debug!(max_age = remaining, "Session lifetime capped at credential expiry");
            session.set_max_age(remaining);
        }
    }

    /// Writes the identity's username, projects and roles into the session.
    pub fn populate(&self, session: &mut Session, identity: &Identity) {
        session.insert(FIELD_USERNAME, json!(identity.username()));
        session.insert(FIELD_PROJECTS, json!(identity.projects()));
        session.insert(FIELD_ROLES, json!(identity.roles()));
    }

    /// Reads back the fields written by [`SessionManager::populate`].
    pub fn decode(&self, session: &Session) -> Result<SessionData, AuthError> {
        let username = session
            .get(FIELD_USERNAME)
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AuthError::SessionDecodeFailed(FIELD_USERNAME.to_string()))?
            .to_string();

        Ok(SessionData {
            username,
            projects: string_list(session, FIELD_PROJECTS)?,
            roles: string_list(session, FIELD_ROLES)?,
        })
    }

    /// Marks the session for deletion on the next save.
    pub fn expire(&self, session: &mut Session) {
        session.set_max_age(EXPIRE_IMMEDIATELY);
    }
}

fn string_list(session: &Session, field: &str) -> Result<Vec<String>, AuthError> {
    let missing = || AuthError::SessionDecodeFailed(field.to_string());
    session
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(missing)?
        .iter()
        .map(|v| v.as_str().map(String::from).ok_or_else(missing))
        .collect()
}
