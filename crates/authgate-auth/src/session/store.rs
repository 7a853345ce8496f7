//! Session record and the store contract it lives behind.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use authgate_core::AppResult;

use crate::exchange::Exchange;

/// Max-age that makes the client discard the session immediately.
pub const EXPIRE_IMMEDIATELY: i64 = -1;

/// Per-session cookie options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Lifetime in seconds. `0` makes a browser-session cookie;
    /// [`EXPIRE_IMMEDIATELY`] deletes it.
    pub max_age: i64,
}

/// A store-managed key-value session keyed by a cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    name: String,
    values: BTreeMap<String, Value>,
    options: SessionOptions,
    is_new: bool,
}

impl Session {
    /// A fresh, empty session that has never been persisted.
    pub fn new(name: impl Into<String>, options: SessionOptions) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
            options,
            is_new: true,
        }
    }

    /// A session restored from a client cookie.
    pub fn restored(
        name: impl Into<String>,
        values: BTreeMap<String, Value>,
        options: SessionOptions,
    ) -> Self {
        Self {
            name: name.into(),
            values,
            options,
            is_new: false,
        }
    }

    /// Cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether no session cookie accompanied the request.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn set_max_age(&mut self, max_age: i64) {
        self.options.max_age = max_age;
    }

    /// Whether saving this session deletes the client cookie.
    pub fn is_expired(&self) -> bool {
        self.options.max_age < 0
    }
}

/// Backend that loads and persists sessions through the exchange.
///
/// Implementations must be safe for concurrent use by independent requests.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Loads the named session. A missing, tampered or expired cookie yields
    /// a new, empty session.
    async fn get(&self, exchange: &Exchange, name: &str) -> Session;

    /// Allocates a fresh session carrying the store defaults. Not persisted
    /// until [`SessionStore::save`].
    fn new_session(&self, name: &str) -> AppResult<Session>;

    /// Persists the session, or deletes it when its max-age is negative.
    async fn save(&self, exchange: &mut Exchange, session: &Session) -> AppResult<()>;
}
