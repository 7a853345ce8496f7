//! Signed-cookie session store.
//!
//! The whole session travels in the cookie as `<payload>.<mac>`, where the
//! payload is base64url JSON holding the values and the issue time, and the
//! MAC is HMAC-SHA256 over the cookie name and payload. The payload also
//! records the lifetime the session was saved with, so a replayed cookie is
//! rejected once that lifetime has passed. Nothing is kept on the server.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::Engine;
use cookie::Cookie;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

use authgate_core::config::SessionConfig;
use authgate_core::{AppError, AppResult};

use crate::cookies::session_cookie;
use crate::exchange::Exchange;

use super::key::SessionKey;
use super::store::{Session, SessionOptions, SessionStore};

type HmacSha256 = Hmac<Sha256>;

/// Browsers reject cookies beyond this size.
const MAX_COOKIE_LEN: usize = 4096;

#[derive(Serialize, Deserialize)]
struct Payload {
    iat: i64,
    /// Lifetime the session was saved with. Enforced on every read.
    #[serde(default)]
    max_age: i64,
    values: BTreeMap<String, Value>,
}

/// Session store that keeps sessions in HMAC-signed client cookies.
#[derive(Debug, Clone)]
pub struct CookieSessionStore {
    key: SessionKey,
    config: SessionConfig,
    default_max_age: i64,
}

impl CookieSessionStore {
    /// Fails when `default_max_age_seconds` does not fit a signed lifetime.
    pub fn new(key: SessionKey, config: SessionConfig) -> AppResult<Self> {
        let default_max_age = i64::try_from(config.default_max_age_seconds).map_err(|_| {
            AppError::configuration("session.default_max_age_seconds is out of range")
        })?;
        Ok(Self {
            key,
            config,
            default_max_age,
        })
    }

    fn default_options(&self) -> SessionOptions {
        SessionOptions {
            max_age: self.default_max_age,
        }
    }

    fn mac(&self, name: &str, payload: &str) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|e| AppError::internal(format!("HMAC initialization failed: {e}")))?;
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    fn encode(&self, session: &Session) -> AppResult<String> {
        let payload = Payload {
            iat: Utc::now().timestamp(),
            max_age: session.options().max_age,
            values: session.values().clone(),
        };
        self.seal(session.name(), &payload)
    }

    fn seal(&self, name: &str, payload: &Payload) -> AppResult<String> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
        let signature = self.mac(name, &payload)?.finalize().into_bytes();
        Ok(format!("{payload}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Verifies and unpacks a cookie value. `None` for anything that is not a
    /// valid, unexpired session of this store.
    ///
    /// A session saved without a positive lifetime is bounded by the store
    /// default.
    fn decode(&self, name: &str, cookie: &str) -> Option<Session> {
        let (payload, signature) = cookie.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mac = self.mac(name, payload).ok()?;
        if mac.verify_slice(&signature).is_err() {
            warn!(cookie = %name, "Session cookie signature mismatch");
            return None;
        }

        let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let payload: Payload = serde_json::from_slice(&bytes).ok()?;

        let max_age = if payload.max_age > 0 {
            payload.max_age
        } else {
            self.default_max_age
        };
        if max_age > 0 && Utc::now().timestamp().saturating_sub(payload.iat) > max_age {
            debug!(cookie = %name, max_age, "Session cookie expired");
            return None;
        }

        Some(Session::restored(
            name,
            payload.values,
            SessionOptions { max_age },
        ))
    }

    fn cookie(&self, name: &str, value: String, max_age: i64) -> Cookie<'static> {
        session_cookie(name, value, (max_age != 0).then_some(max_age), &self.config)
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn get(&self, exchange: &Exchange, name: &str) -> Session {
        exchange
            .cookie(name)
            .filter(|value| !value.is_empty())
            .and_then(|value| self.decode(name, &value))
            .unwrap_or_else(|| Session::new(name, self.default_options()))
    }

    fn new_session(&self, name: &str) -> AppResult<Session> {
        if name.is_empty() || name.contains([';', '=', ' ']) {
            return Err(AppError::session(format!("Invalid session name '{name}'")));
        }
        Ok(Session::new(name, self.default_options()))
    }

    async fn save(&self, exchange: &mut Exchange, session: &Session) -> AppResult<()> {
        if session.is_expired() {
            return exchange.set_cookie(&self.cookie(session.name(), String::new(), -1));
        }

        let value = self.encode(session)?;
        if value.len() > MAX_COOKIE_LEN {
            return Err(AppError::session(format!(
                "Session cookie is {} bytes, limit is {MAX_COOKIE_LEN}",
                value.len()
            )));
        }

        exchange.set_cookie(&self.cookie(session.name(), value, session.options().max_age))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{COOKIE, SET_COOKIE};
    use http::{HeaderMap, HeaderValue};
    use serde_json::json;

    fn store() -> CookieSessionStore {
        CookieSessionStore::new(
            SessionKey::from_bytes(b"unit-test-key".to_vec()).unwrap(),
            SessionConfig::default(),
        )
        .unwrap()
    }

    /// Turns the `Set-Cookie` queued on `exchange` into a follow-up request.
    fn replay(exchange: &Exchange) -> Exchange {
        let set_cookie = exchange.response_headers().get(SET_COOKIE).unwrap();
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(pair).unwrap());
        Exchange::new(headers)
    }

    #[tokio::test]
    async fn test_missing_cookie_gives_new_session() {
        let session = store().get(&Exchange::default(), "session").await;
        assert!(session.is_new());
        assert!(session.values().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let store = store();
        let mut session = store.new_session("session").unwrap();
        session.insert("username", json!("frank"));
        session.insert("roles", json!(["user"]));

        let mut exchange = Exchange::default();
        store.save(&mut exchange, &session).await.unwrap();

        let restored = store.get(&replay(&exchange), "session").await;
        assert!(!restored.is_new());
        assert_eq!(restored.get("username"), Some(&json!("frank")));
        assert_eq!(restored.get("roles"), Some(&json!(["user"])));
    }

    #[tokio::test]
    async fn test_tampered_cookie_gives_new_session() {
        let mut headers = HeaderMap::new();
        let forged = format!(
            "session={}.{}",
            URL_SAFE_NO_PAD.encode(br#"{"iat":0,"values":{"username":"admin"}}"#),
            URL_SAFE_NO_PAD.encode([0u8; 32])
        );
        headers.insert(COOKIE, HeaderValue::from_str(&forged).unwrap());

        let session = store().get(&Exchange::new(headers), "session").await;
        assert!(session.is_new());
    }

    #[tokio::test]
    async fn test_other_key_rejected() {
        let mut session = store().new_session("session").unwrap();
        session.insert("username", json!("frank"));
        let mut exchange = Exchange::default();
        store().save(&mut exchange, &session).await.unwrap();

        let other = CookieSessionStore::new(
            SessionKey::from_bytes(b"another-key".to_vec()).unwrap(),
            SessionConfig::default(),
        )
        .unwrap();
        assert!(other.get(&replay(&exchange), "session").await.is_new());
    }

    #[tokio::test]
    async fn test_expired_session_deletes_cookie() {
        let store = store();
        let mut session = store.new_session("session").unwrap();
        session.set_max_age(crate::session::EXPIRE_IMMEDIATELY);

        let mut exchange = Exchange::default();
        store.save(&mut exchange, &session).await.unwrap();

        let header = exchange.response_headers().get(SET_COOKIE).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.starts_with("session=;"));
        assert!(header.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_oversized_session_fails() {
        let store = store();
        let mut session = store.new_session("session").unwrap();
        session.insert("projects", json!(vec!["x".repeat(64); 100]));

        let mut exchange = Exchange::default();
        assert!(store.save(&mut exchange, &session).await.is_err());
        assert!(exchange.response_headers().is_empty());
    }

    /// A request carrying a correctly signed cookie issued `age` seconds ago.
    fn aged_cookie(store: &CookieSessionStore, age: i64, max_age: i64) -> Exchange {
        let payload = Payload {
            iat: Utc::now().timestamp() - age,
            max_age,
            values: BTreeMap::from([("username".to_string(), json!("judy"))]),
        };
        let value = store.seal("session", &payload).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("session={value}")).unwrap(),
        );
        Exchange::new(headers)
    }

    #[tokio::test]
    async fn test_saved_max_age_is_enforced() {
        let store = store();

        let fresh = store.get(&aged_cookie(&store, 30, 60), "session").await;
        assert!(!fresh.is_new());
        assert_eq!(fresh.options().max_age, 60);

        let stale = store.get(&aged_cookie(&store, 120, 60), "session").await;
        assert!(stale.is_new());
    }

    #[tokio::test]
    async fn test_missing_max_age_falls_back_to_store_default() {
        let store = store();
        let default = SessionConfig::default().default_max_age_seconds as i64;

        assert!(!store.get(&aged_cookie(&store, 3600, 0), "session").await.is_new());
        assert!(store.get(&aged_cookie(&store, default + 1, 0), "session").await.is_new());
    }

    #[tokio::test]
    async fn test_override_survives_round_trip() {
        let store = store();
        let mut session = store.new_session("session").unwrap();
        session.set_max_age(90);
        session.insert("username", json!("frank"));

        let mut exchange = Exchange::default();
        store.save(&mut exchange, &session).await.unwrap();

        let restored = store.get(&replay(&exchange), "session").await;
        assert_eq!(restored.options().max_age, 90);
    }

    #[test]
    fn test_out_of_range_default_rejected() {
        let config = SessionConfig {
            default_max_age_seconds: u64::MAX,
            ..SessionConfig::default()
        };
        let key = SessionKey::from_bytes(b"unit-test-key".to_vec()).unwrap();
        assert!(CookieSessionStore::new(key, config).is_err());
    }

    #[test]
    fn test_invalid_name_rejected() {
        assert!(store().new_session("bad name").is_err());
        assert!(store().new_session("").is_err());
    }
}
