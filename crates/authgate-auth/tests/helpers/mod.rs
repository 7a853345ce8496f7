//! Shared test doubles and harness for orchestrator tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use jsonwebtoken::{EncodingKey, Header, encode};

use authgate_auth::authenticator::{
    AuthenticatorDispatch, DirectoryAuthenticator, LocalPasswordAuthenticator,
    TokenBearerAuthenticator, TokenSessionAuthenticator,
};
use authgate_auth::session::{CookieSessionStore, Session, SessionKey, SessionManager};
use authgate_auth::{
    AuthError, AuthMode, AuthOrchestrator, AuthSource, AuthenticatorRegistry, DirectoryClient,
    DirectoryEntry, Exchange, Identity, MemoryUserStore, PasswordHasher, SessionStore,
    TokenClaims, TokenIssuer, TokenVerifier, UserStore,
};
use authgate_core::config::{LdapConfig, SessionConfig, TokenAlgorithm, TokenKeyConfig};
use authgate_core::{AppError, AppResult};

/// Session store that counts persist calls and can be told to fail them.
#[derive(Debug)]
pub struct CountingSessionStore {
    inner: CookieSessionStore,
    pub saves: AtomicUsize,
    pub fail_saves: AtomicBool,
}

impl CountingSessionStore {
    pub fn new() -> Self {
        Self {
            inner: CookieSessionStore::new(
                SessionKey::from_bytes(b"integration-test-key".to_vec()).unwrap(),
                SessionConfig::default(),
            )
            .unwrap(),
            saves: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for CountingSessionStore {
    async fn get(&self, exchange: &Exchange, name: &str) -> Session {
        self.inner.get(exchange, name).await
    }

    fn new_session(&self, name: &str) -> AppResult<Session> {
        self.inner.new_session(name)
    }

    async fn save(&self, exchange: &mut Exchange, session: &Session) -> AppResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::session("backend unavailable"));
        }
        self.inner.save(exchange, session).await
    }
}

/// User store that counts writes and can be told to fail lookups.
#[derive(Debug, Default)]
pub struct CountingUserStore {
    inner: MemoryUserStore,
    pub adds: AtomicUsize,
    pub fail_lookups: AtomicBool,
}

impl CountingUserStore {
    pub fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for CountingUserStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Identity>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AppError::external_service("user store offline"));
        }
        self.inner.find_by_username(username).await
    }

    async fn add_user(&self, identity: &Identity) -> AppResult<()> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.inner.add_user(identity).await
    }

    async fn delete_user(&self, username: &str) -> AppResult<bool> {
        self.inner.delete_user(username).await
    }

    async fn list_by_source(&self, source: AuthSource) -> AppResult<Vec<Identity>> {
        self.inner.list_by_source(source).await
    }
}

/// In-memory directory with a single shared password.
#[derive(Debug)]
pub struct MockDirectory {
    entries: Vec<DirectoryEntry>,
    password: String,
    pub binds: AtomicUsize,
}

impl MockDirectory {
    pub fn new(usernames: &[&str], password: &str) -> Self {
        Self {
            entries: usernames.iter().map(|u| DirectoryEntry::new(*u)).collect(),
            password: password.to_string(),
            binds: AtomicUsize::new(0),
        }
    }

    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryClient for MockDirectory {
    async fn lookup(&self, username: &str) -> AppResult<Option<DirectoryEntry>> {
        Ok(self.entries.iter().find(|e| e.username == username).cloned())
    }

    async fn bind(&self, username: &str, password: &str) -> AppResult<bool> {
        self.binds.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.iter().any(|e| e.username == username) && password == self.password)
    }

    async fn list_users(&self) -> AppResult<Vec<DirectoryEntry>> {
        Ok(self.entries.clone())
    }
}

pub const DIRECTORY_PASSWORD: &str = "directory-pass";

pub const BEARER_SECRET: &str = "bearer-secret";
pub const LOGIN_TOKEN_SECRET: &str = "login-token-secret";

pub fn hs256(secret: &str) -> TokenKeyConfig {
    TokenKeyConfig {
        algorithm: TokenAlgorithm::Hs256,
        key: secret.to_string(),
        private_key: None,
    }
}

/// Signs a token for `username` with the given secret and lifetime.
pub fn token(secret: &str, username: &str, roles: &[&str], max_age_seconds: u64) -> String {
    let identity = Identity::builder(username, AuthMode::Token, AuthSource::Token)
        .roles(roles.iter().map(|r| r.to_string()).collect())
        .build();
    TokenIssuer::from_config(&hs256(secret), max_age_seconds)
        .unwrap()
        .issue(&identity)
        .unwrap()
        .0
}

/// A correctly signed token whose `exp` lies in the past.
pub fn expired_token(secret: &str, username: &str) -> String {
    let issued: DateTime<Utc> = Utc::now() - Duration::minutes(10);
    let claims = TokenClaims {
        sub: username.to_string(),
        roles: vec!["user".to_string()],
        projects: Vec::new(),
        name: None,
        email: None,
        iss: None,
        iat: Some(issued.timestamp()),
        exp: Some((issued + Duration::minutes(5)).timestamp()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Adds `Authorization: Bearer <token>` to an exchange.
pub fn with_bearer(exchange: Exchange, token: &str) -> Exchange {
    let mut headers = exchange.headers().clone();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    Exchange::new(headers)
}

/// A login request carrying a login token in the `Authorization` header.
pub fn token_login(token: &str) -> Exchange {
    with_bearer(Exchange::default(), token)
}

pub fn ldap_config(sync_user_on_login: bool) -> LdapConfig {
    LdapConfig {
        url: "ldap://directory.test".to_string(),
        user_base: "ou=people,dc=test".to_string(),
        sync_user_on_login,
        sync_interval_seconds: 0,
        sync_delete_stale_users: false,
        default_roles: vec!["user".to_string()],
    }
}

/// Orchestrator wired to counting doubles.
pub struct Harness {
    pub orchestrator: AuthOrchestrator,
    pub users: Arc<CountingUserStore>,
    pub sessions: Arc<CountingSessionStore>,
    pub directory: Arc<MockDirectory>,
    pub hasher: PasswordHasher,
}

impl Harness {
    /// Registry `[ldap, jwt-session, local]` with the given session max-age,
    /// plus bearer-token authentication.
    pub fn new(max_age_seconds: u64) -> Self {
        Self::build(max_age_seconds, true)
    }

    /// Orchestrator whose registry is empty.
    pub fn empty() -> Self {
        Self::build(0, false)
    }

    fn build(max_age_seconds: u64, with_authenticators: bool) -> Self {
        let users = Arc::new(CountingUserStore::default());
        let sessions = Arc::new(CountingSessionStore::new());
        let directory = Arc::new(MockDirectory::new(&["alice", "carol"], DIRECTORY_PASSWORD));
        let hasher = PasswordHasher::new();

        let authenticators = if with_authenticators {
            vec![
                AuthenticatorDispatch::Directory(Arc::new(DirectoryAuthenticator::new(
                    directory.clone(),
                    users.clone(),
                    ldap_config(true),
                ))),
                AuthenticatorDispatch::TokenSession(TokenSessionAuthenticator::new(
                    TokenVerifier::from_config(&hs256(LOGIN_TOKEN_SECRET)).unwrap(),
                    users.clone(),
                    false,
                    true,
                )),
                AuthenticatorDispatch::Local(LocalPasswordAuthenticator::new(hasher.clone())),
            ]
        } else {
            Vec::new()
        };

        let bearer = with_authenticators.then(|| {
            TokenBearerAuthenticator::new(
                TokenVerifier::from_config(&hs256(BEARER_SECRET)).unwrap(),
                users.clone(),
                false,
            )
        });

        let orchestrator = AuthOrchestrator::new(
            AuthenticatorRegistry::new(authenticators),
            SessionManager::new(sessions.clone(), max_age_seconds).unwrap(),
            users.clone(),
            bearer,
        );

        Self {
            orchestrator,
            users,
            sessions,
            directory,
            hasher,
        }
    }

    /// Stores a local password user without counting it as a login write.
    pub async fn add_local_user(&self, username: &str, password: &str, roles: &[&str], projects: &[&str]) {
        let identity = Identity::builder(username, AuthMode::Session, AuthSource::LocalPassword)
            .credential_ref(self.hasher.hash_password(password).unwrap())
            .roles(roles.iter().map(|r| r.to_string()).collect())
            .projects(projects.iter().map(|p| p.to_string()).collect())
            .build();
        self.users.inner.add_user(&identity).await.unwrap();
    }

    /// Stores a local password user whose credentials expired a minute ago.
    pub async fn add_expired_local_user(&self, username: &str, password: &str) {
        let identity = Identity::builder(username, AuthMode::Session, AuthSource::LocalPassword)
            .credential_ref(self.hasher.hash_password(password).unwrap())
            .roles(vec!["user".to_string()])
            .expiration(Some(Utc::now() - Duration::minutes(1)))
            .build();
        self.users.inner.add_user(&identity).await.unwrap();
    }

    /// Stores a directory-sourced user without counting it as a login write.
    pub async fn add_directory_user(&self, username: &str) {
        let identity = Identity::builder(username, AuthMode::Session, AuthSource::Directory)
            .roles(vec!["user".to_string()])
            .build();
        self.users.inner.add_user(&identity).await.unwrap();
    }

    pub async fn login(&self, username: &str, password: &str) -> Outcome {
        self.orchestrator
            .login(login_form(username, password), success, failure)
            .await
            .unwrap()
    }
}

/// Which continuation ran, and with what.
#[derive(Debug)]
pub enum Outcome {
    Success(Exchange),
    Failure(Exchange, AuthError),
}

impl Outcome {
    pub fn exchange(&self) -> &Exchange {
        match self {
            Outcome::Success(exchange) | Outcome::Failure(exchange, _) => exchange,
        }
    }

    pub fn identity(&self) -> Arc<Identity> {
        match self {
            Outcome::Success(exchange) => exchange.identity().cloned().unwrap(),
            Outcome::Failure(_, err) => panic!("expected success, got {err:?}"),
        }
    }

    pub fn error(&self) -> &AuthError {
        match self {
            Outcome::Failure(_, err) => err,
            Outcome::Success(_) => panic!("expected failure"),
        }
    }
}

pub async fn success(exchange: Exchange) -> Outcome {
    Outcome::Success(exchange)
}

pub async fn failure(exchange: Exchange, err: AuthError) -> Outcome {
    Outcome::Failure(exchange, err)
}

pub fn login_form(username: &str, password: &str) -> Exchange {
    Exchange::default().with_form(HashMap::from([
        ("username".to_string(), username.to_string()),
        ("password".to_string(), password.to_string()),
    ]))
}

/// The `Set-Cookie` header for `name` queued on the exchange.
pub fn set_cookie<'a>(exchange: &'a Exchange, name: &str) -> Option<&'a str> {
    exchange
        .response_headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
}

/// A follow-up request carrying the cookies set on `exchange`.
pub fn replay(exchange: &Exchange) -> Exchange {
    let pairs: Vec<&str> = exchange
        .response_headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect();
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_str(&pairs.join("; ")).unwrap());
    Exchange::new(headers)
}
