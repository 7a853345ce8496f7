//! Shared test helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use authgate_api::{AppState, build_app};
use authgate_auth::user::seed_users;
use authgate_auth::{AuthOrchestrator, InitContext, MemoryUserStore, PasswordHasher};
use authgate_core::config::AppConfig;

const TEST_CONFIG: &str = r#"
[session]
key = "YXBpLXRlc3Qtc2Vzc2lvbi1rZXktMDEyMzQ1Njc4OWFi"

[auth.jwt]
max_age_seconds = 300

[auth.jwt.key]
algorithm = "HS256"
key = "api-test-secret"

[[auth.users]]
username = "alice"
password = "wonderland"
display_name = "Alice"
roles = ["admin", "user"]
projects = ["looking-glass"]
"#;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application config
    pub config: AppConfig,
}

/// A collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `Set-Cookie` header for `name`, if any.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{name}=")))
            .map(String::from)
    }

    /// `name=value` of the `Set-Cookie` header for `name`, ready for a `Cookie` header.
    pub fn cookie_pair(&self, name: &str) -> Option<String> {
        self.set_cookie(name)
            .and_then(|v| v.split(';').next().map(String::from))
    }
}

impl TestApp {
    /// Create a new test application with one seeded local user.
    pub async fn new() -> Self {
        let config = AppConfig::from_toml(TEST_CONFIG).expect("Failed to parse test config");

        let users = Arc::new(MemoryUserStore::new());
        seed_users(users.as_ref(), &PasswordHasher::new(), &config.auth.users)
            .await
            .expect("Failed to seed users");

        let ctx = InitContext::new(users);
        let orchestrator =
            AuthOrchestrator::initialize(&ctx, &config).expect("Failed to init orchestrator");

        let state = AppState::new(config.clone(), Arc::new(orchestrator));

        Self {
            router: build_app(state),
            config,
        }
    }

    /// Send a request, optionally with a form body and extra headers.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        form: Option<&str>,
        headers: &[(HeaderName, String)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let request = match form {
            Some(form) => builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Log in and return the session cookie pair.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/login",
                Some(&format!("username={username}&password={password}")),
                &[],
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.cookie_pair("session").expect("no session cookie")
    }

    /// Send a request carrying the given session cookie.
    pub async fn with_cookie(&self, method: &str, uri: &str, cookie: &str) -> TestResponse {
        self.request(method, uri, None, &[(COOKIE, cookie.to_string())])
            .await
    }
}
