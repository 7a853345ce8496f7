//! Integration tests for the HTTP authentication flow.

mod helpers;

use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_login_success() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/login",
            Some("username=alice&password=wonderland"),
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "alice");
    assert_eq!(response.body["data"]["auth_source"], "local_password");
    assert_eq!(response.body["data"]["auth_mode"], "session");
    assert!(response.body["data"].get("credential_ref").is_none());

    let cookie = response.set_cookie("session").unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("POST", "/api/login", Some("username=alice&password=nope"), &[])
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookie("session").is_none());
}

#[tokio::test]
async fn test_login_nonexistent_user() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("POST", "/api/login", Some("username=nobody&password=x"), &[])
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_unauthenticated() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/me", None, &[]).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_session() {
    let app = helpers::TestApp::new().await;
    let cookie = app.login("alice", "wonderland").await;

    let response = app.with_cookie("GET", "/api/me", &cookie).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "alice");
    assert_eq!(response.body["data"]["auth_source"], "unknown");
    assert_eq!(
        response.body["data"]["roles"],
        serde_json::json!(["admin", "user"])
    );
    assert_eq!(
        response.body["data"]["projects"],
        serde_json::json!(["looking-glass"])
    );
}

#[tokio::test]
async fn test_me_with_tampered_session() {
    let app = helpers::TestApp::new().await;
    let cookie = app.login("alice", "wonderland").await;
    let tampered = format!("{cookie}x");

    let response = app.with_cookie("GET", "/api/me", &tampered).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_issued_token_authenticates() {
    let app = helpers::TestApp::new().await;
    let cookie = app.login("alice", "wonderland").await;

    let issued = app.with_cookie("GET", "/api/jwt", &cookie).await;
    assert_eq!(issued.status, StatusCode::OK);
    let token = issued.body["data"]["token"].as_str().unwrap().to_string();
    assert!(issued.body["data"]["expires_at"].is_string());

    let response = app
        .request(
            "GET",
            "/api/me",
            None,
            &[(AUTHORIZATION, format!("Bearer {token}"))],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "alice");
    assert_eq!(response.body["data"]["auth_mode"], "token");
    assert_eq!(response.body["data"]["auth_source"], "token");
}

#[tokio::test]
async fn test_logout_expires_cookie() {
    let app = helpers::TestApp::new().await;
    let cookie = app.login("alice", "wonderland").await;

    let response = app.with_cookie("POST", "/api/logout", &cookie).await;

    assert_eq!(response.status, StatusCode::OK);
    let expired = response.set_cookie("session").unwrap();
    assert!(expired.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_logout_without_session() {
    let app = helpers::TestApp::new().await;

    let response = app.request("POST", "/api/logout", None, &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.set_cookie("session").is_none());
}
