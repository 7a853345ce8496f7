//! Auth handlers — login, logout, me, token issuance.

use std::collections::HashMap;

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use authgate_auth::{AuthError, Exchange};
use authgate_core::error::AppError;

use crate::dto::response::{ApiResponse, IdentityResponse, MessageResponse, TokenResponse};
use crate::error::ApiError;
use crate::exchange::with_headers;
use crate::extractors::CurrentUser;
use crate::middleware::logging::record_user;
use crate::state::AppState;

/// POST /api/login (also GET, for `?login-token=` links)
///
/// Takes form fields `username` and `password`. Responds with the identity
/// and the session cookie.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Response, ApiError> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    let exchange = Exchange::new(headers).with_query(query).with_form(form);

    let response = state
        .orchestrator
        .login(
            exchange,
            |mut exchange| async move {
                let Some(identity) = exchange.identity().cloned() else {
                    return ApiError::from(AuthError::Unauthorized).into_response();
                };
                record_user(identity.username());
                let body = Json(ApiResponse::ok(IdentityResponse::from(identity.as_ref())));
                with_headers(exchange.take_response_headers(), body)
            },
            |_exchange, err| async move { ApiError::from(err).into_response() },
        )
        .await?;

    Ok(response)
}

/// POST /api/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let response = state
        .orchestrator
        .logout(Exchange::new(headers), |mut exchange| async move {
            let body = Json(ApiResponse::ok(MessageResponse {
                message: "Logged out successfully".to_string(),
            }));
            with_headers(exchange.take_response_headers(), body)
        })
        .await?;

    Ok(response)
}

/// GET /api/me
pub async fn me(user: CurrentUser) -> Json<ApiResponse<IdentityResponse>> {
    Json(ApiResponse::ok(IdentityResponse::from(&*user)))
}

/// GET /api/jwt
///
/// Issues a bearer token for the current identity.
pub async fn issue_token(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let issuer = state
        .token_issuer
        .as_ref()
        .ok_or_else(|| AppError::not_found("Token issuance is not configured"))?;

    let (token, expires_at) = issuer.issue(&user)?;

    Ok(Json(ApiResponse::ok(TokenResponse { token, expires_at })))
}
