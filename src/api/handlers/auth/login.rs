//! Login endpoint with failure-only rate limiting.

use axum::{
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::{net::SocketAddr, sync::Arc};

use super::error::AuthError;
use super::rate_limit::RateLimitPolicy;
use super::state::AuthState;
use super::types::{AuthPayload, LoginRequest, MessageResponse};
use super::utils::client_key;

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = AuthPayload),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many failed attempts")
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return AuthError::Validation("Missing payload".to_string()).into_response(),
    };

    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return AuthError::Validation("Email and password are required".to_string())
            .into_response();
    }

    let client_ip = client_key(&headers, peer.map(|info| info.0));
    if auth_state
        .limiter()
        .check(RateLimitPolicy::Login, &client_ip)
        .is_limited()
    {
        return AuthError::RateLimited(RateLimitPolicy::Login.message().to_string())
            .into_response();
    }

    match auth_state.service().login(email, &request.password).await {
        Ok(data) => (
            StatusCode::OK,
            Json(MessageResponse::with_data("Login successful", data)),
        )
            .into_response(),
        Err(err) => {
            // Only credential failures count against the quota.
            if matches!(
                err,
                AuthError::InvalidCredentials | AuthError::AccountDeactivated
            ) {
                auth_state
                    .limiter()
                    .record(RateLimitPolicy::Login, &client_ip);
            }
            err.into_response()
        }
    }
}
