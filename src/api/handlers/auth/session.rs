//! Authenticated session endpoints: profile and logout.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::principal::require_auth;
use super::state::AuthState;
use super::types::{MessageResponse, UserResponse};

#[utoipa::path(
    get,
    path = "/v1/auth/profile",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "Account no longer exists"),
        (status = 429, description = "Rate limited")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn profile(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, auth_state.service().tokens()) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    match auth_state.service().get_profile(principal.user_id).await {
        Ok(user) => (
            StatusCode::OK,
            Json(MessageResponse::with_data(
                "Profile retrieved successfully",
                user,
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Refresh token invalidated"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 429, description = "Rate limited")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let principal = match require_auth(&headers, auth_state.service().tokens()) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    match auth_state.service().logout(principal.user_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::<()>::bare("Logged out successfully")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
