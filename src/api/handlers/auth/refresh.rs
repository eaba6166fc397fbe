//! Refresh token exchange endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use super::error::AuthError;
use super::state::AuthState;
use super::types::{MessageResponse, RefreshRequest, TokenPair};

#[utoipa::path(
    post,
    path = "/v1/auth/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair rotated", body = TokenPair),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid or superseded refresh token"),
        (status = 429, description = "Rate limited")
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let request: RefreshRequest = match payload {
        Some(Json(payload)) => payload,
        None => return AuthError::Validation("Missing payload".to_string()).into_response(),
    };

    if request.refresh_token.trim().is_empty() {
        return AuthError::Validation("Refresh token is required".to_string()).into_response();
    }

    match auth_state
        .service()
        .refresh_token(&request.refresh_token)
        .await
    {
        Ok(pair) => (
            StatusCode::OK,
            Json(MessageResponse::with_data(
                "Token refreshed successfully",
                pair,
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
