//! User registration endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use super::error::AuthError;
use super::state::AuthState;
use super::types::{AuthPayload, MessageResponse, RegisterRequest};
use super::utils::valid_email;

const MIN_PASSWORD_LENGTH: usize = 6;

pub(super) fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthPayload),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered"),
        (status = 429, description = "Rate limited")
    ),
    tag = "auth"
)]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return AuthError::Validation("Missing payload".to_string()).into_response(),
    };

    let email = request.email.trim().to_string();
    if !valid_email(&email) {
        return AuthError::Validation("Invalid email".to_string()).into_response();
    }
    if let Err(err) = validate_password(&request.password) {
        return err.into_response();
    }
    let first_name = request.first_name.trim().to_string();
    let last_name = request.last_name.trim().to_string();
    if first_name.is_empty() || last_name.is_empty() {
        return AuthError::Validation("First and last name are required".to_string())
            .into_response();
    }

    match auth_state
        .service()
        .register(email, &request.password, first_name, last_name)
        .await
    {
        Ok(data) => (
            StatusCode::CREATED,
            Json(MessageResponse::with_data(
                "User registered successfully",
                data,
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
