//! Domain error taxonomy for auth flows and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

/// Errors raised by the auth service and middleware.
///
/// `InvalidCredentials` and `AccountDeactivated` deliberately share one
/// user-facing message so responses cannot be used to enumerate accounts.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists with this email")]
    AlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid credentials")]
    AccountDeactivated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredResetToken,

    #[error("CSRF token validation failed")]
    CsrfValidationFailed,

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidOrExpiredResetToken => StatusCode::BAD_REQUEST,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::InvalidCredentials
            | Self::AccountDeactivated
            | Self::InvalidToken
            | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::CsrfValidationFailed | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation failed",
            Self::AlreadyExists => "Registration failed",
            Self::InvalidCredentials | Self::AccountDeactivated => "Authentication failed",
            Self::InvalidToken | Self::Unauthorized => "Access denied",
            Self::InvalidOrExpiredResetToken => "Password reset failed",
            Self::CsrfValidationFailed => "CSRF token validation failed",
            Self::Forbidden(_) => "Forbidden",
            Self::RateLimited(_) => "Too many requests",
            Self::NotFound => "Not found",
            Self::Internal(_) => "Internal error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Internal detail stays in the server logs; clients get a generic body.
        if let Self::Internal(err) = &self {
            error!("Internal error: {err:#}");
            let body = Json(json!({
                "error": "Internal error",
                "message": "Something went wrong",
            }));
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }

        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_map_matches_taxonomy() {
        assert_eq!(
            AuthError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::AlreadyExists.status(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AccountDeactivated.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InvalidOrExpiredResetToken.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::CsrfValidationFailed.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::Forbidden("nope".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::RateLimited("slow down".into()).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(AuthError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Internal(anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn deactivated_and_invalid_credentials_share_message() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            AuthError::AccountDeactivated.to_string()
        );
    }

    #[test]
    fn internal_error_body_is_generic() {
        let response = AuthError::Internal(anyhow!("db on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
