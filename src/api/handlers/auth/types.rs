//! Request and response payloads for the auth endpoints.

use crate::api::handlers::auth::{roles::Role, store::UserRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Public view of a user. Password hash and token fields never leave the
/// store layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
}

impl UserResponse {
    #[must_use]
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            is_active: user.is_active,
            email_verified: user.email_verified,
        }
    }
}

/// User plus the token pair, returned by register and login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthPayload {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Fresh token pair returned by the refresh exchange.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Success envelope shared by all auth endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> MessageResponse<T> {
    #[must_use]
    pub fn with_data(message: &str, data: T) -> Self {
        Self {
            message: message.to_string(),
            data: Some(data),
        }
    }

    #[must_use]
    pub fn bare(message: &str) -> Self {
        Self {
            message: message.to_string(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::store::test_user;
    use anyhow::Result;

    #[test]
    fn user_response_hides_secret_fields() -> Result<()> {
        let mut user = test_user("carol@example.com");
        user.refresh_token = Some("refresh".to_string());
        user.reset_token_hash = Some(vec![1, 2, 3]);

        let json = serde_json::to_value(UserResponse::from_record(&user))?;
        let object = json
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("expected an object"))?;
        assert!(!object.contains_key("password_hash"));
        assert!(!object.contains_key("refresh_token"));
        assert!(!object.contains_key("reset_token_hash"));
        assert_eq!(object["email"], "carol@example.com");
        Ok(())
    }

    #[test]
    fn bare_message_omits_data_key() -> Result<()> {
        let json = serde_json::to_value(MessageResponse::<()>::bare("ok"))?;
        assert_eq!(json, serde_json::json!({"message": "ok"}));
        Ok(())
    }
}
