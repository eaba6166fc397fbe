//! Authenticated caller identity and authorization guards.

use crate::api::handlers::auth::{
    error::AuthError,
    roles::{role_allows, Permission, Role},
    tokens::TokenSigner,
    utils::extract_bearer_token,
};
use axum::http::HeaderMap;
use uuid::Uuid;

/// Identity established from a verified access token.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Require a valid bearer access token on the request.
///
/// # Errors
/// `Unauthorized` when the header is missing or malformed, `InvalidToken`
/// when the token fails verification.
pub fn require_auth(headers: &HeaderMap, tokens: &TokenSigner) -> Result<Principal, AuthError> {
    let token = extract_bearer_token(headers).ok_or(AuthError::Unauthorized)?;
    let claims = tokens.verify_access(&token)?;
    Ok(Principal {
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}

/// Require one of the listed roles.
///
/// # Errors
/// `Forbidden` naming the missing requirement.
pub fn require_role(principal: &Principal, roles: &[Role]) -> Result<(), AuthError> {
    if roles.contains(&principal.role) {
        return Ok(());
    }
    let wanted = roles
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(AuthError::Forbidden(format!(
        "Access denied, required role: {wanted}"
    )))
}

/// Require the principal's role to grant a permission.
///
/// # Errors
/// `Forbidden` naming the missing permission.
pub fn require_permission(principal: &Principal, permission: Permission) -> Result<(), AuthError> {
    if role_allows(principal.role, permission) {
        return Ok(());
    }
    Err(AuthError::Forbidden(format!(
        "Access denied, required permission: {}",
        permission.as_str()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::store::test_user;
    use anyhow::Result;
    use axum::http::header::AUTHORIZATION;
    use secrecy::SecretString;

    fn signer() -> TokenSigner {
        TokenSigner::new(
            &SecretString::from("access-secret"),
            &SecretString::from("refresh-secret"),
            900,
            604_800,
        )
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = format!("Bearer {token}").parse() {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    #[test]
    fn valid_bearer_token_yields_principal() -> Result<()> {
        let tokens = signer();
        let user = test_user("erin@example.com");
        let access = tokens.issue_access(&user)?;

        let principal = require_auth(&bearer_headers(&access), &tokens)?;
        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.email, "erin@example.com");
        assert_eq!(principal.role, Role::User);
        Ok(())
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let err = require_auth(&HeaderMap::new(), &signer()).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[test]
    fn refresh_token_rejected_as_access_token() -> Result<()> {
        let tokens = signer();
        let refresh = tokens.issue_refresh(test_user("erin@example.com").id)?;

        let err = require_auth(&bearer_headers(&refresh), &tokens).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
        Ok(())
    }

    #[test]
    fn role_guard_enforces_membership() {
        let mut principal = Principal {
            user_id: Uuid::new_v4(),
            email: "erin@example.com".to_string(),
            role: Role::User,
        };

        assert!(require_role(&principal, &[Role::User, Role::Moderator]).is_ok());
        let err = require_role(&principal, &[Role::Admin]).unwrap_err();
        assert!(err.to_string().contains("admin"));

        principal.role = Role::Admin;
        assert!(require_role(&principal, &[Role::Admin]).is_ok());
    }

    #[test]
    fn permission_guard_follows_role_table() {
        let user = Principal {
            user_id: Uuid::new_v4(),
            email: "erin@example.com".to_string(),
            role: Role::User,
        };
        assert!(require_permission(&user, Permission::ReadEarthquakes).is_ok());
        assert!(require_permission(&user, Permission::WriteEarthquakes).is_err());

        let admin = Principal {
            role: Role::Admin,
            ..user
        };
        assert!(require_permission(&admin, Permission::ReadUsers).is_ok());
    }
}
