//! Access and refresh token issuance and verification.
//!
//! Both token classes are HS256 JWTs signed with distinct secrets, so a
//! compromise of one signing key cannot forge the other. Access tokens are
//! stateless; refresh tokens are additionally mirrored on the user row and
//! only count as valid while they match the stored value (the auth service
//! enforces that half).

use crate::api::handlers::auth::{error::AuthError, roles::Role, store::UserRecord};
use anyhow::Context;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenSigner {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenSigner {
    #[must_use]
    pub fn new(
        access_secret: &SecretString,
        refresh_secret: &SecretString,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.expose_secret().as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.expose_secret().as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.expose_secret().as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.expose_secret().as_bytes()),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// Issue a short-lived access token carrying id, email and role.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if signing fails.
    pub fn issue_access(&self, user: &UserRecord) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.access_ttl_seconds,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.access_encoding)
            .context("failed to sign access token")?;
        Ok(token)
    }

    /// Issue a longer-lived refresh token carrying the subject id and a
    /// random `jti`, so every token is unique even within the same second
    /// and rotation always replaces the stored value with a new string.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if signing fails.
    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + self.refresh_ttl_seconds,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.refresh_encoding)
            .context("failed to sign refresh token")?;
        Ok(token)
    }

    /// Verify signature and expiry of an access token.
    ///
    /// # Errors
    /// Any signature, structure or expiry problem is `AuthError::InvalidToken`.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.access_decoding, &validation())
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Verify signature and expiry of a refresh token.
    ///
    /// The caller must additionally confirm the token matches the value
    /// stored on the user record; a superseded token still decodes here.
    ///
    /// # Errors
    /// Any signature, structure or expiry problem is `AuthError::InvalidToken`.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        jsonwebtoken::decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is exact; no clock leeway.
    validation.leeway = 0;
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::store::test_user;

    fn signer(access_ttl: i64, refresh_ttl: i64) -> TokenSigner {
        TokenSigner::new(
            &SecretString::from("access-secret"),
            &SecretString::from("refresh-secret"),
            access_ttl,
            refresh_ttl,
        )
    }

    #[test]
    fn access_token_round_trips_claims() -> anyhow::Result<()> {
        let signer = signer(900, 604_800);
        let user = test_user("quake@example.com");
        let token = signer.issue_access(&user)?;
        let claims = signer.verify_access(&token)?;
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, user.role);
        assert_eq!(claims.exp - claims.iat, 900);
        Ok(())
    }

    #[test]
    fn refresh_token_round_trips_subject() -> anyhow::Result<()> {
        let signer = signer(900, 604_800);
        let user_id = Uuid::new_v4();
        let token = signer.issue_refresh(user_id)?;
        let claims = signer.verify_refresh(&token)?;
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 604_800);
        Ok(())
    }

    #[test]
    fn refresh_tokens_in_the_same_second_are_distinct() -> anyhow::Result<()> {
        let signer = signer(900, 604_800);
        let user_id = Uuid::new_v4();
        let first = signer.issue_refresh(user_id)?;
        let second = signer.issue_refresh(user_id)?;
        assert_ne!(first, second);
        assert_ne!(
            signer.verify_refresh(&first)?.jti,
            signer.verify_refresh(&second)?.jti
        );
        Ok(())
    }

    #[test]
    fn secrets_are_not_interchangeable() -> anyhow::Result<()> {
        let signer = signer(900, 604_800);
        let user = test_user("quake@example.com");
        let access = signer.issue_access(&user)?;
        let refresh = signer.issue_refresh(user.id)?;
        // A refresh token does not verify as access and vice versa.
        assert!(signer.verify_access(&refresh).is_err());
        assert!(signer.verify_refresh(&access).is_err());
        Ok(())
    }

    #[test]
    fn expired_tokens_are_rejected() -> anyhow::Result<()> {
        let signer = signer(-60, -60);
        let user = test_user("quake@example.com");
        let access = signer.issue_access(&user)?;
        let refresh = signer.issue_refresh(user.id)?;
        assert!(matches!(
            signer.verify_access(&access),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            signer.verify_refresh(&refresh),
            Err(AuthError::InvalidToken)
        ));
        Ok(())
    }

    #[test]
    fn garbage_is_rejected() {
        let signer = signer(900, 604_800);
        assert!(matches!(
            signer.verify_access("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            signer.verify_refresh(""),
            Err(AuthError::InvalidToken)
        ));
    }
}
