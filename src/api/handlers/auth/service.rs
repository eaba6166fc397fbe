//! Auth service: orchestrates registration, login, token rotation and
//! password reset over the user store.

use crate::api::handlers::auth::{
    error::AuthError,
    password::PasswordHasher,
    roles::Role,
    store::{InsertOutcome, NewUser, UserRecord, UserStore},
    tokens::TokenSigner,
    types::{AuthPayload, TokenPair, UserResponse},
    utils::{generate_reset_token, hash_reset_token},
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenSigner,
    reset_token_ttl_seconds: i64,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        tokens: TokenSigner,
        reset_token_ttl_seconds: i64,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            reset_token_ttl_seconds,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.tokens
    }

    /// Create a user and issue the first token pair.
    ///
    /// # Errors
    /// `AlreadyExists` when the email is taken; `Internal` on store failure.
    pub async fn register(
        &self,
        email: String,
        password: &str,
        first_name: String,
        last_name: String,
    ) -> Result<AuthPayload, AuthError> {
        let password_hash = self.hasher.hash(password).await?;

        let outcome = self
            .store
            .insert(NewUser {
                email,
                first_name,
                last_name,
                password_hash,
                role: Role::User,
            })
            .await?;

        let user = match outcome {
            InsertOutcome::Created(user) => user,
            InsertOutcome::DuplicateEmail => return Err(AuthError::AlreadyExists),
        };

        let pair = self.issue_and_store_pair(&user).await?;
        info!(user_id = %user.id, "user registered");

        Ok(AuthPayload {
            user: UserResponse::from_record(&user),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Authenticate by email and password, issuing a fresh token pair.
    ///
    /// Absent user and wrong password produce the same error kind; every
    /// successful login overwrites the stored refresh token, invalidating
    /// prior sessions' refresh tokens.
    ///
    /// # Errors
    /// `InvalidCredentials`, `AccountDeactivated`, or `Internal`.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        if !self.hasher.verify(password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_and_store_pair(&user).await?;
        debug!(user_id = %user.id, "login succeeded");

        Ok(AuthPayload {
            user: UserResponse::from_record(&user),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Exchange a refresh token for a new pair, rotating the stored value.
    ///
    /// Verification is two-step: signature+expiry, then an atomic swap keyed
    /// on the presented value. A superseded, cleared or mismatched token
    /// fails, so a stolen refresh token dies on its first replay after
    /// legitimate use.
    ///
    /// # Errors
    /// `InvalidToken` for any verification or rotation failure.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let new_refresh = self.tokens.issue_refresh(claims.sub)?;
        let user = self
            .store
            .rotate_refresh_token(claims.sub, refresh_token, &new_refresh)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let access_token = self.tokens.issue_access(&user)?;
        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh,
        })
    }

    /// Issue a single-use reset token for the account, if it exists.
    ///
    /// Always succeeds from the caller's point of view; the returned raw
    /// token is `None` for unknown emails so handlers cannot tell the
    /// difference apart. Delivery is an external collaborator; here it is a
    /// log stub.
    ///
    /// # Errors
    /// `Internal` on store failure only.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            // Do not reveal whether the account exists.
            debug!("password reset requested for unknown email");
            return Ok(None);
        };

        let token = generate_reset_token()?;
        let token_hash = hash_reset_token(&token);
        let expires_at = Utc::now() + Duration::seconds(self.reset_token_ttl_seconds);

        self.store
            .set_reset_token(user.id, &token_hash, expires_at)
            .await?;

        // Out-of-band delivery stub; the raw token is never logged.
        info!(user_id = %user.id, "password reset token issued");

        Ok(Some(token))
    }

    /// Consume a reset token and set a new password.
    ///
    /// Success clears the reset pair and the refresh token, forcing
    /// re-authentication everywhere.
    ///
    /// # Errors
    /// `InvalidOrExpiredResetToken` when no user holds this exact, unexpired
    /// token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let new_password_hash = self.hasher.hash(new_password).await?;
        let token_hash = hash_reset_token(token);

        let consumed = self
            .store
            .consume_reset_token(&token_hash, &new_password_hash)
            .await?;
        if !consumed {
            return Err(AuthError::InvalidOrExpiredResetToken);
        }

        info!("password reset completed");
        Ok(())
    }

    /// Clear the stored refresh token. Idempotent if already logged out.
    ///
    /// # Errors
    /// `Internal` on store failure.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.store.clear_refresh_token(user_id).await?;
        debug!(user_id = %user_id, "logout");
        Ok(())
    }

    /// Fetch the user record with all secret-bearing fields stripped.
    ///
    /// # Errors
    /// `NotFound` when the id no longer resolves.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        Ok(UserResponse::from_record(&user))
    }

    async fn issue_and_store_pair(&self, user: &UserRecord) -> Result<TokenPair, AuthError> {
        let access_token = self.tokens.issue_access(user)?;
        let refresh_token = self.tokens.issue_refresh(user.id)?;
        self.store
            .store_refresh_token(user.id, &refresh_token)
            .await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::store::memory::MemoryUserStore;
    use anyhow::Result;
    use secrecy::SecretString;

    const TEST_BCRYPT_COST: u32 = 4;

    fn service_with_store() -> (AuthService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let tokens = TokenSigner::new(
            &SecretString::from("access-secret"),
            &SecretString::from("refresh-secret"),
            900,
            604_800,
        );
        let service = AuthService::new(
            store.clone(),
            PasswordHasher::new(TEST_BCRYPT_COST),
            tokens,
            3600,
        );
        (service, store)
    }

    async fn register_alice(service: &AuthService) -> Result<AuthPayload> {
        Ok(service
            .register(
                "alice@example.com".to_string(),
                "s3cret-pw",
                "Alice".to_string(),
                "Quake".to_string(),
            )
            .await?)
    }

    #[tokio::test]
    async fn register_returns_user_and_tokens() -> Result<()> {
        let (service, _) = service_with_store();
        let payload = register_alice(&service).await?;

        assert_eq!(payload.user.email, "alice@example.com");
        assert_eq!(payload.user.role, Role::User);
        assert!(payload.user.is_active);
        assert!(!payload.user.email_verified);

        let claims = service.tokens().verify_access(&payload.access_token)?;
        assert_eq!(claims.sub, payload.user.id);
        Ok(())
    }

    #[tokio::test]
    async fn register_duplicate_email_conflicts() -> Result<()> {
        let (service, _) = service_with_store();
        register_alice(&service).await?;

        let err = service
            .register(
                "alice@example.com".to_string(),
                "other-pw",
                "Alice".to_string(),
                "Again".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));
        Ok(())
    }

    #[tokio::test]
    async fn login_wrong_password_and_unknown_email_look_identical() -> Result<()> {
        let (service, _) = service_with_store();
        register_alice(&service).await?;

        let wrong_pw = service
            .login("alice@example.com", "not-the-password")
            .await
            .unwrap_err();
        let no_user = service
            .login("nobody@example.com", "s3cret-pw")
            .await
            .unwrap_err();

        assert_eq!(wrong_pw.to_string(), no_user.to_string());
        assert_eq!(wrong_pw.status(), no_user.status());
        Ok(())
    }

    #[tokio::test]
    async fn login_deactivated_account_rejected() -> Result<()> {
        let (service, store) = service_with_store();
        let payload = register_alice(&service).await?;
        store.update(payload.user.id, |user| user.is_active = false);

        let err = service
            .login("alice@example.com", "s3cret-pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountDeactivated));
        // Same outward message as a bad password.
        assert_eq!(err.to_string(), AuthError::InvalidCredentials.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn login_overwrites_previous_refresh_token() -> Result<()> {
        let (service, _) = service_with_store();
        let first = register_alice(&service).await?;
        let second = service.login("alice@example.com", "s3cret-pw").await?;

        let err = service
            .refresh_token(&first.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        service.refresh_token(&second.refresh_token).await?;
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rotation_invalidates_old_token() -> Result<()> {
        let (service, _) = service_with_store();
        let payload = register_alice(&service).await?;

        let rotated = service.refresh_token(&payload.refresh_token).await?;
        assert_ne!(rotated.refresh_token, payload.refresh_token);

        let replay = service
            .refresh_token(&payload.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(replay, AuthError::InvalidToken));

        // The rotated token stays valid for exactly one more exchange.
        service.refresh_token(&rotated.refresh_token).await?;
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejected_for_deactivated_user() -> Result<()> {
        let (service, store) = service_with_store();
        let payload = register_alice(&service).await?;
        store.update(payload.user.id, |user| user.is_active = false);

        let err = service
            .refresh_token(&payload.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
        Ok(())
    }

    #[tokio::test]
    async fn password_reset_round_trip() -> Result<()> {
        let (service, _) = service_with_store();
        register_alice(&service).await?;

        let token = service
            .request_password_reset("alice@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("expected a reset token"))?;
        service.reset_password(&token, "brand-new-pw").await?;

        service.login("alice@example.com", "brand-new-pw").await?;
        let old_pw = service.login("alice@example.com", "s3cret-pw").await;
        assert!(old_pw.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email_yields_no_token() -> Result<()> {
        let (service, _) = service_with_store();
        let token = service.request_password_reset("nobody@example.com").await?;
        assert!(token.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn reset_token_is_single_use() -> Result<()> {
        let (service, _) = service_with_store();
        register_alice(&service).await?;

        let token = service
            .request_password_reset("alice@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("expected a reset token"))?;
        service.reset_password(&token, "first-new-pw").await?;

        let replay = service
            .reset_password(&token, "second-new-pw")
            .await
            .unwrap_err();
        assert!(matches!(replay, AuthError::InvalidOrExpiredResetToken));
        Ok(())
    }

    #[tokio::test]
    async fn expired_reset_token_rejected() -> Result<()> {
        let (service, store) = service_with_store();
        let payload = register_alice(&service).await?;

        let token = service
            .request_password_reset("alice@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("expected a reset token"))?;
        store.update(payload.user.id, |user| {
            user.reset_token_expires_at = Some(Utc::now() - Duration::seconds(1));
        });

        let err = service
            .reset_password(&token, "too-late-pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidOrExpiredResetToken));
        Ok(())
    }

    #[tokio::test]
    async fn new_reset_request_supersedes_previous_token() -> Result<()> {
        let (service, _) = service_with_store();
        register_alice(&service).await?;

        let first = service
            .request_password_reset("alice@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("expected a reset token"))?;
        let second = service
            .request_password_reset("alice@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("expected a reset token"))?;

        let stale = service.reset_password(&first, "pw-one").await.unwrap_err();
        assert!(matches!(stale, AuthError::InvalidOrExpiredResetToken));
        service.reset_password(&second, "pw-two").await?;
        Ok(())
    }

    #[tokio::test]
    async fn successful_reset_clears_refresh_token() -> Result<()> {
        let (service, _) = service_with_store();
        let payload = register_alice(&service).await?;

        let token = service
            .request_password_reset("alice@example.com")
            .await?
            .ok_or_else(|| anyhow::anyhow!("expected a reset token"))?;
        service.reset_password(&token, "brand-new-pw").await?;

        let err = service
            .refresh_token(&payload.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
        Ok(())
    }

    #[tokio::test]
    async fn logout_clears_refresh_token_and_is_idempotent() -> Result<()> {
        let (service, _) = service_with_store();
        let payload = register_alice(&service).await?;

        service.logout(payload.user.id).await?;
        let err = service
            .refresh_token(&payload.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        service.logout(payload.user.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn profile_round_trip_and_not_found() -> Result<()> {
        let (service, _) = service_with_store();
        let payload = register_alice(&service).await?;

        let profile = service.get_profile(payload.user.id).await?;
        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(profile.first_name, "Alice");

        let err = service.get_profile(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
        Ok(())
    }
}
