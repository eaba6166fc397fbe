//! User persistence behind a store trait.
//!
//! The auth service never talks to the database directly; it speaks to
//! `UserStore` so the identifier encoding and persistence technology stay at
//! this boundary. `postgres` is the production implementation, `memory`
//! backs the unit tests.

pub(crate) mod memory;
pub(crate) mod postgres;

pub use postgres::PgUserStore;

use crate::api::handlers::auth::roles::Role;
use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Full user row as stored. Secret-bearing fields never leave the auth
/// module; responses are built from `UserRecord` with those fields stripped.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub refresh_token: Option<String>,
    pub reset_token_hash: Option<Vec<u8>>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
}

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub enum InsertOutcome {
    Created(UserRecord),
    DuplicateEmail,
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new active user; email uniqueness is enforced by the store.
    async fn insert(&self, new_user: NewUser) -> Result<InsertOutcome>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>>;

    /// Unconditionally overwrite the stored refresh token (login/register).
    async fn store_refresh_token(&self, id: Uuid, token: &str) -> Result<()>;

    /// Atomic compare-and-swap rotation: replace the stored refresh token
    /// only while it still equals `old` and the user is active. Returns the
    /// updated record, or `None` when the swap did not happen. Under two
    /// concurrent rotations presenting the same `old` value, at most one
    /// succeeds.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        old: &str,
        new: &str,
    ) -> Result<Option<UserRecord>>;

    /// Clear the stored refresh token. Idempotent.
    async fn clear_refresh_token(&self, id: Uuid) -> Result<()>;

    /// Store a reset token hash and its absolute expiry as a pair.
    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Single-use consumption: if an unexpired reset token with this hash
    /// exists, set the new password hash, clear the reset pair and clear the
    /// refresh token in one atomic step. Returns whether a row matched.
    async fn consume_reset_token(&self, token_hash: &[u8], new_password_hash: &str)
        -> Result<bool>;
}

#[cfg(test)]
pub(crate) fn test_user(email: &str) -> UserRecord {
    UserRecord {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: "Ana".to_string(),
        last_name: "Seismo".to_string(),
        password_hash: "$2b$04$placeholderplaceholderplace".to_string(),
        role: Role::User,
        is_active: true,
        email_verified: false,
        refresh_token: None,
        reset_token_hash: None,
        reset_token_expires_at: None,
    }
}
