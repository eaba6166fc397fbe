//! sqlx/Postgres implementation of the user store.

use super::{InsertOutcome, NewUser, UserRecord, UserStore};
use crate::api::handlers::auth::roles::Role;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, first_name, last_name, password_hash, role, is_active, \
     email_verified, refresh_token, reset_token_hash, reset_token_expires_at";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<UserRecord> {
    let role: String = row.try_get("role").context("missing role column")?;
    let role = role
        .parse::<Role>()
        .map_err(|err| anyhow!("invalid role in users row: {err}"))?;
    Ok(UserRecord {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        password_hash: row.try_get("password_hash")?,
        role,
        is_active: row.try_get("is_active")?,
        email_verified: row.try_get("email_verified")?,
        refresh_token: row.try_get("refresh_token")?,
        reset_token_hash: row.try_get("reset_token_hash")?,
        reset_token_expires_at: row.try_get("reset_token_expires_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn query_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<InsertOutcome> {
        let query = format!(
            r"
        INSERT INTO users (email, first_name, last_name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
    "
        );
        let row = sqlx::query(&query)
            .bind(&new_user.email)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.password_hash)
            .bind(new_user.role.as_str())
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await;

        match row {
            Ok(row) => Ok(InsertOutcome::Created(record_from_row(&row)?)),
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::DuplicateEmail),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup user by email")?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup user by id")?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn store_refresh_token(&self, id: Uuid, token: &str) -> Result<()> {
        let query = "UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to store refresh token")?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        old: &str,
        new: &str,
    ) -> Result<Option<UserRecord>> {
        // Single conditional UPDATE keyed on the previous value: of two
        // concurrent rotations presenting the same token, only one matches.
        let query = format!(
            r"
        UPDATE users
        SET refresh_token = $3, updated_at = NOW()
        WHERE id = $1
          AND refresh_token = $2
          AND is_active
        RETURNING {USER_COLUMNS}
    "
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(old)
            .bind(new)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await
            .context("failed to rotate refresh token")?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<()> {
        // Idempotent; it's fine if the token was already cleared.
        let query = "UPDATE users SET refresh_token = NULL, updated_at = NOW() WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to clear refresh token")?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let query = r"
        UPDATE users
        SET reset_token_hash = $2, reset_token_expires_at = $3, updated_at = NOW()
        WHERE id = $1
    ";
        sqlx::query(query)
            .bind(id)
            .bind(token_hash)
            .bind(expires_at)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to set reset token")?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token_hash: &[u8],
        new_password_hash: &str,
    ) -> Result<bool> {
        // Consuming the token also revokes the refresh token, forcing
        // re-authentication everywhere.
        let query = r"
        UPDATE users
        SET password_hash = $2,
            reset_token_hash = NULL,
            reset_token_expires_at = NULL,
            refresh_token = NULL,
            updated_at = NOW()
        WHERE reset_token_hash = $1
          AND reset_token_expires_at > NOW()
    ";
        let result = sqlx::query(query)
            .bind(token_hash)
            .bind(new_password_hash)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to consume reset token")?;
        Ok(result.rows_affected() > 0)
    }
}
