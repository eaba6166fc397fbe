//! Password hashing and verification.

use crate::api::handlers::auth::error::AuthError;
use anyhow::{anyhow, Context};

/// One-way password hashing with a configurable bcrypt cost factor.
///
/// Hashing and verification run on the blocking thread pool so a slow hash
/// never stalls the async runtime. Verification failure is indistinguishable
/// from a wrong password; both come back as `false`.
#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password. The plaintext is never logged or returned.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if bcrypt fails.
    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || {
            bcrypt::hash(password, cost).context("failed to hash password")
        })
        .await
        .map_err(|err| anyhow!("hash task failed: {err}"))?
        .map_err(AuthError::Internal)
    }

    /// Verify a plaintext password against a stored digest.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if the blocking task cannot be joined.
    pub async fn verify(&self, password: &str, digest: &str) -> Result<bool, AuthError> {
        let password = password.to_string();
        let digest = digest.to_string();
        let matched = tokio::task::spawn_blocking(move || {
            // A malformed digest means the password cannot match; do not
            // distinguish it from a wrong password.
            bcrypt::verify(password, &digest).unwrap_or(false)
        })
        .await
        .map_err(|err| AuthError::Internal(anyhow!("verify task failed: {err}")))?;
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    // Low cost keeps the tests fast; production cost comes from configuration.
    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify_round_trips() -> Result<()> {
        let hasher = PasswordHasher::new(TEST_COST);
        let digest = hasher.hash("Passw0rd!").await?;
        assert!(hasher.verify("Passw0rd!", &digest).await?);
        assert!(!hasher.verify("passw0rd!", &digest).await?);
        Ok(())
    }

    #[tokio::test]
    async fn hash_is_salted() -> Result<()> {
        let hasher = PasswordHasher::new(TEST_COST);
        let first = hasher.hash("same-password").await?;
        let second = hasher.hash("same-password").await?;
        assert_ne!(first, second);
        assert!(hasher.verify("same-password", &first).await?);
        assert!(hasher.verify("same-password", &second).await?);
        Ok(())
    }

    #[tokio::test]
    async fn verify_against_foreign_hash_fails() -> Result<()> {
        let hasher = PasswordHasher::new(TEST_COST);
        let digest = hasher.hash("one-password").await?;
        assert!(!hasher.verify("another-password", &digest).await?);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_digest_verifies_false() -> Result<()> {
        let hasher = PasswordHasher::new(TEST_COST);
        assert!(!hasher.verify("whatever", "not-a-bcrypt-digest").await?);
        Ok(())
    }
}
