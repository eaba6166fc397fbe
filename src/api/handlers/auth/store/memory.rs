//! In-memory user store backing the unit tests.

#![cfg(test)]

use super::{InsertOutcome, NewUser, UserRecord, UserStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub(crate) struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Direct record mutation for test setup (deactivation, expiry rewinds).
    pub(crate) fn update<F>(&self, id: Uuid, mutate: F)
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut users = self.users.lock().expect("users lock");
        if let Some(record) = users.get_mut(&id) {
            mutate(record);
        }
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<InsertOutcome> {
        let mut users = self.users.lock().expect("users lock");
        if users.values().any(|user| user.email == new_user.email) {
            return Ok(InsertOutcome::DuplicateEmail);
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_active: true,
            email_verified: false,
            refresh_token: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
        };
        users.insert(record.id, record.clone());
        Ok(InsertOutcome::Created(record))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let users = self.users.lock().expect("users lock");
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let users = self.users.lock().expect("users lock");
        Ok(users.get(&id).cloned())
    }

    async fn store_refresh_token(&self, id: Uuid, token: &str) -> Result<()> {
        let mut users = self.users.lock().expect("users lock");
        if let Some(record) = users.get_mut(&id) {
            record.refresh_token = Some(token.to_string());
        }
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        old: &str,
        new: &str,
    ) -> Result<Option<UserRecord>> {
        let mut users = self.users.lock().expect("users lock");
        match users.get_mut(&id) {
            Some(record)
                if record.is_active && record.refresh_token.as_deref() == Some(old) =>
            {
                record.refresh_token = Some(new.to_string());
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<()> {
        let mut users = self.users.lock().expect("users lock");
        if let Some(record) = users.get_mut(&id) {
            record.refresh_token = None;
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut users = self.users.lock().expect("users lock");
        if let Some(record) = users.get_mut(&id) {
            record.reset_token_hash = Some(token_hash.to_vec());
            record.reset_token_expires_at = Some(expires_at);
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token_hash: &[u8],
        new_password_hash: &str,
    ) -> Result<bool> {
        let mut users = self.users.lock().expect("users lock");
        let now = Utc::now();
        let record = users.values_mut().find(|user| {
            user.reset_token_hash.as_deref() == Some(token_hash)
                && user.reset_token_expires_at.is_some_and(|expiry| expiry > now)
        });
        match record {
            Some(record) => {
                record.password_hash = new_password_hash.to_string();
                record.reset_token_hash = None;
                record.reset_token_expires_at = None;
                record.refresh_token = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
