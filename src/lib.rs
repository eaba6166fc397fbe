//! # Epicenter (Earthquake Catalog Backend)
//!
//! `epicenter` serves the account and authentication API for the earthquake
//! catalog. It handles email/password registration and login, access/refresh
//! token issuance and rotation, password resets, and role-based access
//! control for the catalog's resource routes.
//!
//! ## Tokens
//!
//! - **Access tokens** are short-lived, stateless JWTs carrying the user id,
//!   email and role. They are not revocable before expiry.
//! - **Refresh tokens** are longer-lived JWTs mirrored on the user row so the
//!   server can revoke them (logout, password reset). Every successful
//!   refresh rotates the stored value; a superseded token is rejected.
//! - **Reset tokens** are random, single-use and time-bounded; only their
//!   hash touches the database.
//!
//! ## Abuse protection
//!
//! State-changing requests without bearer auth must carry a signed CSRF
//! token (`X-CSRF-Token`). Fixed-window rate limits apply per client IP, per
//! `{ip}.{bearer}` identity, and with stricter caps for login failures and
//! password-reset requests.

pub mod api;
pub mod cli;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
