//! Auth handlers and supporting modules.
//!
//! This module coordinates credential authentication, JWT session management,
//! and the abuse protections wrapped around them.
//!
//! ## Token families
//!
//! - **Access tokens** are short-lived JWTs carrying id, email and role.
//!   They are verified statelessly on every authenticated request.
//! - **Refresh tokens** are longer-lived JWTs stored per user. Redeeming one
//!   rotates it atomically, so a replayed token dies on first reuse.
//! - **Reset tokens** are random single-use values delivered out of band.
//!   Only their SHA-256 hash is stored.
//! - **CSRF tokens** are stateless signed nonces issued on every response
//!   and demanded back on state-changing requests without a bearer token.
//!
//! Each family signs with its own secret.
//!
//! ## Rate limiting
//!
//! Four in-memory fixed-window quotas: a general per-IP cap, a per-identity
//! cap keyed on IP plus bearer token, a login cap that counts only failed
//! attempts, and a tight cap on password reset requests.

pub(crate) mod csrf;
pub(crate) mod error;
pub(crate) mod login;
pub(crate) mod middleware;
pub(crate) mod principal;
mod rate_limit;
pub(crate) mod refresh;
pub(crate) mod register;
pub(crate) mod reset;
pub(crate) mod roles;
pub(crate) mod session;
mod state;
mod store;
pub(crate) mod types;
mod utils;

mod password;
mod service;
mod tokens;

pub use password::PasswordHasher;
pub use rate_limit::WindowRateLimiter;
pub use service::AuthService;
pub use state::{AuthConfig, AuthState, SigningSecrets};
pub use store::PgUserStore;
pub use tokens::TokenSigner;
