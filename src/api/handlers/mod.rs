//! API handlers for the epicenter auth service.
//!
//! Routes are grouped under `auth` with `/health` alongside. Shared state
//! travels as extensions: the connection pool and an `Arc<AuthState>`.

pub mod auth;
pub mod health;
