//! Stateless CSRF tokens.
//!
//! Each token is a short-lived signed JWT carrying a random nonce and an
//! optional user binding. Nothing is stored server-side; possession of a
//! token with a valid signature is the proof. Tokens are handed out on
//! every response and demanded back on state-changing requests that do not
//! carry a bearer token.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CSRF_HEADER: &str = "x-csrf-token";

const TOKEN_USE: &str = "csrf";
const NONCE_BYTES: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
pub struct CsrfClaims {
    pub nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<Uuid>,
    pub token_use: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct CsrfSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl CsrfSigner {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl_seconds,
        }
    }

    /// Mint a token, bound to a user when the caller is authenticated.
    ///
    /// # Errors
    /// Fails if the system RNG or JWT encoding fails.
    pub fn issue(&self, user_id: Option<Uuid>) -> Result<String> {
        let mut nonce = [0u8; NONCE_BYTES];
        OsRng
            .try_fill_bytes(&mut nonce)
            .context("system rng unavailable")?;

        let now = Utc::now().timestamp();
        let claims = CsrfClaims {
            nonce: URL_SAFE_NO_PAD.encode(nonce),
            sub: user_id,
            token_use: TOKEN_USE.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("failed to sign csrf token")
    }

    /// Check signature, expiry and the token-use marker. Returns `None` for
    /// anything invalid; callers never learn why.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<CsrfClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = jsonwebtoken::decode::<CsrfClaims>(token, &self.decoding, &validation)
            .ok()?
            .claims;
        (claims.token_use == TOKEN_USE).then_some(claims)
    }
}
