//! Shared auth configuration and per-process state.

use crate::api::handlers::auth::{
    csrf::CsrfSigner,
    rate_limit::{RateLimitSettings, RateLimiter},
    service::AuthService,
};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};

/// Tunables for the auth surface. Defaults match production; the CLI
/// overrides them from flags and `EPICENTER_*` environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    frontend_base_url: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    csrf_token_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
    bcrypt_cost: u32,
    rate_limit_window_seconds: u64,
    rate_limit_general_max: u32,
    rate_limit_per_identity_max: u32,
    rate_limit_login_max: u32,
    rate_limit_password_reset_max: u32,
    rate_limit_password_reset_window_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            access_token_ttl_seconds: 900,
            refresh_token_ttl_seconds: 604_800,
            csrf_token_ttl_seconds: 3600,
            reset_token_ttl_seconds: 3600,
            bcrypt_cost: 12,
            rate_limit_window_seconds: 900,
            rate_limit_general_max: 50,
            rate_limit_per_identity_max: 100,
            rate_limit_login_max: 5,
            rate_limit_password_reset_max: 3,
            rate_limit_password_reset_window_seconds: 3600,
        }
    }

    #[must_use]
    pub const fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_csrf_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.csrf_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub const fn with_rate_limit_window_seconds(mut self, seconds: u64) -> Self {
        self.rate_limit_window_seconds = seconds;
        self
    }

    #[must_use]
    pub const fn with_general_rate_limit(mut self, max: u32) -> Self {
        self.rate_limit_general_max = max;
        self
    }

    #[must_use]
    pub const fn with_per_identity_rate_limit(mut self, max: u32) -> Self {
        self.rate_limit_per_identity_max = max;
        self
    }

    #[must_use]
    pub const fn with_login_rate_limit(mut self, max: u32) -> Self {
        self.rate_limit_login_max = max;
        self
    }

    #[must_use]
    pub const fn with_password_reset_rate_limit(mut self, max: u32) -> Self {
        self.rate_limit_password_reset_max = max;
        self
    }

    #[must_use]
    pub const fn with_password_reset_window_seconds(mut self, seconds: u64) -> Self {
        self.rate_limit_password_reset_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub const fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    #[must_use]
    pub const fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    #[must_use]
    pub const fn csrf_token_ttl_seconds(&self) -> i64 {
        self.csrf_token_ttl_seconds
    }

    #[must_use]
    pub const fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub const fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    #[must_use]
    pub const fn rate_limit_settings(&self) -> RateLimitSettings {
        RateLimitSettings {
            window: Duration::from_secs(self.rate_limit_window_seconds),
            general_max: self.rate_limit_general_max,
            per_identity_max: self.rate_limit_per_identity_max,
            login_max: self.rate_limit_login_max,
            password_reset_max: self.rate_limit_password_reset_max,
            password_reset_window: Duration::from_secs(
                self.rate_limit_password_reset_window_seconds,
            ),
        }
    }
}

/// HMAC secrets for the three token families. Kept apart so a leak of one
/// key never signs another family's tokens.
pub struct SigningSecrets {
    pub access: SecretString,
    pub refresh: SecretString,
    pub csrf: SecretString,
}

/// Everything the auth handlers and middleware share, injected as an
/// `Extension<Arc<AuthState>>`.
pub struct AuthState {
    config: AuthConfig,
    service: AuthService,
    csrf: CsrfSigner,
    limiter: Arc<dyn RateLimiter>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        service: AuthService,
        csrf: CsrfSigner,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            config,
            service,
            csrf,
            limiter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn service(&self) -> &AuthService {
        &self.service
    }

    #[must_use]
    pub fn csrf(&self) -> &CsrfSigner {
        &self.csrf
    }

    #[must_use]
    pub fn limiter(&self) -> &dyn RateLimiter {
        &*self.limiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_values() {
        let config = AuthConfig::new("https://epicenter.dev".to_string());
        assert_eq!(config.access_token_ttl_seconds(), 900);
        assert_eq!(config.refresh_token_ttl_seconds(), 604_800);
        assert_eq!(config.csrf_token_ttl_seconds(), 3600);
        assert_eq!(config.reset_token_ttl_seconds(), 3600);
        assert_eq!(config.bcrypt_cost(), 12);

        let limits = config.rate_limit_settings();
        assert_eq!(limits.window, Duration::from_secs(900));
        assert_eq!(limits.general_max, 50);
        assert_eq!(limits.per_identity_max, 100);
        assert_eq!(limits.login_max, 5);
        assert_eq!(limits.password_reset_max, 3);
        assert_eq!(limits.password_reset_window, Duration::from_secs(3600));
    }

    #[test]
    fn builders_override_defaults() {
        let config = AuthConfig::new("http://localhost:3000".to_string())
            .with_access_token_ttl_seconds(60)
            .with_bcrypt_cost(4)
            .with_login_rate_limit(2);
        assert_eq!(config.frontend_base_url(), "http://localhost:3000");
        assert_eq!(config.access_token_ttl_seconds(), 60);
        assert_eq!(config.bcrypt_cost(), 4);
        assert_eq!(config.rate_limit_settings().login_max, 2);
    }
}
