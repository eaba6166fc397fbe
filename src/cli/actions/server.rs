use crate::{
    api,
    api::handlers::auth::{AuthConfig, SigningSecrets},
    cli::actions::Action,
};
use anyhow::Result;
use secrecy::SecretString;

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub access_token_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub csrf_token_secret: SecretString,
    pub frontend_base_url: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub csrf_token_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub bcrypt_cost: u32,
    pub rate_limit_window_seconds: u64,
    pub general_rate_limit: u32,
    pub per_identity_rate_limit: u32,
    pub login_rate_limit: u32,
    pub password_reset_rate_limit: u32,
    pub password_reset_window_seconds: u64,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &self.dsn)
            .field("access_token_secret", &"***")
            .field("refresh_token_secret", &"***")
            .field("csrf_token_secret", &"***")
            .field("frontend_base_url", &self.frontend_base_url)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("csrf_token_ttl_seconds", &self.csrf_token_ttl_seconds)
            .field("reset_token_ttl_seconds", &self.reset_token_ttl_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

/// Handle the server action
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server(args) = action;

    let auth_config = AuthConfig::new(args.frontend_base_url)
        .with_access_token_ttl_seconds(args.access_token_ttl_seconds)
        .with_refresh_token_ttl_seconds(args.refresh_token_ttl_seconds)
        .with_csrf_token_ttl_seconds(args.csrf_token_ttl_seconds)
        .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds)
        .with_bcrypt_cost(args.bcrypt_cost)
        .with_rate_limit_window_seconds(args.rate_limit_window_seconds)
        .with_general_rate_limit(args.general_rate_limit)
        .with_per_identity_rate_limit(args.per_identity_rate_limit)
        .with_login_rate_limit(args.login_rate_limit)
        .with_password_reset_rate_limit(args.password_reset_rate_limit)
        .with_password_reset_window_seconds(args.password_reset_window_seconds);

    let secrets = SigningSecrets {
        access: args.access_token_secret,
        refresh: args.refresh_token_secret,
        csrf: args.csrf_token_secret,
    };

    api::new(args.port, args.dsn, auth_config, secrets).await?;

    Ok(())
}
