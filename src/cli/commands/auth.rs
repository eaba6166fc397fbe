use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_secret_args(command);
    let command = with_token_ttl_args(command);
    let command = with_hashing_args(command);
    with_rate_limit_args(command)
}

fn with_secret_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("access-token-secret")
                .long("access-token-secret")
                .help("Signing secret for access tokens")
                .env("EPICENTER_ACCESS_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("refresh-token-secret")
                .long("refresh-token-secret")
                .help("Signing secret for refresh tokens, distinct from the access secret")
                .env("EPICENTER_REFRESH_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("csrf-token-secret")
                .long("csrf-token-secret")
                .help("Signing secret for CSRF tokens")
                .env("EPICENTER_CSRF_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL used as the allowed CORS origin")
                .env("EPICENTER_FRONTEND_BASE_URL")
                .default_value("https://epicenter.dev"),
        )
}

fn with_token_ttl_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("access-token-ttl-seconds")
                .long("access-token-ttl-seconds")
                .help("Access token TTL in seconds")
                .env("EPICENTER_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-token-ttl-seconds")
                .long("refresh-token-ttl-seconds")
                .help("Refresh token TTL in seconds")
                .env("EPICENTER_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("csrf-token-ttl-seconds")
                .long("csrf-token-ttl-seconds")
                .help("CSRF token TTL in seconds")
                .env("EPICENTER_CSRF_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("reset-token-ttl-seconds")
                .long("reset-token-ttl-seconds")
                .help("Password reset token TTL in seconds")
                .env("EPICENTER_RESET_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_hashing_args(command: Command) -> Command {
    command.arg(
        Arg::new("bcrypt-cost")
            .long("bcrypt-cost")
            .help("bcrypt cost factor for password hashing")
            .env("EPICENTER_BCRYPT_COST")
            .default_value("12")
            .value_parser(clap::value_parser!(u32)),
    )
}

fn with_rate_limit_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("rate-limit-window-seconds")
                .long("rate-limit-window-seconds")
                .help("Window for the general, per-identity and login rate limits")
                .env("EPICENTER_RATE_LIMIT_WINDOW_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("general-rate-limit")
                .long("general-rate-limit")
                .help("Requests allowed per window for anonymous clients, keyed by IP")
                .env("EPICENTER_GENERAL_RATE_LIMIT")
                .default_value("50")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("per-identity-rate-limit")
                .long("per-identity-rate-limit")
                .help("Requests allowed per window keyed by {ip}.{bearer token}")
                .env("EPICENTER_PER_IDENTITY_RATE_LIMIT")
                .default_value("100")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("login-rate-limit")
                .long("login-rate-limit")
                .help("Failed login attempts allowed per window per IP")
                .env("EPICENTER_LOGIN_RATE_LIMIT")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("password-reset-rate-limit")
                .long("password-reset-rate-limit")
                .help("Password reset requests allowed per reset window per IP")
                .env("EPICENTER_PASSWORD_RESET_RATE_LIMIT")
                .default_value("3")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("password-reset-window-seconds")
                .long("password-reset-window-seconds")
                .help("Window for the password reset rate limit")
                .env("EPICENTER_PASSWORD_RESET_WINDOW_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
}
