//! Router-wide middleware: request quotas and the CSRF guard.

use crate::api::handlers::auth::{
    csrf::CSRF_HEADER,
    error::AuthError,
    rate_limit::RateLimitPolicy,
    state::AuthState,
    utils::{client_key, extract_bearer_token},
};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{net::SocketAddr, sync::Arc};
use tracing::warn;

fn client_ip(request: &Request) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    client_key(request.headers(), peer)
}

/// Meter every request against the general per-IP quota and, when a bearer
/// token accompanies the request, against a per-identity quota keyed on IP
/// plus token. Without a bearer token the identity key degrades to the IP
/// alone, so anonymous callers cannot dodge the quota by rotating headers.
pub async fn enforce_request_quota(
    State(state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    if state
        .limiter()
        .hit(RateLimitPolicy::General, &ip)
        .is_limited()
    {
        return AuthError::RateLimited(RateLimitPolicy::General.message().to_string())
            .into_response();
    }

    let identity = match extract_bearer_token(request.headers()) {
        Some(token) => format!("{ip}.{token}"),
        None => ip,
    };
    if state
        .limiter()
        .hit(RateLimitPolicy::PerIdentity, &identity)
        .is_limited()
    {
        return AuthError::RateLimited(RateLimitPolicy::PerIdentity.message().to_string())
            .into_response();
    }

    next.run(request).await
}

/// Demand a CSRF token on state-changing requests.
///
/// Safe methods pass through, as do requests authenticated with a valid
/// bearer token, which cross-site attackers cannot attach. Everything else
/// must present a verifiable `X-CSRF-Token` header.
pub async fn verify_csrf_token(
    State(state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let safe_method = matches!(
        *request.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    );
    if safe_method {
        return next.run(request).await;
    }

    if let Some(bearer) = extract_bearer_token(request.headers()) {
        if state.service().tokens().verify_access(&bearer).is_ok() {
            return next.run(request).await;
        }
    }

    let presented = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());
    match presented {
        Some(token) if state.csrf().verify(token).is_some() => next.run(request).await,
        _ => AuthError::CsrfValidationFailed.into_response(),
    }
}

/// Attach a fresh CSRF token to every response, bound to the caller when a
/// valid bearer token is present.
pub async fn issue_csrf_token(
    State(state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let user_id = extract_bearer_token(request.headers())
        .and_then(|bearer| state.service().tokens().verify_access(&bearer).ok())
        .map(|claims| claims.sub);

    let mut response = next.run(request).await;
    match state.csrf().issue(user_id) {
        Ok(token) => {
            if let Ok(value) = HeaderValue::from_str(&token) {
                response.headers_mut().insert(CSRF_HEADER, value);
            }
        }
        Err(error) => warn!("could not mint csrf token: {error}"),
    }
    response
}
