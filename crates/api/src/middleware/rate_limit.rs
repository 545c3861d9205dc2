//! Rate-limiting middleware for unauthenticated endpoints.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use radar_core::fingerprint::{request_fingerprint, FingerprintInput};

use crate::error::AppError;
use crate::rate_limit::RateLimitPolicy;
use crate::state::AppState;

/// Action name for sign-in code requests.
pub const SIGN_IN_ACTION: &str = "sign_in";

/// Cookie holding the browser session id, when one exists.
pub const SESSION_COOKIE: &str = "session";

pub async fn limit_sign_in(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state.rate_limit, SIGN_IN_ACTION, request, next).await
}

/// Run `next` only if `policy` admits another `action` from this caller.
pub async fn enforce(
    policy: &RateLimitPolicy,
    action: &str,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let fingerprint = fingerprint_of(request.headers());
    policy.check(action, &fingerprint).await?;
    Ok(next.run(request).await)
}

/// Fingerprint a request from its `user-agent`, `accept-language` and
/// session cookie. Missing headers count as empty.
pub fn fingerprint_of(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };

    request_fingerprint(&FingerprintInput {
        user_agent: header("user-agent"),
        accept_language: header("accept-language"),
        session_id: session_id(headers),
    })
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
