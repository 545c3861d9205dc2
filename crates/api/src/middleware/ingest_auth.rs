//! Shared-secret authentication for the internal ingestion endpoint.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use radar_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the ingestion key.
pub const AUTH_KEY_HEADER: &str = "x-auth-key";

/// Proof that the caller presented the ingestion key, either as
/// `x-auth-key: <key>` or `Authorization: Bearer <key>`.
///
/// Always granted in development. Outside development a server without a
/// configured key rejects every call.
#[derive(Debug, Clone, Copy)]
pub struct IngestCredential;

impl FromRequestParts<AppState> for IngestCredential {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.config.environment.is_development() {
            return Ok(IngestCredential);
        }

        let Some(expected) = state.config.ingest_api_key.as_deref() else {
            tracing::warn!("INGEST_API_KEY is not set, rejecting ingestion call");
            return Err(unauthorized());
        };

        match presented_key(&parts.headers) {
            Some(key) if keys_match(key, expected) => Ok(IngestCredential),
            _ => Err(unauthorized()),
        }
    }
}

fn unauthorized() -> AppError {
    AppError::Core(CoreError::Unauthorized("Unauthorized".into()))
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(AUTH_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Compare without short-circuiting on the first differing byte.
fn keys_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
