pub mod auth;
pub mod health;
pub mod ingest;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /internal/availability-changes      POST  ingest a detector batch (x-auth-key)
/// /auth/sign-in-code                  POST  request a sign-in code (rate limited)
/// /auth/sign-in                       POST  redeem a sign-in code (rate limited)
/// ```
///
/// `state` is needed up front by the rate-limiting middleware.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/internal", ingest::router())
        .nest("/auth", auth::router(state))
}
