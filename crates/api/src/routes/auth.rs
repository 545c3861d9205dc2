use axum::routing::post;
use axum::{middleware, Router};

use crate::handlers::sign_in;
use crate::middleware::rate_limit::limit_sign_in;
use crate::state::AppState;

/// Routes mounted at `/api/v1/auth`. Both share one rate-limit budget per
/// caller.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sign-in-code", post(sign_in::request_sign_in_code))
        .route("/sign-in", post(sign_in::redeem_sign_in_code))
        .route_layer(middleware::from_fn_with_state(state, limit_sign_in))
}
