use axum::routing::post;
use axum::Router;

use crate::handlers::ingest;
use crate::state::AppState;

/// Routes mounted at `/api/v1/internal`.
pub fn router() -> Router<AppState> {
    Router::new().route("/availability-changes", post(ingest::ingest_changes))
}
