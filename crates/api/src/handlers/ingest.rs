//! Handler for detector batches.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use radar_events::IngestBatch;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::ingest_auth::IngestCredential;
use crate::state::AppState;

/// Response for an accepted batch.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    /// Number of changes in the batch.
    pub processed: usize,
    /// Number of matches recorded and handed to delivery.
    pub notifications: usize,
}

/// POST /api/v1/internal/availability-changes
///
/// Runs the batch through the alert pipeline. The pipeline runs on its own
/// task, so a client disconnect or request timeout does not abandon it
/// half-way through.
pub async fn ingest_changes(
    _credential: IngestCredential,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<IngestResponse>> {
    let batch: IngestBatch = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?;

    let processor = state.processor.clone();
    let summary = tokio::spawn(async move { processor.process(&batch).await })
        .await
        .map_err(|e| AppError::InternalError(format!("Batch task failed: {e}")))??;

    tracing::info!(
        processed = summary.processed,
        matched = summary.matched,
        notifications = summary.notifications,
        sent = summary.report.sent(),
        failed = summary.report.failed(),
        "Availability batch processed"
    );

    Ok(Json(IngestResponse {
        success: true,
        processed: summary.processed,
        notifications: summary.notifications,
    }))
}
