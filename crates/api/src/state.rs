use std::sync::Arc;

use radar_events::{BatchProcessor, MailQueue};

use crate::config::ServerConfig;
use crate::rate_limit::RateLimitPolicy;

/// Queue plus sender address for mails the API sends itself.
#[derive(Clone)]
pub struct OutboundMail {
    pub queue: MailQueue,
    /// `From` header value.
    pub from: String,
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: radar_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Alert matching and notification pipeline for ingested batches.
    pub processor: Arc<BatchProcessor>,
    pub rate_limit: Arc<RateLimitPolicy>,
    /// `None` when SMTP is not configured.
    pub mail: Option<OutboundMail>,
}
