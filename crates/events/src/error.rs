/// Failure that aborts the remainder of a batch.
///
/// Delivery problems never surface here; they are isolated per user and
/// channel by the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The rule, trigger or user store failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}
