//! Forwarding detected changes to the alert pipeline.

use std::time::Duration;

use async_trait::async_trait;
use radar_core::availability::AvailabilityChange;
use serde::Serialize;

/// HTTP timeout for one relay call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Ingestion endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

/// Request body of the ingestion endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayBatch {
    pub changes: Vec<AvailabilityChange>,
    /// Fresh per detection round; lets the receiver drop re-deliveries.
    pub batch_id: String,
}

impl RelayBatch {
    pub fn new(changes: Vec<AvailabilityChange>) -> Self {
        Self {
            changes,
            batch_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[async_trait]
pub trait ChangeRelay: Send + Sync {
    async fn relay(&self, batch: &RelayBatch) -> Result<(), RelayError>;
}

/// Posts batches to the ingestion endpoint with the shared key, sent both
/// as a Bearer token and as `x-auth-key`. One attempt per batch.
pub struct RelayClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl RelayClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ChangeRelay for RelayClient {
    async fn relay(&self, batch: &RelayBatch) -> Result<(), RelayError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("x-auth-key", &self.api_key)
            .json(batch)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RelayError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
