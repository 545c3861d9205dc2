//! Publishing detected changes: analytics data points and the relay.
//!
//! The two outputs are independent. Either may be disabled, and a failure
//! in one is logged without affecting the other or the detection loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use radar_core::availability::{AvailabilityChange, AvailabilityEvent};
use serde::Serialize;

use crate::relay::{ChangeRelay, RelayBatch};
use crate::snapshot::Catalog;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Analytics endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

/// One analytics row per change.
///
/// `blobs`: type id, location id, event, type name, location name.
/// `doubles`: available flag (1/0), cores, memory.
/// `indexes`: type name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub blobs: Vec<String>,
    pub doubles: Vec<f64>,
    pub indexes: Vec<String>,
}

impl DataPoint {
    /// Types missing from `catalog` report zero cores and memory.
    pub fn for_change(change: &AvailabilityChange, catalog: &Catalog) -> Self {
        let server_type = catalog.server_type(change.resource_type_id);
        let available = match change.event_type {
            AvailabilityEvent::Available => 1.0,
            AvailabilityEvent::Unavailable => 0.0,
        };

        Self {
            blobs: vec![
                change.resource_type_id.to_string(),
                change.location_id.to_string(),
                change.event_type.as_str().to_string(),
                change.resource_type_name.clone(),
                change.location_name.clone(),
            ],
            doubles: vec![
                available,
                server_type.map_or(0.0, |st| f64::from(st.cores)),
                server_type.map_or(0.0, |st| st.memory),
            ],
            indexes: vec![change.resource_type_name.clone()],
        }
    }
}

#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn write(&self, points: &[DataPoint]) -> Result<(), AnalyticsError>;
}

/// Posts `{"dataPoints": [...]}` to an analytics collector.
pub struct HttpAnalyticsSink {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpAnalyticsSink {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self, AnalyticsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }
}

#[async_trait]
impl AnalyticsSink for HttpAnalyticsSink {
    async fn write(&self, points: &[DataPoint]) -> Result<(), AnalyticsError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "dataPoints": points }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AnalyticsError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// How one output fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Done,
    Failed,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub analytics: PublishOutcome,
    pub relay: PublishOutcome,
}

#[derive(Default, Clone)]
pub struct TelemetrySink {
    analytics: Option<Arc<dyn AnalyticsSink>>,
    relay: Option<Arc<dyn ChangeRelay>>,
}

impl TelemetrySink {
    pub fn new(
        analytics: Option<Arc<dyn AnalyticsSink>>,
        relay: Option<Arc<dyn ChangeRelay>>,
    ) -> Self {
        Self { analytics, relay }
    }

    /// Write analytics and relay the batch concurrently.
    pub async fn publish(&self, changes: &[AvailabilityChange], catalog: &Catalog) -> PublishReport {
        if changes.is_empty() {
            return PublishReport {
                analytics: PublishOutcome::Disabled,
                relay: PublishOutcome::Disabled,
            };
        }

        let (analytics, relay) = tokio::join!(
            self.write_analytics(changes, catalog),
            self.relay_batch(changes)
        );
        PublishReport { analytics, relay }
    }

    async fn write_analytics(&self, changes: &[AvailabilityChange], catalog: &Catalog) -> PublishOutcome {
        let Some(sink) = &self.analytics else {
            return PublishOutcome::Disabled;
        };

        let points: Vec<DataPoint> = changes
            .iter()
            .map(|change| DataPoint::for_change(change, catalog))
            .collect();

        match sink.write(&points).await {
            Ok(()) => {
                tracing::debug!(points = points.len(), "Wrote analytics data points");
                PublishOutcome::Done
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to write analytics data points");
                PublishOutcome::Failed
            }
        }
    }

    async fn relay_batch(&self, changes: &[AvailabilityChange]) -> PublishOutcome {
        let Some(relay) = &self.relay else {
            return PublishOutcome::Disabled;
        };

        let batch = RelayBatch::new(changes.to_vec());
        match relay.relay(&batch).await {
            Ok(()) => {
                tracing::info!(batch_id = %batch.batch_id, changes = changes.len(), "Relayed changes");
                PublishOutcome::Done
            }
            Err(e) => {
                tracing::error!(batch_id = %batch.batch_id, error = %e, "Failed to relay changes");
                PublishOutcome::Failed
            }
        }
    }
}
