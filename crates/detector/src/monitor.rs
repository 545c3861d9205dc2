//! The polling loop.

use std::sync::Arc;
use std::time::Duration;

use radar_core::availability::AvailabilityChange;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::snapshot::{diff, AvailabilityMatrix, Snapshot};
use crate::source::{AvailabilitySource, SourceError};
use crate::telemetry::TelemetrySink;

/// Polls an [`AvailabilitySource`] and publishes the changes between
/// consecutive successful reads.
pub struct Monitor {
    source: Arc<dyn AvailabilitySource>,
    telemetry: TelemetrySink,
    interval: Duration,
    previous: Option<AvailabilityMatrix>,
}

impl Monitor {
    pub fn new(source: Arc<dyn AvailabilitySource>, telemetry: TelemetrySink, interval: Duration) -> Self {
        Self {
            source,
            telemetry,
            interval,
            previous: None,
        }
    }

    /// Poll once.
    ///
    /// The first successful read only establishes the baseline and yields no
    /// changes. A failed read leaves the baseline untouched, so the next
    /// successful read is compared against the last good one.
    pub async fn tick(&mut self) -> Result<Vec<AvailabilityChange>, SourceError> {
        let raw = self.source.fetch().await?;
        let snapshot = Snapshot::from_raw(&raw);

        let changes = match &self.previous {
            Some(previous) => diff(previous, &snapshot, chrono::Utc::now().timestamp_millis()),
            None => {
                tracing::info!(
                    locations = snapshot.availability.len(),
                    available = snapshot.available_pairs(),
                    "Baseline snapshot recorded"
                );
                Vec::new()
            }
        };

        if !changes.is_empty() {
            tracing::info!(changes = changes.len(), "Availability changes detected");
            self.telemetry.publish(&changes, &snapshot.catalog).await;
        }

        self.previous = Some(snapshot.availability);
        Ok(changes)
    }

    /// Poll on a fixed interval until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Monitor cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "Failed to fetch availability");
                    }
                }
            }
        }
    }
}
