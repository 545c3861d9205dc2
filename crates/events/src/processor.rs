//! End-to-end handling of one ingested batch.

use std::sync::Arc;

use radar_core::availability::AvailabilityChange;
use radar_core::matching::match_changes;
use serde::Deserialize;

use crate::aggregator::NotificationAggregator;
use crate::dispatcher::{ChannelDispatcher, DispatchReport};
use crate::error::PipelineError;
use crate::recorder::TriggerRecorder;
use crate::store::{AlertStore, TriggerStore, UserDirectory};

/// A batch of changes as posted by the detector.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestBatch {
    /// Idempotency key. Replaying a batch with the same id records and
    /// notifies nothing new.
    #[serde(default)]
    pub batch_id: Option<String>,
    pub changes: Vec<AvailabilityChange>,
}

/// What happened to a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of changes in the batch.
    pub processed: usize,
    /// Number of (change, rule) matches.
    pub matched: usize,
    /// Matches newly recorded and handed to aggregation.
    pub notifications: usize,
    pub report: DispatchReport,
}

pub struct BatchProcessor {
    alerts: Arc<dyn AlertStore>,
    recorder: TriggerRecorder,
    aggregator: NotificationAggregator,
    dispatcher: ChannelDispatcher,
}

impl BatchProcessor {
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        triggers: Arc<dyn TriggerStore>,
        users: Arc<dyn UserDirectory>,
        dispatcher: ChannelDispatcher,
    ) -> Self {
        Self {
            alerts,
            recorder: TriggerRecorder::new(triggers),
            aggregator: NotificationAggregator::new(users),
            dispatcher,
        }
    }

    /// Match, record, aggregate and dispatch one batch.
    ///
    /// Every match is recorded before any notification is attempted; a
    /// persistence error aborts the batch before dispatch. Delivery failures
    /// never fail the batch, they only show up in the report.
    pub async fn process(&self, batch: &IngestBatch) -> Result<BatchSummary, PipelineError> {
        if batch.changes.is_empty() {
            tracing::debug!("Empty batch, nothing to do");
            return Ok(BatchSummary::default());
        }

        let rules = self.alerts.list_active().await?;
        let envelopes = match_changes(&batch.changes, &rules);
        let matched = envelopes.len();

        tracing::info!(
            batch_id = batch.batch_id.as_deref(),
            changes = batch.changes.len(),
            rules = rules.len(),
            matched,
            "Matched availability batch"
        );

        let recorded = self
            .recorder
            .record_all(batch.batch_id.as_deref(), envelopes)
            .await?;
        let digests = self.aggregator.aggregate(&recorded).await?;
        let report = self.dispatcher.dispatch(digests).await;

        Ok(BatchSummary {
            processed: batch.changes.len(),
            matched,
            notifications: recorded.len(),
            report,
        })
    }
}
