//! Trigger audit recording.

use std::sync::Arc;

use radar_core::alert::NotificationEnvelope;

use crate::store::TriggerStore;

/// Writes one audit row per match before anything is delivered.
pub struct TriggerRecorder {
    store: Arc<dyn TriggerStore>,
}

impl TriggerRecorder {
    pub fn new(store: Arc<dyn TriggerStore>) -> Self {
        Self { store }
    }

    /// Record every envelope, one awaited insert at a time.
    ///
    /// Returns the envelopes that produced a new audit row; matches already
    /// recorded under the same `batch_id` are dropped so they are not
    /// notified twice. The first store error aborts the loop, leaving any
    /// rows written so far in place.
    pub async fn record_all(
        &self,
        batch_id: Option<&str>,
        envelopes: Vec<NotificationEnvelope>,
    ) -> Result<Vec<NotificationEnvelope>, sqlx::Error> {
        let mut recorded = Vec::with_capacity(envelopes.len());

        for envelope in envelopes {
            if self.store.record(batch_id, &envelope).await? {
                recorded.push(envelope);
            } else {
                tracing::info!(
                    batch_id,
                    alert_id = envelope.alert_id,
                    resource_type_id = envelope.change.resource_type_id,
                    location_id = envelope.change.location_id,
                    "Trigger already recorded for batch, skipping"
                );
            }
        }

        Ok(recorded)
    }
}
