//! Repository for the append-only `alert_triggers` table.

use radar_core::types::DbId;
use sqlx::PgPool;

use crate::models::trigger::NewAlertTrigger;

/// Provides inserts into the trigger audit trail.
pub struct TriggerRepo;

impl TriggerRepo {
    /// Record a match, returning the new row id.
    ///
    /// Returns `None` when a row for the same batch id and match already
    /// exists (`uq_alert_triggers_batch_pair`). Rows without a batch id never
    /// conflict.
    pub async fn insert(
        pool: &PgPool,
        trigger: &NewAlertTrigger<'_>,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO alert_triggers \
             (batch_id, alert_id, user_id, resource_type_id, resource_type_name, \
              location_id, location_name, event_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT ON CONSTRAINT uq_alert_triggers_batch_pair DO NOTHING \
             RETURNING id",
        )
        .bind(trigger.batch_id)
        .bind(trigger.alert_id)
        .bind(trigger.user_id)
        .bind(trigger.resource_type_id)
        .bind(trigger.resource_type_name)
        .bind(trigger.location_id)
        .bind(trigger.location_name)
        .bind(trigger.event_type)
        .fetch_optional(pool)
        .await
    }
}
