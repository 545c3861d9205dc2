//! Availability alert rows.

use radar_core::alert::{AlertRule, TriggerOn};
use radar_core::types::{DbId, ExternalId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `availability_alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AvailabilityAlert {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub resource_type_ids: Vec<ExternalId>,
    pub location_ids: Vec<ExternalId>,
    pub trigger_on: String,
    pub email_notifications: bool,
    pub chat_notifications: bool,
    pub created_at: Timestamp,
}

impl TryFrom<AvailabilityAlert> for AlertRule {
    type Error = String;

    fn try_from(row: AvailabilityAlert) -> Result<Self, Self::Error> {
        let trigger_on: TriggerOn = row.trigger_on.parse()?;
        Ok(AlertRule {
            id: row.id,
            owner_user_id: row.user_id,
            name: row.name,
            resource_type_ids: row.resource_type_ids.into_iter().collect(),
            location_ids: row.location_ids.into_iter().collect(),
            trigger_on,
            email_enabled: row.email_notifications,
            chat_enabled: row.chat_notifications,
            created_at: row.created_at,
        })
    }
}
