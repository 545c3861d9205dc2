//! Repository for the `availability_alerts` table.

use radar_core::alert::AlertRule;
use sqlx::PgPool;

use crate::models::alert::AvailabilityAlert;

/// Column list for `availability_alerts` queries.
const COLUMNS: &str = "id, user_id, name, resource_type_ids, location_ids, trigger_on, \
                       email_notifications, chat_notifications, created_at";

/// Read access to alert rules. Creation and editing live in the alert
/// management API.
pub struct AlertRepo;

impl AlertRepo {
    /// Every active alert, oldest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<AlertRule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM availability_alerts ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, AvailabilityAlert>(&query)
            .fetch_all(pool)
            .await?;

        rows.into_iter()
            .map(|row| AlertRule::try_from(row).map_err(|e| sqlx::Error::Decode(e.into())))
            .collect()
    }
}
