//! Alert trigger audit rows.

use radar_core::alert::NotificationEnvelope;
use radar_core::types::{DbId, ExternalId};

/// DTO for recording a single match into `alert_triggers`.
#[derive(Debug, Clone)]
pub struct NewAlertTrigger<'a> {
    pub batch_id: Option<&'a str>,
    pub alert_id: DbId,
    pub user_id: DbId,
    pub resource_type_id: ExternalId,
    pub resource_type_name: &'a str,
    pub location_id: ExternalId,
    pub location_name: &'a str,
    pub event_type: &'static str,
}

impl<'a> NewAlertTrigger<'a> {
    pub fn from_envelope(batch_id: Option<&'a str>, envelope: &'a NotificationEnvelope) -> Self {
        Self {
            batch_id,
            alert_id: envelope.alert_id,
            user_id: envelope.owner_user_id,
            resource_type_id: envelope.change.resource_type_id,
            resource_type_name: &envelope.change.resource_type_name,
            location_id: envelope.change.location_id,
            location_name: &envelope.change.location_name,
            event_type: envelope.change.event_type.as_str(),
        }
    }
}
