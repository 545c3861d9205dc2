//! Availability alert rules and the envelopes produced when they match.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::availability::{AvailabilityChange, AvailabilityEvent};
use crate::types::{DbId, ExternalId, Timestamp};

/// Which transitions an alert fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerOn {
    Available,
    Unavailable,
    Both,
}

impl TriggerOn {
    /// Whether an event of the given direction satisfies this setting.
    pub fn accepts(self, event: AvailabilityEvent) -> bool {
        match self {
            TriggerOn::Both => true,
            TriggerOn::Available => event == AvailabilityEvent::Available,
            TriggerOn::Unavailable => event == AvailabilityEvent::Unavailable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerOn::Available => "available",
            TriggerOn::Unavailable => "unavailable",
            TriggerOn::Both => "both",
        }
    }
}

impl FromStr for TriggerOn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(TriggerOn::Available),
            "unavailable" => Ok(TriggerOn::Unavailable),
            "both" => Ok(TriggerOn::Both),
            other => Err(format!("unknown trigger setting '{other}'")),
        }
    }
}

/// A user-defined alert rule.
///
/// Owned by the alert management API; the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRule {
    pub id: DbId,
    pub owner_user_id: DbId,
    pub name: String,
    pub resource_type_ids: BTreeSet<ExternalId>,
    pub location_ids: BTreeSet<ExternalId>,
    pub trigger_on: TriggerOn,
    pub email_enabled: bool,
    pub chat_enabled: bool,
    pub created_at: Timestamp,
}

impl AlertRule {
    /// Whether `change` satisfies this rule.
    pub fn matches(&self, change: &AvailabilityChange) -> bool {
        self.resource_type_ids.contains(&change.resource_type_id)
            && self.location_ids.contains(&change.location_id)
            && self.trigger_on.accepts(change.event_type)
    }
}

/// One matched (change, rule) pair, carried from matching to aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEnvelope {
    pub owner_user_id: DbId,
    pub alert_id: DbId,
    pub alert_name: String,
    pub change: AvailabilityChange,
    pub email_enabled: bool,
    pub chat_enabled: bool,
}

impl NotificationEnvelope {
    pub fn new(rule: &AlertRule, change: &AvailabilityChange) -> Self {
        Self {
            owner_user_id: rule.owner_user_id,
            alert_id: rule.id,
            alert_name: rule.name.clone(),
            change: change.clone(),
            email_enabled: rule.email_enabled,
            chat_enabled: rule.chat_enabled,
        }
    }
}
