//! Availability change events produced by the detector.

use serde::{Deserialize, Serialize};

use crate::types::ExternalId;

/// Direction of an availability transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityEvent {
    Available,
    Unavailable,
}

impl AvailabilityEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            AvailabilityEvent::Available => "available",
            AvailabilityEvent::Unavailable => "unavailable",
        }
    }

    /// Human readable verb phrase used in digests.
    pub fn describe(self) -> &'static str {
        match self {
            AvailabilityEvent::Available => "is now available",
            AvailabilityEvent::Unavailable => "is no longer available",
        }
    }
}

impl std::fmt::Display for AvailabilityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AvailabilityEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(AvailabilityEvent::Available),
            "unavailable" => Ok(AvailabilityEvent::Unavailable),
            other => Err(format!("unknown availability event '{other}'")),
        }
    }
}

/// A single resource type changing availability in a single location.
///
/// Only ever travels inside a batch; the core never stores it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityChange {
    pub resource_type_id: ExternalId,
    pub resource_type_name: String,
    pub location_id: ExternalId,
    pub location_name: String,
    pub event_type: AvailabilityEvent,
    /// Detection time in epoch milliseconds.
    pub timestamp: i64,
}
