//! Folding raw catalog reads into snapshots and diffing them.

use std::collections::{BTreeMap, BTreeSet};

use radar_core::availability::{AvailabilityChange, AvailabilityEvent};
use radar_core::types::ExternalId;

use crate::source::RawCatalog;

/// Location id -> ids of resource types available there.
pub type AvailabilityMatrix = BTreeMap<ExternalId, BTreeSet<ExternalId>>;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerTypeInfo {
    pub id: ExternalId,
    pub name: String,
    pub cores: u32,
    pub memory: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationInfo {
    pub id: ExternalId,
    pub name: String,
}

/// Names and facts needed to describe a change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub server_types: BTreeMap<ExternalId, ServerTypeInfo>,
    pub locations: BTreeMap<ExternalId, LocationInfo>,
}

impl Catalog {
    pub fn server_type(&self, id: ExternalId) -> Option<&ServerTypeInfo> {
        self.server_types.get(&id)
    }
}

/// The provider catalog at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub catalog: Catalog,
    pub availability: AvailabilityMatrix,
}

impl Snapshot {
    /// Fold datacenters into per-location sets. Several datacenters in the
    /// same location contribute the union of their server types.
    pub fn from_raw(raw: &RawCatalog) -> Self {
        let server_types = raw
            .server_types
            .iter()
            .map(|st| {
                (
                    st.id,
                    ServerTypeInfo {
                        id: st.id,
                        name: st.name.clone(),
                        cores: st.cores,
                        memory: st.memory,
                    },
                )
            })
            .collect();

        let mut locations = BTreeMap::new();
        let mut availability = AvailabilityMatrix::new();

        for dc in &raw.datacenters {
            let location_id = dc.location.id;
            locations.entry(location_id).or_insert_with(|| LocationInfo {
                id: location_id,
                name: dc.location.name.clone(),
            });
            availability
                .entry(location_id)
                .or_default()
                .extend(dc.server_types.available.iter().copied());
        }

        Self {
            catalog: Catalog {
                server_types,
                locations,
            },
            availability,
        }
    }

    pub fn available_pairs(&self) -> usize {
        self.availability.values().map(BTreeSet::len).sum()
    }
}

/// Changes between `previous` availability and `current`.
///
/// Only locations present in `current` are compared. Ids missing from the
/// current catalog are skipped since they cannot be named. Within a location,
/// newly available types come first, then newly unavailable ones, each in
/// ascending id order.
pub fn diff(
    previous: &AvailabilityMatrix,
    current: &Snapshot,
    timestamp_ms: i64,
) -> Vec<AvailabilityChange> {
    let empty = BTreeSet::new();
    let mut changes = Vec::new();

    for (&location_id, now_available) in &current.availability {
        let Some(location) = current.catalog.locations.get(&location_id) else {
            continue;
        };
        let before = previous.get(&location_id).unwrap_or(&empty);

        let appeared = now_available
            .difference(before)
            .map(|id| (*id, AvailabilityEvent::Available));
        let vanished = before
            .difference(now_available)
            .map(|id| (*id, AvailabilityEvent::Unavailable));

        for (type_id, event_type) in appeared.chain(vanished) {
            let Some(server_type) = current.catalog.server_type(type_id) else {
                tracing::debug!(type_id, location_id, "Unknown server type in diff, skipping");
                continue;
            };
            changes.push(AvailabilityChange {
                resource_type_id: type_id,
                resource_type_name: server_type.name.clone(),
                location_id,
                location_name: location.name.clone(),
                event_type,
                timestamp: timestamp_ms,
            });
        }
    }

    changes
}
