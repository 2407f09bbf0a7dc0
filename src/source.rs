use std::collections::HashSet;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, is_valid_port_code};
use crate::error::{SnapshotError, SourceError};
use crate::model::{
    ConsolidationGroup, GroupKey, LaneType, Port, PortRegion, RegionMembership, Shipment,
};

/// Read side of the remote store. Thin reads only: no retry, backoff, or
/// pagination. A failed call is surfaced to the caller as-is.
pub trait GroupSource {
    fn groups(
        &self,
        lane_type: LaneType,
        outlook_days: u32,
    ) -> Result<Vec<ConsolidationGroup>, SourceError>;

    /// Shipments behind one lane, or behind a persisted custom group when
    /// `custom_group_id` is given (the port arguments are ignored then).
    fn shipments(
        &self,
        origin_port_id: &str,
        destination_port_id: &str,
        outlook_days: u32,
        custom_group_id: Option<&str>,
    ) -> Result<Vec<Shipment>, SourceError>;

    fn regions(&self) -> Result<Vec<PortRegion>, SourceError>;

    fn region_memberships(&self) -> Result<Vec<RegionMembership>, SourceError>;
}

/// Optional persisted merge store. Writers pass the version they read; a
/// stale writer gets `VersionConflict` instead of silently losing a
/// concurrent merge or break-apart.
pub trait ConsolidationStore {
    fn version(&self) -> u64;

    fn create_custom(
        &mut self,
        origin_region_id: &str,
        destination_region_id: &str,
        member_keys: &[GroupKey],
        expected_version: u64,
    ) -> Result<String, SourceError>;

    fn delete_custom(&mut self, custom_id: &str, expected_version: u64)
    -> Result<(), SourceError>;
}

/// One self-contained export of the remote tables, already scoped to a
/// single lane. Either pre-aggregated `groups` or raw `shipments` (or both;
/// groups win when present).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub regions: Vec<PortRegion>,
    #[serde(default)]
    pub memberships: Vec<RegionMembership>,
    #[serde(default)]
    pub shipments: Vec<Shipment>,
    #[serde(default)]
    pub groups: Vec<ConsolidationGroup>,
}

impl Snapshot {
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(raw)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        for port in &self.ports {
            if !is_valid_port_code(&port.code) {
                return Err(SnapshotError::InvalidPortCode {
                    port_id: port.id.clone(),
                    code: port.code.clone(),
                });
            }
        }
        let port_ids: HashSet<&str> = self.ports.iter().map(|p| p.id.as_str()).collect();
        for shipment in &self.shipments {
            for port_id in [&shipment.origin_port_id, &shipment.destination_port_id] {
                if !port_ids.contains(port_id.as_str()) {
                    return Err(SnapshotError::DanglingPort {
                        shipment_id: shipment.id.clone(),
                        port_id: port_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConsolidation {
    pub id: String,
    pub origin_region_id: String,
    pub destination_region_id: String,
    pub member_keys: Vec<GroupKey>,
}

/// In-memory collaborator backed by a snapshot document. Used by the CLI,
/// the test suites, and hosts that already hold the data client-side.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    snapshot: Snapshot,
    user_id: Option<String>,
    stored: Vec<StoredConsolidation>,
    version: u64,
    next_stored_id: u64,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot, user_id: Option<String>) -> Self {
        Self {
            snapshot,
            user_id,
            stored: Vec::new(),
            version: 0,
            next_stored_id: 1,
        }
    }

    pub fn stored(&self) -> &[StoredConsolidation] {
        &self.stored
    }
}

impl GroupSource for SnapshotSource {
    // A snapshot is already scoped to one lane; the lane argument only
    // matters to remote implementations that filter server-side.
    fn groups(
        &self,
        _lane_type: LaneType,
        outlook_days: u32,
    ) -> Result<Vec<ConsolidationGroup>, SourceError> {
        if !self.snapshot.groups.is_empty() {
            return Ok(self.snapshot.groups.clone());
        }
        Ok(aggregate::aggregate_shipments(
            &self.snapshot.shipments,
            &self.snapshot.ports,
            outlook_days,
            self.user_id.as_deref(),
        ))
    }

    fn shipments(
        &self,
        origin_port_id: &str,
        destination_port_id: &str,
        outlook_days: u32,
        custom_group_id: Option<&str>,
    ) -> Result<Vec<Shipment>, SourceError> {
        let in_window = |s: &Shipment| {
            s.move_offset_days >= 0 && s.move_offset_days as u32 <= outlook_days
        };
        if let Some(custom_group_id) = custom_group_id {
            let stored = self
                .stored
                .iter()
                .find(|c| c.id == custom_group_id)
                .ok_or_else(|| {
                    SourceError::UnknownGroup(GroupKey(custom_group_id.to_string()))
                })?;
            return Ok(self
                .snapshot
                .shipments
                .iter()
                .filter(|s| {
                    in_window(s)
                        && stored.member_keys.contains(&GroupKey::of_ports(
                            &s.origin_port_id,
                            &s.destination_port_id,
                        ))
                })
                .cloned()
                .collect());
        }
        Ok(self
            .snapshot
            .shipments
            .iter()
            .filter(|s| {
                s.origin_port_id == origin_port_id
                    && s.destination_port_id == destination_port_id
                    && in_window(s)
            })
            .cloned()
            .collect())
    }

    fn regions(&self) -> Result<Vec<PortRegion>, SourceError> {
        Ok(self.snapshot.regions.clone())
    }

    fn region_memberships(&self) -> Result<Vec<RegionMembership>, SourceError> {
        Ok(self.snapshot.memberships.clone())
    }
}

impl ConsolidationStore for SnapshotSource {
    fn version(&self) -> u64 {
        self.version
    }

    fn create_custom(
        &mut self,
        origin_region_id: &str,
        destination_region_id: &str,
        member_keys: &[GroupKey],
        expected_version: u64,
    ) -> Result<String, SourceError> {
        if expected_version != self.version {
            return Err(SourceError::VersionConflict {
                expected: expected_version,
                actual: self.version,
            });
        }
        let id = format!("cc-{}", self.next_stored_id);
        self.next_stored_id += 1;
        self.stored.push(StoredConsolidation {
            id: id.clone(),
            origin_region_id: origin_region_id.to_string(),
            destination_region_id: destination_region_id.to_string(),
            member_keys: member_keys.to_vec(),
        });
        self.version += 1;
        info!("persisted custom consolidation {id}");
        Ok(id)
    }

    fn delete_custom(
        &mut self,
        custom_id: &str,
        expected_version: u64,
    ) -> Result<(), SourceError> {
        if expected_version != self.version {
            return Err(SourceError::VersionConflict {
                expected: expected_version,
                actual: self.version,
            });
        }
        let before = self.stored.len();
        self.stored.retain(|c| c.id != custom_id);
        if self.stored.len() == before {
            return Err(SourceError::UnknownGroup(GroupKey(custom_id.to_string())));
        }
        self.version += 1;
        Ok(())
    }
}
