use std::fmt;

use serde::{Deserialize, Serialize};

use crate::regions::RegionKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneType {
    Inbound,
    Outbound,
    Intertheater,
}

impl LaneType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            "intertheater" => Some(Self::Intertheater),
            _ => None,
        }
    }

    /// Which side of a lane carries the grouping identity on screen.
    pub fn groups_by_destination(self) -> bool {
        matches!(self, Self::Outbound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRegion {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionMembership {
    pub port_id: String,
    pub region_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    pub origin_port_id: String,
    pub destination_port_id: String,
    pub owner_id: String,
    /// Measured cube, when the shipment has been cubed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cube_m3: Option<f64>,
    pub estimated_cube_m3: f64,
    /// Days from now until the requested move date. Negative offsets are
    /// already outside every outlook window.
    pub move_offset_days: i32,
}

impl Shipment {
    pub fn effective_cube(&self) -> f64 {
        self.cube_m3.unwrap_or(self.estimated_cube_m3)
    }
}

/// Denormalized port identity carried inside a group so the card can render
/// without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRef {
    pub id: String,
    pub name: String,
    pub code: String,
}

impl PortRef {
    pub fn of(port: &Port) -> Self {
        Self {
            id: port.id.clone(),
            name: port.name.clone(),
            code: port.code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(pub String);

impl GroupKey {
    pub fn of_ports(origin_port_id: &str, destination_port_id: &str) -> Self {
        Self(format!("{origin_port_id}:{destination_port_id}"))
    }

    pub fn custom(n: u64) -> Self {
        Self(format!("custom:{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One consolidation opportunity: everything moving between one port pair
/// inside the active outlook window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationGroup {
    pub origin: PortRef,
    pub destination: PortRef,
    pub shipment_count: u32,
    pub total_cube: f64,
    #[serde(default)]
    pub has_user_shipments: bool,
    #[serde(default)]
    pub is_origin_flexible: bool,
    #[serde(default)]
    pub is_destination_flexible: bool,
}

impl ConsolidationGroup {
    pub fn key(&self) -> GroupKey {
        GroupKey::of_ports(&self.origin.id, &self.destination.id)
    }
}

/// A synthetic group produced by merging two or more fetched groups that
/// share a region pair. Exists only in board state until reset, unless the
/// host persists it through a `ConsolidationStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGroup {
    pub id: GroupKey,
    pub origin_bucket: RegionKey,
    pub origin_region_name: String,
    pub destination_bucket: RegionKey,
    pub destination_region_name: String,
    pub shipment_count: u32,
    pub total_cube: f64,
    pub has_user_shipments: bool,
    /// Always the flat list of fetched groups this card subsumes; merging a
    /// custom group contributes its constituents, never itself.
    pub combined_from: Vec<ConsolidationGroup>,
}

impl CustomGroup {
    pub fn member_keys(&self) -> Vec<GroupKey> {
        self.combined_from.iter().map(|g| g.key()).collect()
    }
}

/// The unit the board displays, selects, and sorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardGroup {
    Original(ConsolidationGroup),
    Custom(CustomGroup),
}

impl BoardGroup {
    pub fn key(&self) -> GroupKey {
        match self {
            Self::Original(group) => group.key(),
            Self::Custom(custom) => custom.id.clone(),
        }
    }

    pub fn shipment_count(&self) -> u32 {
        match self {
            Self::Original(group) => group.shipment_count,
            Self::Custom(custom) => custom.shipment_count,
        }
    }

    pub fn total_cube(&self) -> f64 {
        match self {
            Self::Original(group) => group.total_cube,
            Self::Custom(custom) => custom.total_cube,
        }
    }

    pub fn has_user_shipments(&self) -> bool {
        match self {
            Self::Original(group) => group.has_user_shipments,
            Self::Custom(custom) => custom.has_user_shipments,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}
