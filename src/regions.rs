use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::model::{BoardGroup, ConsolidationGroup, PortRef, PortRegion, RegionMembership};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRef {
    pub id: String,
    pub name: String,
}

/// The bucket a port falls into for sorting and compatibility. A port with
/// no region assignment is its own bucket: two unregioned ports are never
/// interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RegionKey {
    Region(String),
    Unassigned(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionPair {
    pub origin: RegionKey,
    pub destination: RegionKey,
}

/// Port-to-region lookup built once from reference data. Pure reads after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    by_port: HashMap<String, RegionRef>,
    region_names: HashMap<String, String>,
}

impl RegionIndex {
    pub fn new(regions: &[PortRegion], memberships: &[RegionMembership]) -> Self {
        let mut region_names = HashMap::new();
        for region in regions {
            region_names.insert(region.id.clone(), region.name.clone());
        }

        let mut by_port: HashMap<String, RegionRef> = HashMap::new();
        for row in memberships {
            let Some(name) = region_names.get(&row.region_id) else {
                warn!(
                    "membership for port {} references unknown region {}",
                    row.port_id, row.region_id
                );
                continue;
            };
            // The store does not enforce one region per port; the first row wins.
            if by_port.contains_key(&row.port_id) {
                warn!("port {} has multiple region memberships", row.port_id);
                continue;
            }
            by_port.insert(
                row.port_id.clone(),
                RegionRef {
                    id: row.region_id.clone(),
                    name: name.clone(),
                },
            );
        }

        Self {
            by_port,
            region_names,
        }
    }

    pub fn region_of(&self, port_id: &str) -> Option<&RegionRef> {
        self.by_port.get(port_id)
    }

    pub fn bucket_of(&self, port_id: &str) -> RegionKey {
        match self.region_of(port_id) {
            Some(region) => RegionKey::Region(region.id.clone()),
            None => RegionKey::Unassigned(port_id.to_string()),
        }
    }

    pub fn display_name_of(&self, port_id: &str, no_region_label: &str) -> String {
        match self.region_of(port_id) {
            Some(region) => region.name.clone(),
            None => no_region_label.to_string(),
        }
    }

    pub fn bucket_display_name(&self, bucket: &RegionKey, no_region_label: &str) -> String {
        match bucket {
            RegionKey::Region(id) => self
                .region_names
                .get(id)
                .cloned()
                .unwrap_or_else(|| no_region_label.to_string()),
            RegionKey::Unassigned(_) => no_region_label.to_string(),
        }
    }

    /// What a card shows for one side of the lane: the region name when the
    /// side is flexible, otherwise the port itself.
    pub fn side_label(&self, port: &PortRef, flexible: bool, no_region_label: &str) -> String {
        if flexible {
            self.display_name_of(&port.id, no_region_label)
        } else {
            port.name.clone()
        }
    }

    pub fn pair_of(&self, group: &ConsolidationGroup) -> RegionPair {
        RegionPair {
            origin: self.bucket_of(&group.origin.id),
            destination: self.bucket_of(&group.destination.id),
        }
    }

    /// Region-pair identity for any displayed card. Custom groups carry their
    /// buckets denormalized, so no membership lookup happens after a merge.
    pub fn pair_of_board(&self, group: &BoardGroup) -> RegionPair {
        match group {
            BoardGroup::Original(original) => self.pair_of(original),
            BoardGroup::Custom(custom) => RegionPair {
                origin: custom.origin_bucket.clone(),
                destination: custom.destination_bucket.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PortRef, RegionMembership};

    fn index() -> RegionIndex {
        let regions = vec![
            PortRegion {
                id: "r-west".to_string(),
                name: "US West Coast".to_string(),
                description: None,
            },
            PortRegion {
                id: "r-nea".to_string(),
                name: "Northeast Asia".to_string(),
                description: Some("Japan, Korea".to_string()),
            },
        ];
        let memberships = vec![
            RegionMembership {
                port_id: "p-lax".to_string(),
                region_id: "r-west".to_string(),
            },
            RegionMembership {
                port_id: "p-yok".to_string(),
                region_id: "r-nea".to_string(),
            },
            // Duplicate row for p-lax; the first assignment must win.
            RegionMembership {
                port_id: "p-lax".to_string(),
                region_id: "r-nea".to_string(),
            },
        ];
        RegionIndex::new(&regions, &memberships)
    }

    #[test]
    fn lookup_is_pure_and_first_row_wins() {
        let index = index();
        let first = index.region_of("p-lax").cloned();
        let second = index.region_of("p-lax").cloned();
        assert_eq!(first, second);
        assert_eq!(first.unwrap().id, "r-west");
    }

    #[test]
    fn unregioned_ports_get_distinct_buckets() {
        let index = index();
        let a = index.bucket_of("p-unknown-a");
        let b = index.bucket_of("p-unknown-b");
        assert_ne!(a, b);
        assert_eq!(a, index.bucket_of("p-unknown-a"));
        assert_eq!(index.display_name_of("p-unknown-a", "No Region"), "No Region");
    }

    #[test]
    fn flexible_sides_display_as_their_region() {
        let index = index();
        let port = PortRef {
            id: "p-lax".to_string(),
            name: "Los Angeles".to_string(),
            code: "USLAX".to_string(),
        };
        assert_eq!(index.side_label(&port, false, "No Region"), "Los Angeles");
        assert_eq!(index.side_label(&port, true, "No Region"), "US West Coast");
    }

    #[test]
    fn pair_of_uses_both_sides() {
        let index = index();
        let group = ConsolidationGroup {
            origin: PortRef {
                id: "p-lax".to_string(),
                name: "Los Angeles".to_string(),
                code: "USLAX".to_string(),
            },
            destination: PortRef {
                id: "p-yok".to_string(),
                name: "Yokohama".to_string(),
                code: "JPYOK".to_string(),
            },
            shipment_count: 1,
            total_cube: 10.0,
            has_user_shipments: false,
            is_origin_flexible: false,
            is_destination_flexible: false,
        };
        let pair = index.pair_of(&group);
        assert_eq!(pair.origin, RegionKey::Region("r-west".to_string()));
        assert_eq!(pair.destination, RegionKey::Region("r-nea".to_string()));
    }
}
