use crate::model::{BoardGroup, LaneType};
use crate::regions::RegionIndex;

/// Region display name a card files under for the given lane type: the
/// origin side for inbound and intertheater lanes, the destination side for
/// outbound lanes.
pub fn sort_label(
    group: &BoardGroup,
    lane_type: LaneType,
    regions: &RegionIndex,
    no_region_label: &str,
) -> String {
    match group {
        // Custom groups carry their region name denormalized; after a merge
        // there is no single port to re-resolve.
        BoardGroup::Custom(custom) => {
            if lane_type.groups_by_destination() {
                custom.destination_region_name.clone()
            } else {
                custom.origin_region_name.clone()
            }
        }
        BoardGroup::Original(original) => {
            let port_id = if lane_type.groups_by_destination() {
                &original.destination.id
            } else {
                &original.origin.id
            };
            regions.display_name_of(port_id, no_region_label)
        }
    }
}

/// Orders cards by region name ascending. Ties keep their fetched order;
/// `sort_by_cached_key` is stable.
pub fn sort_groups(
    groups: &mut [BoardGroup],
    lane_type: LaneType,
    regions: &RegionIndex,
    no_region_label: &str,
) {
    groups.sort_by_cached_key(|group| {
        fold_case(&sort_label(group, lane_type, regions, no_region_label))
    });
}

fn fold_case(label: &str) -> String {
    label.chars().flat_map(char::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConsolidationGroup, PortRef, PortRegion, RegionMembership};

    fn group(origin_id: &str, dest_id: &str, count: u32) -> BoardGroup {
        BoardGroup::Original(ConsolidationGroup {
            origin: PortRef {
                id: origin_id.to_string(),
                name: origin_id.to_string(),
                code: "XXXXX".to_string(),
            },
            destination: PortRef {
                id: dest_id.to_string(),
                name: dest_id.to_string(),
                code: "XXXXX".to_string(),
            },
            shipment_count: count,
            total_cube: 0.0,
            has_user_shipments: false,
            is_origin_flexible: false,
            is_destination_flexible: false,
        })
    }

    fn index() -> RegionIndex {
        let regions = vec![
            PortRegion {
                id: "r-pac".to_string(),
                name: "Pacific".to_string(),
                description: None,
            },
            PortRegion {
                id: "r-atl".to_string(),
                name: "Atlantic".to_string(),
                description: None,
            },
        ];
        let memberships = vec![
            RegionMembership {
                port_id: "p1".to_string(),
                region_id: "r-pac".to_string(),
            },
            RegionMembership {
                port_id: "p2".to_string(),
                region_id: "r-atl".to_string(),
            },
            RegionMembership {
                port_id: "p3".to_string(),
                region_id: "r-atl".to_string(),
            },
        ];
        RegionIndex::new(&regions, &memberships)
    }

    #[test]
    fn orders_by_region_name_and_keeps_ties_stable() {
        let index = index();
        // Fetched order: Pacific, Atlantic (p2), Atlantic (p3).
        let mut groups = vec![group("p1", "d", 1), group("p2", "d", 2), group("p3", "d", 3)];
        sort_groups(&mut groups, LaneType::Inbound, &index, "No Region");
        let counts: Vec<u32> = groups.iter().map(|g| g.shipment_count()).collect();
        // Both Atlantic entries first, in their original relative order.
        assert_eq!(counts, vec![2, 3, 1]);
    }

    #[test]
    fn outbound_lanes_sort_by_destination_region() {
        let index = index();
        let mut groups = vec![group("d", "p1", 1), group("d", "p2", 2)];
        sort_groups(&mut groups, LaneType::Outbound, &index, "No Region");
        let counts: Vec<u32> = groups.iter().map(|g| g.shipment_count()).collect();
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn comparison_ignores_case() {
        assert_eq!(fold_case("Atlantic"), fold_case("ATLANTIC"));
        assert!(fold_case("atlantic") < fold_case("Pacific"));
    }
}
