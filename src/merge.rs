use std::collections::HashSet;

use log::debug;

use crate::model::{BoardGroup, ConsolidationGroup, CustomGroup, GroupKey};
use crate::regions::RegionIndex;

/// A single drag gesture. The state is an explicit tagged union; there is no
/// ambient "current drag" outside this value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        source: GroupKey,
        valid_targets: HashSet<GroupKey>,
    },
    Dropped {
        source: GroupKey,
        target: GroupKey,
    },
}

impl DragState {
    /// Idle → Dragging. Valid targets are every other card sharing the
    /// source's region pair, fixed for the duration of the gesture.
    pub fn begin(&mut self, source: &BoardGroup, all: &[BoardGroup], regions: &RegionIndex) {
        let source_key = source.key();
        let pair = regions.pair_of_board(source);
        let valid_targets: HashSet<GroupKey> = all
            .iter()
            .filter(|g| g.key() != source_key && regions.pair_of_board(g) == pair)
            .map(|g| g.key())
            .collect();
        debug!(
            "drag begin {} ({} valid targets)",
            source_key,
            valid_targets.len()
        );
        *self = Self::Dragging {
            source: source_key,
            valid_targets,
        };
    }

    /// Dragging → Dropped when the target is valid, otherwise → Idle. An
    /// incompatible drop is not an error; the gesture simply ends with no
    /// changes.
    pub fn drop_on(&mut self, target: &GroupKey) -> bool {
        match std::mem::take(self) {
            Self::Dragging {
                source,
                valid_targets,
            } if valid_targets.contains(target) => {
                *self = Self::Dropped {
                    source,
                    target: target.clone(),
                };
                true
            }
            _ => {
                debug!("drop on {target} cancelled");
                *self = Self::Idle;
                false
            }
        }
    }

    /// Dragging → Idle with no changes. Idempotent.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Consumes a Dropped state back to Idle so the owner can materialize
    /// the merge exactly once.
    pub fn take_drop(&mut self) -> Option<(GroupKey, GroupKey)> {
        match std::mem::take(self) {
            Self::Dropped { source, target } => Some((source, target)),
            other => {
                *self = other;
                None
            }
        }
    }

    pub fn source(&self) -> Option<&GroupKey> {
        match self {
            Self::Dragging { source, .. } | Self::Dropped { source, .. } => Some(source),
            Self::Idle => None,
        }
    }

    pub fn valid_targets(&self) -> Option<&HashSet<GroupKey>> {
        match self {
            Self::Dragging { valid_targets, .. } => Some(valid_targets),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Merges two or more cards sharing one region pair into a custom group.
/// Totals are summed over the flat constituent list, so the group invariant
/// (`total_cube`/`shipment_count` equal the sums over `combined_from`) holds
/// by construction. Returns `None` if the members disagree on region pair;
/// callers only reach this through valid targets, so that is a no-op rather
/// than an error.
pub fn merge_all(
    members: &[&BoardGroup],
    regions: &RegionIndex,
    no_region_label: &str,
    next_custom_id: u64,
) -> Option<CustomGroup> {
    let first = members.first()?;
    if members.len() < 2 {
        return None;
    }
    let pair = regions.pair_of_board(first);
    if members.iter().any(|m| regions.pair_of_board(m) != pair) {
        return None;
    }

    let mut combined_from: Vec<ConsolidationGroup> = Vec::new();
    for member in members {
        match member {
            BoardGroup::Original(group) => combined_from.push((*group).clone()),
            // Flatten: a custom member contributes its constituents, never
            // itself, so customs never nest.
            BoardGroup::Custom(custom) => combined_from.extend(custom.combined_from.iter().cloned()),
        }
    }

    let shipment_count = combined_from.iter().map(|g| g.shipment_count).sum();
    let total_cube = combined_from.iter().map(|g| g.total_cube).sum();
    let has_user_shipments = combined_from.iter().any(|g| g.has_user_shipments);

    Some(CustomGroup {
        id: GroupKey::custom(next_custom_id),
        origin_region_name: regions.bucket_display_name(&pair.origin, no_region_label),
        origin_bucket: pair.origin,
        destination_region_name: regions.bucket_display_name(&pair.destination, no_region_label),
        destination_bucket: pair.destination,
        shipment_count,
        total_cube,
        has_user_shipments,
        combined_from,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PortRef, PortRegion, RegionMembership};

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
                description: None,
            },
        ];
        let memberships = vec![
            RegionMembership {
                port_id: "p-lax".to_string(),
                region_id: "r-west".to_string(),
            },
            RegionMembership {
                port_id: "p-sea".to_string(),
                region_id: "r-west".to_string(),
            },
            RegionMembership {
                port_id: "p-oak".to_string(),
                region_id: "r-west".to_string(),
            },
            RegionMembership {
                port_id: "p-yok".to_string(),
                region_id: "r-nea".to_string(),
            },
            RegionMembership {
                port_id: "p-pus".to_string(),
                region_id: "r-nea".to_string(),
            },
        ];
        RegionIndex::new(&regions, &memberships)
    }

    fn group(origin: &str, dest: &str, cube: f64, count: u32) -> BoardGroup {
        BoardGroup::Original(ConsolidationGroup {
            origin: PortRef {
                id: origin.to_string(),
                name: origin.to_string(),
                code: "XXXXX".to_string(),
            },
            destination: PortRef {
                id: dest.to_string(),
                name: dest.to_string(),
                code: "XXXXX".to_string(),
            },
            shipment_count: count,
            total_cube: cube,
            has_user_shipments: false,
            is_origin_flexible: false,
            is_destination_flexible: false,
        })
    }

    #[test]
    fn merge_sums_totals() {
        let index = index();
        let a = group("p-lax", "p-yok", 500.0, 3);
        let b = group("p-sea", "p-pus", 300.0, 2);
        let merged = merge_all(&[&a, &b], &index, "No Region", 1).unwrap();
        assert_eq!(merged.total_cube, 800.0);
        assert_eq!(merged.shipment_count, 5);
        assert_eq!(merged.combined_from.len(), 2);
        assert_eq!(merged.origin_region_name, "US West Coast");
        assert_eq!(merged.destination_region_name, "Northeast Asia");
    }

    #[test]
    fn merge_flattens_custom_members() {
        let index = index();
        let a = group("p-lax", "p-yok", 500.0, 3);
        let b = group("p-sea", "p-pus", 300.0, 2);
        let c = BoardGroup::Custom(merge_all(&[&a, &b], &index, "No Region", 1).unwrap());
        let d = group("p-oak", "p-yok", 100.0, 1);
        let merged = merge_all(&[&c, &d], &index, "No Region", 2).unwrap();
        // [A, B, D], never [C, D].
        assert_eq!(merged.combined_from.len(), 3);
        assert_eq!(merged.total_cube, 900.0);
        assert_eq!(merged.shipment_count, 6);
        assert!(merged.combined_from.iter().all(|g| g.shipment_count > 0));
    }

    #[test]
    fn merge_rejects_mismatched_pairs() {
        let index = index();
        let a = group("p-lax", "p-yok", 500.0, 3);
        let reversed = group("p-yok", "p-lax", 300.0, 2);
        assert!(merge_all(&[&a, &reversed], &index, "No Region", 1).is_none());
    }

    #[test]
    fn drag_gesture_transitions() {
        let index = index();
        let a = group("p-lax", "p-yok", 500.0, 3);
        let b = group("p-sea", "p-pus", 300.0, 2);
        let other = group("p-yok", "p-lax", 10.0, 1);
        let all = vec![a.clone(), b.clone(), other.clone()];

        let mut drag = DragState::default();
        assert!(drag.is_idle());

        drag.begin(&a, &all, &index);
        let targets = drag.valid_targets().unwrap();
        assert!(targets.contains(&b.key()));
        assert!(!targets.contains(&other.key()));
        assert!(!targets.contains(&a.key()));

        // Invalid drop ends the gesture with no drop recorded.
        assert!(!drag.drop_on(&other.key()));
        assert!(drag.is_idle());
        assert_eq!(drag.take_drop(), None);

        drag.begin(&a, &all, &index);
        assert!(drag.drop_on(&b.key()));
        assert_eq!(drag.take_drop(), Some((a.key(), b.key())));
        assert!(drag.is_idle());
    }

    #[test]
    fn cancel_is_idempotent() {
        let index = index();
        let a = group("p-lax", "p-yok", 500.0, 3);
        let all = vec![a.clone()];
        let mut drag = DragState::default();
        drag.begin(&a, &all, &index);
        drag.cancel();
        drag.cancel();
        assert!(drag.is_idle());
    }
}
