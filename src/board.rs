use std::collections::HashSet;

use log::{debug, info};

use crate::config::BoardConfig;
use crate::error::SourceError;
use crate::merge::{self, DragState};
use crate::model::{BoardGroup, ConsolidationGroup, CustomGroup, GroupKey, LaneType, Shipment};
use crate::regions::{RegionIndex, RegionKey};
use crate::selection::SelectionState;
use crate::sort;
use crate::source::{ConsolidationStore, GroupSource};

/// Handle for one in-flight fetch. Tickets are ordered; applying one that a
/// newer apply has superseded is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FetchTicket {
    generation: u64,
}

/// Composition root for one consolidation screen: the fetched groups, the
/// live custom groups, the selection, and the drag gesture. All operations
/// are synchronous transformations over state the board already holds.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationBoard {
    config: BoardConfig,
    regions: RegionIndex,
    originals: Vec<ConsolidationGroup>,
    customs: Vec<CustomGroup>,
    selection: SelectionState,
    drag: DragState,
    issued_generation: u64,
    applied_generation: u64,
    next_custom_id: u64,
}

impl ConsolidationBoard {
    pub fn new(config: BoardConfig, regions: RegionIndex) -> Self {
        Self {
            config,
            regions,
            next_custom_id: 1,
            ..Self::default()
        }
    }

    /// Builds the region index from the source's reference data and runs an
    /// initial fetch.
    pub fn from_source(
        config: BoardConfig,
        source: &dyn GroupSource,
    ) -> Result<Self, SourceError> {
        let regions = RegionIndex::new(&source.regions()?, &source.region_memberships()?);
        let mut board = Self::new(config, regions);
        board.refresh_from(source)?;
        Ok(board)
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn regions(&self) -> &RegionIndex {
        &self.regions
    }

    /// Changing the window takes effect on the next refresh; fresh data then
    /// resets all client-held merge state.
    pub fn set_outlook_days(&mut self, outlook_days: u32) {
        self.config.outlook_days = outlook_days;
    }

    pub fn set_lane_type(&mut self, lane_type: LaneType) {
        self.config.lane_type = lane_type;
    }

    pub fn begin_refresh(&mut self) -> FetchTicket {
        self.issued_generation += 1;
        FetchTicket {
            generation: self.issued_generation,
        }
    }

    /// Installs a fetch result. Returns false (board untouched) when a newer
    /// result has already been applied, so a slow in-flight fetch can never
    /// overwrite fresher data. Accepting a result discards custom groups,
    /// selection, and any drag in progress.
    pub fn apply_refresh(&mut self, ticket: FetchTicket, groups: Vec<ConsolidationGroup>) -> bool {
        if ticket.generation <= self.applied_generation {
            debug!(
                "dropping stale fetch result (generation {} <= {})",
                ticket.generation, self.applied_generation
            );
            return false;
        }
        self.applied_generation = ticket.generation;
        self.originals = groups;
        self.customs.clear();
        self.selection.clear();
        self.drag.cancel();
        true
    }

    pub fn refresh_from(&mut self, source: &dyn GroupSource) -> Result<(), SourceError> {
        let ticket = self.begin_refresh();
        let groups = source.groups(self.config.lane_type, self.config.outlook_days)?;
        self.apply_refresh(ticket, groups);
        Ok(())
    }

    /// The cards on screen: originals not subsumed by a custom group, plus
    /// the customs, ordered by the sort engine.
    pub fn visible_groups(&self) -> Vec<BoardGroup> {
        let subsumed: HashSet<GroupKey> = self
            .customs
            .iter()
            .flat_map(|c| c.member_keys())
            .collect();
        let mut visible: Vec<BoardGroup> = self
            .originals
            .iter()
            .filter(|g| !subsumed.contains(&g.key()))
            .cloned()
            .map(BoardGroup::Original)
            .collect();
        visible.extend(self.customs.iter().cloned().map(BoardGroup::Custom));
        sort::sort_groups(
            &mut visible,
            self.config.lane_type,
            &self.regions,
            &self.config.no_region_label,
        );
        visible
    }

    pub fn originals(&self) -> &[ConsolidationGroup] {
        &self.originals
    }

    pub fn customs(&self) -> &[CustomGroup] {
        &self.customs
    }

    // --- selection surface ---

    pub fn toggle_selection(&mut self, key: &GroupKey, selected: bool) -> bool {
        let visible = self.visible_groups();
        let Some(group) = visible.iter().find(|g| &g.key() == key) else {
            return false;
        };
        self.selection.toggle(group, selected, &self.regions);
        true
    }

    pub fn selected_keys(&self) -> &[GroupKey] {
        self.selection.selected()
    }

    pub fn compatible_keys(&self) -> HashSet<GroupKey> {
        self.selection
            .compatible_keys(&self.visible_groups(), &self.regions)
    }

    pub fn can_consolidate(&self) -> bool {
        self.selection.can_consolidate()
    }

    /// Materializes the checkbox selection into one custom group.
    pub fn consolidate_selection(&mut self) -> Option<GroupKey> {
        let selected: Vec<GroupKey> = self.selection.selected().to_vec();
        let visible = self.visible_groups();
        let custom = self.selection.consolidate(
            &visible,
            &self.regions,
            &self.config.no_region_label,
            self.next_custom_id,
        )?;
        self.next_custom_id += 1;
        let key = custom.id.clone();
        // A selected custom was flattened into the new group; drop it.
        self.customs.retain(|c| !selected.contains(&c.id));
        self.customs.push(custom);
        info!("consolidated {} cards into {key}", selected.len());
        Some(key)
    }

    // --- drag surface ---

    pub fn begin_drag(&mut self, key: &GroupKey) -> bool {
        let visible = self.visible_groups();
        let Some(source) = visible.iter().find(|g| &g.key() == key) else {
            return false;
        };
        self.drag.begin(source, &visible, &self.regions);
        true
    }

    pub fn drag_targets(&self) -> Option<&HashSet<GroupKey>> {
        self.drag.valid_targets()
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Completes the gesture. A drop on a valid target merges the two cards
    /// and returns the new custom key; any other drop cancels.
    pub fn drop_on(&mut self, target: &GroupKey) -> Option<GroupKey> {
        if !self.drag.drop_on(target) {
            return None;
        }
        let (source_key, target_key) = self.drag.take_drop()?;
        let visible = self.visible_groups();
        let source = visible.iter().find(|g| g.key() == source_key)?;
        let target = visible.iter().find(|g| g.key() == target_key)?;
        let custom = merge::merge_all(
            &[source, target],
            &self.regions,
            &self.config.no_region_label,
            self.next_custom_id,
        )?;
        self.next_custom_id += 1;
        let key = custom.id.clone();
        self.customs
            .retain(|c| c.id != source_key && c.id != target_key);
        self.customs.push(custom);
        info!("merged {source_key} and {target_key} into {key}");
        Some(key)
    }

    /// Discards every custom group and restores the fetched list. Callable
    /// at any time, always succeeds, idempotent.
    pub fn reset_to_original(&mut self) {
        if !self.customs.is_empty() {
            info!("reset: discarding {} custom groups", self.customs.len());
        }
        self.customs.clear();
        self.selection.clear();
        self.drag.cancel();
    }

    // --- collaborator pass-throughs ---

    /// Shipments behind one card. Custom groups fan out over their
    /// constituents.
    pub fn shipments_for(
        &self,
        key: &GroupKey,
        source: &dyn GroupSource,
    ) -> Result<Vec<Shipment>, SourceError> {
        let visible = self.visible_groups();
        let group = visible
            .iter()
            .find(|g| &g.key() == key)
            .ok_or_else(|| SourceError::UnknownGroup(key.clone()))?;
        match group {
            BoardGroup::Original(original) => source.shipments(
                &original.origin.id,
                &original.destination.id,
                self.config.outlook_days,
                None,
            ),
            // Client-held customs have no store identity; fan out over the
            // constituent lanes instead.
            BoardGroup::Custom(custom) => {
                let mut shipments = Vec::new();
                for member in &custom.combined_from {
                    shipments.extend(source.shipments(
                        &member.origin.id,
                        &member.destination.id,
                        self.config.outlook_days,
                        None,
                    )?);
                }
                Ok(shipments)
            }
        }
    }

    /// Writes one custom group through the persisted merge store. Both sides
    /// must be region-scoped; the store contract has no identity for an
    /// unassigned port bucket.
    pub fn persist_custom(
        &self,
        key: &GroupKey,
        store: &mut dyn ConsolidationStore,
    ) -> Result<String, SourceError> {
        let custom = self
            .customs
            .iter()
            .find(|c| &c.id == key)
            .ok_or_else(|| SourceError::UnknownGroup(key.clone()))?;
        let (RegionKey::Region(origin_region_id), RegionKey::Region(destination_region_id)) =
            (&custom.origin_bucket, &custom.destination_bucket)
        else {
            return Err(SourceError::NotRegionScoped(key.clone()));
        };
        let version = store.version();
        store.create_custom(
            origin_region_id,
            destination_region_id,
            &custom.member_keys(),
            version,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PortRef, PortRegion, RegionMembership};

    fn regions() -> RegionIndex {
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
        let memberships = [
            ("p-lax", "r-west"),
            ("p-sea", "r-west"),
            ("p-oak", "r-west"),
            ("p-yok", "r-nea"),
            ("p-pus", "r-nea"),
        ]
        .into_iter()
        .map(|(port_id, region_id)| RegionMembership {
            port_id: port_id.to_string(),
            region_id: region_id.to_string(),
        })
        .collect::<Vec<_>>();
        RegionIndex::new(&regions, &memberships)
    }

    fn group(origin: &str, dest: &str, cube: f64, count: u32) -> ConsolidationGroup {
        ConsolidationGroup {
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
        }
    }

    fn board_with_groups() -> ConsolidationBoard {
        let mut board = ConsolidationBoard::new(BoardConfig::default(), regions());
        let ticket = board.begin_refresh();
        board.apply_refresh(
            ticket,
            vec![
                group("p-lax", "p-yok", 500.0, 3),
                group("p-sea", "p-pus", 300.0, 2),
                group("p-oak", "p-yok", 100.0, 1),
            ],
        );
        board
    }

    #[test]
    fn drag_merge_replaces_sources_with_custom_card() {
        let mut board = board_with_groups();
        let a = GroupKey::of_ports("p-lax", "p-yok");
        let b = GroupKey::of_ports("p-sea", "p-pus");

        assert!(board.begin_drag(&a));
        assert!(board.drag_targets().unwrap().contains(&b));
        let key = board.drop_on(&b).unwrap();

        let visible = board.visible_groups();
        assert_eq!(visible.len(), 2);
        let custom = visible.iter().find(|g| g.key() == key).unwrap();
        assert_eq!(custom.total_cube(), 800.0);
        assert_eq!(custom.shipment_count(), 5);
        assert!(visible.iter().all(|g| g.key() != a && g.key() != b));
    }

    #[test]
    fn merging_onto_custom_flattens() {
        let mut board = board_with_groups();
        let a = GroupKey::of_ports("p-lax", "p-yok");
        let b = GroupKey::of_ports("p-sea", "p-pus");
        let c = GroupKey::of_ports("p-oak", "p-yok");

        board.begin_drag(&a);
        let first = board.drop_on(&b).unwrap();
        board.begin_drag(&c);
        let second = board.drop_on(&first).unwrap();

        assert_eq!(board.customs().len(), 1);
        let custom = &board.customs()[0];
        assert_eq!(custom.id, second);
        assert_eq!(custom.combined_from.len(), 3);
        assert_eq!(custom.total_cube, 900.0);
        assert_eq!(custom.shipment_count, 6);
    }

    #[test]
    fn reset_restores_originals_and_is_idempotent() {
        let mut board = board_with_groups();
        let a = GroupKey::of_ports("p-lax", "p-yok");
        let b = GroupKey::of_ports("p-sea", "p-pus");
        board.begin_drag(&a);
        board.drop_on(&b).unwrap();
        assert_eq!(board.visible_groups().len(), 2);

        board.reset_to_original();
        let first = board.visible_groups();
        board.reset_to_original();
        let second = board.visible_groups();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(board.customs().is_empty());
    }

    #[test]
    fn fresh_data_discards_customs() {
        let mut board = board_with_groups();
        let a = GroupKey::of_ports("p-lax", "p-yok");
        let b = GroupKey::of_ports("p-sea", "p-pus");
        board.begin_drag(&a);
        board.drop_on(&b).unwrap();
        assert_eq!(board.customs().len(), 1);

        let ticket = board.begin_refresh();
        assert!(board.apply_refresh(ticket, vec![group("p-lax", "p-yok", 50.0, 1)]));
        assert!(board.customs().is_empty());
        assert!(board.selected_keys().is_empty());
        assert_eq!(board.visible_groups().len(), 1);
    }

    #[test]
    fn stale_fetch_cannot_overwrite_newer_data() {
        let mut board = board_with_groups();
        let stale = board.begin_refresh();
        let fresh = board.begin_refresh();

        assert!(board.apply_refresh(fresh, vec![group("p-lax", "p-yok", 50.0, 1)]));
        // The slower, older fetch arrives afterwards and must be dropped.
        assert!(!board.apply_refresh(stale, vec![group("p-sea", "p-pus", 999.0, 9)]));
        assert_eq!(board.originals().len(), 1);
        assert_eq!(board.originals()[0].total_cube, 50.0);
    }

    #[test]
    fn checkbox_selection_consolidates() {
        let mut board = board_with_groups();
        let a = GroupKey::of_ports("p-lax", "p-yok");
        let b = GroupKey::of_ports("p-sea", "p-pus");

        assert!(board.toggle_selection(&a, true));
        assert!(!board.can_consolidate());
        assert!(board.toggle_selection(&b, true));
        assert!(board.can_consolidate());

        let compatible = board.compatible_keys();
        assert!(compatible.contains(&GroupKey::of_ports("p-oak", "p-yok")));

        let key = board.consolidate_selection().unwrap();
        assert_eq!(board.customs().len(), 1);
        assert_eq!(board.customs()[0].id, key);
        assert!(board.selected_keys().is_empty());
    }
}
