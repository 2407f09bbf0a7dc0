use std::collections::HashSet;

use crate::merge;
use crate::model::{BoardGroup, CustomGroup, GroupKey};
use crate::regions::{RegionIndex, RegionPair};

/// Multi-select over the visible cards. Compatibility is anchored to the
/// region pair of the first card selected, cached here until the selection
/// empties, never to the iteration order of a set.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Vec<GroupKey>,
    anchor: Option<RegionPair>,
}

impl SelectionState {
    pub fn selected(&self) -> &[GroupKey] {
        &self.selected
    }

    pub fn is_selected(&self, key: &GroupKey) -> bool {
        self.selected.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn anchor(&self) -> Option<&RegionPair> {
        self.anchor.as_ref()
    }

    pub fn toggle(&mut self, group: &BoardGroup, selected: bool, regions: &RegionIndex) {
        let key = group.key();
        if selected {
            if self.selected.contains(&key) {
                return;
            }
            if self.anchor.is_none() {
                self.anchor = Some(regions.pair_of_board(group));
            }
            self.selected.push(key);
        } else {
            self.selected.retain(|k| k != &key);
            if self.selected.is_empty() {
                self.anchor = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    /// Keys a user may still add to the selection. Empty selection means
    /// every card is a candidate; otherwise exactly the cards matching the
    /// anchor pair. Recomputed from scratch each call; boards hold tens of
    /// cards, not thousands.
    pub fn compatible_keys(&self, all: &[BoardGroup], regions: &RegionIndex) -> HashSet<GroupKey> {
        match &self.anchor {
            None => all.iter().map(|g| g.key()).collect(),
            Some(anchor) => all
                .iter()
                .filter(|g| regions.pair_of_board(g) == *anchor)
                .map(|g| g.key())
                .collect(),
        }
    }

    pub fn can_consolidate(&self) -> bool {
        self.selected.len() >= 2
    }

    /// Materializes one custom group from the selected cards and clears the
    /// selection. Returns `None` when fewer than two selected cards are
    /// still visible.
    pub fn consolidate(
        &mut self,
        all: &[BoardGroup],
        regions: &RegionIndex,
        no_region_label: &str,
        next_custom_id: u64,
    ) -> Option<CustomGroup> {
        if !self.can_consolidate() {
            return None;
        }
        let members: Vec<&BoardGroup> = self
            .selected
            .iter()
            .filter_map(|key| all.iter().find(|g| &g.key() == key))
            .collect();
        let custom = merge::merge_all(&members, regions, no_region_label, next_custom_id)?;
        self.clear();
        Some(custom)
    }
}
