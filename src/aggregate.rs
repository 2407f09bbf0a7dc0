use std::collections::{BTreeMap, HashMap};

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{ConsolidationGroup, Port, PortRef, Shipment};

// UN/LOCODE: two-letter country prefix, three alphanumeric location chars
// (digits 0 and 1 are never issued).
static PORT_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}[A-Z2-9]{3}$").unwrap());

pub fn is_valid_port_code(code: &str) -> bool {
    PORT_CODE_RE.is_match(code)
}

/// Aggregates raw shipments into consolidation groups for one outlook
/// window. Groups are derived fresh on every call; nothing is cached.
///
/// Shipments whose move date falls outside `[0, outlook_days]` are dropped,
/// as are shipments referencing ports missing from the reference data.
pub fn aggregate_shipments(
    shipments: &[Shipment],
    ports: &[Port],
    outlook_days: u32,
    user_id: Option<&str>,
) -> Vec<ConsolidationGroup> {
    let ports_by_id: HashMap<&str, &Port> = ports.iter().map(|p| (p.id.as_str(), p)).collect();

    // BTreeMap keyed by (origin, destination) keeps the output order
    // deterministic across fetches.
    let mut groups: BTreeMap<(String, String), ConsolidationGroup> = BTreeMap::new();

    for shipment in shipments {
        if shipment.move_offset_days < 0 || shipment.move_offset_days as u32 > outlook_days {
            continue;
        }
        let (Some(origin), Some(destination)) = (
            ports_by_id.get(shipment.origin_port_id.as_str()),
            ports_by_id.get(shipment.destination_port_id.as_str()),
        ) else {
            warn!("shipment {} references an unknown port", shipment.id);
            continue;
        };

        let entry = groups
            .entry((origin.id.clone(), destination.id.clone()))
            .or_insert_with(|| ConsolidationGroup {
                origin: PortRef::of(origin),
                destination: PortRef::of(destination),
                shipment_count: 0,
                total_cube: 0.0,
                has_user_shipments: false,
                is_origin_flexible: false,
                is_destination_flexible: false,
            });
        entry.shipment_count += 1;
        entry.total_cube += shipment.effective_cube();
        if user_id.is_some_and(|id| shipment.owner_id == id) {
            entry.has_user_shipments = true;
        }
    }

    groups.into_values().collect()
}
