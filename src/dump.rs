use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::board::ConsolidationBoard;
use crate::model::BoardGroup;
use crate::sort;

#[derive(Debug, Serialize)]
pub struct BoardDump {
    pub lane_type: String,
    pub outlook_days: u32,
    pub cards: Vec<CardDump>,
    pub selected: Vec<String>,
    pub compatible: Vec<String>,
    pub custom_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CardDump {
    pub key: String,
    pub region: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub shipment_count: u32,
    pub total_cube: f64,
    pub has_user_shipments: bool,
    pub is_custom: bool,
    pub combined_from: Vec<String>,
}

impl BoardDump {
    pub fn from_board(board: &ConsolidationBoard) -> Self {
        let config = board.config();
        let cards = board
            .visible_groups()
            .iter()
            .map(|group| {
                let region = sort::sort_label(
                    group,
                    config.lane_type,
                    board.regions(),
                    &config.no_region_label,
                );
                match group {
                    BoardGroup::Original(original) => CardDump {
                        key: original.key().to_string(),
                        region,
                        origin: Some(board.regions().side_label(
                            &original.origin,
                            original.is_origin_flexible,
                            &config.no_region_label,
                        )),
                        destination: Some(board.regions().side_label(
                            &original.destination,
                            original.is_destination_flexible,
                            &config.no_region_label,
                        )),
                        shipment_count: original.shipment_count,
                        total_cube: original.total_cube,
                        has_user_shipments: original.has_user_shipments,
                        is_custom: false,
                        combined_from: Vec::new(),
                    },
                    BoardGroup::Custom(custom) => CardDump {
                        key: custom.id.to_string(),
                        region,
                        origin: None,
                        destination: None,
                        shipment_count: custom.shipment_count,
                        total_cube: custom.total_cube,
                        has_user_shipments: custom.has_user_shipments,
                        is_custom: true,
                        combined_from: custom
                            .member_keys()
                            .iter()
                            .map(|k| k.to_string())
                            .collect(),
                    },
                }
            })
            .collect();

        let mut compatible: Vec<String> = board
            .compatible_keys()
            .iter()
            .map(|k| k.to_string())
            .collect();
        compatible.sort();

        BoardDump {
            lane_type: format!("{:?}", config.lane_type),
            outlook_days: config.outlook_days,
            cards,
            selected: board.selected_keys().iter().map(|k| k.to_string()).collect(),
            compatible,
            custom_count: board.customs().len(),
        }
    }
}

pub fn write_board_dump(path: &Path, board: &ConsolidationBoard) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = BoardDump::from_board(board);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
