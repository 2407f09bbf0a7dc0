use portcast_consolidation::sort::sort_label;
use portcast_consolidation::{
    BoardConfig, BoardGroup, ConsolidationBoard, GroupKey, LaneType, Snapshot, SnapshotSource,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardViewOptions {
    lane_type: Option<String>,
    outlook_days: Option<u32>,
    user_id: Option<String>,
    no_region_label: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CardView {
    key: String,
    region: String,
    origin_code: Option<String>,
    destination_code: Option<String>,
    shipment_count: u32,
    total_cube: f64,
    has_user_shipments: bool,
    is_custom: bool,
}

fn build_config(options: BoardViewOptions) -> BoardConfig {
    let mut config = BoardConfig::default();
    if let Some(lane) = options.lane_type.as_deref() {
        if let Some(lane_type) = LaneType::from_token(lane) {
            config.lane_type = lane_type;
        }
    }
    if let Some(outlook_days) = options.outlook_days {
        config.outlook_days = outlook_days;
    }
    if let Some(user_id) = options.user_id {
        config.user_id = Some(user_id);
    }
    if let Some(label) = options.no_region_label {
        config.no_region_label = label;
    }
    config
}

fn parse_options(options_json: Option<String>) -> Result<BoardViewOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str::<BoardViewOptions>(&raw)
            .map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(BoardViewOptions::default()),
    }
}

fn build_board(snapshot_json: &str, config: BoardConfig) -> Result<ConsolidationBoard, JsValue> {
    let snapshot = Snapshot::from_json(snapshot_json)
        .map_err(|error| JsValue::from_str(&error.to_string()))?;
    let source = SnapshotSource::new(snapshot, config.user_id.clone());
    ConsolidationBoard::from_source(config, &source)
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

fn card_views(board: &ConsolidationBoard) -> Vec<CardView> {
    let config = board.config();
    board
        .visible_groups()
        .iter()
        .map(|group| {
            let region = sort_label(
                group,
                config.lane_type,
                board.regions(),
                &config.no_region_label,
            );
            match group {
                BoardGroup::Original(original) => CardView {
                    key: original.key().to_string(),
                    region,
                    origin_code: Some(original.origin.code.clone()),
                    destination_code: Some(original.destination.code.clone()),
                    shipment_count: original.shipment_count,
                    total_cube: original.total_cube,
                    has_user_shipments: original.has_user_shipments,
                    is_custom: false,
                },
                BoardGroup::Custom(custom) => CardView {
                    key: custom.id.to_string(),
                    region,
                    origin_code: None,
                    destination_code: None,
                    shipment_count: custom.shipment_count,
                    total_cube: custom.total_cube,
                    has_user_shipments: custom.has_user_shipments,
                    is_custom: true,
                },
            }
        })
        .collect()
}

/// Sorted card list for one snapshot, as JSON.
#[wasm_bindgen]
pub fn board_view(snapshot_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let config = build_config(parse_options(options_json)?);
    let board = build_board(snapshot_json, config)?;
    serde_json::to_string(&card_views(&board)).map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Card list after dragging `source_key` onto `target_key`. An incompatible
/// pair returns the unchanged board, same as the on-screen gesture.
#[wasm_bindgen]
pub fn merge_preview(
    snapshot_json: &str,
    source_key: &str,
    target_key: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let config = build_config(parse_options(options_json)?);
    let mut board = build_board(snapshot_json, config)?;
    if board.begin_drag(&GroupKey(source_key.to_string())) {
        board.drop_on(&GroupKey(target_key.to_string()));
    }
    serde_json::to_string(&card_views(&board)).map_err(|error| JsValue::from_str(&error.to_string()))
}
