use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::LaneType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub lane_type: LaneType,
    pub outlook_days: u32,
    /// Display label for ports with no region assignment.
    pub no_region_label: String,
    /// The requesting user; drives `has_user_shipments` on aggregated groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            lane_type: LaneType::Inbound,
            outlook_days: 14,
            no_region_label: "No Region".to_string(),
            user_id: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    lane_type: Option<LaneType>,
    outlook_days: Option<u32>,
    no_region_label: Option<String>,
    user_id: Option<String>,
}

/// Defaults merged with per-field JSON overrides, when a config file is
/// given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<BoardConfig> {
    let mut config = BoardConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };
    let raw = std::fs::read_to_string(path)?;
    let overrides: ConfigOverrides = serde_json::from_str(&raw)?;
    if let Some(lane_type) = overrides.lane_type {
        config.lane_type = lane_type;
    }
    if let Some(outlook_days) = overrides.outlook_days {
        config.outlook_days = outlook_days;
    }
    if let Some(label) = overrides.no_region_label {
        config.no_region_label = label;
    }
    if let Some(user_id) = overrides.user_id {
        config.user_id = Some(user_id);
    }
    Ok(config)
}
