use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use crate::board::ConsolidationBoard;
use crate::config::load_config;
use crate::dump::write_board_dump;
use crate::model::{BoardGroup, GroupKey, LaneType};
use crate::sort;
use crate::source::{Snapshot, SnapshotSource};

#[derive(Parser, Debug)]
#[command(name = "pcons", version, about = "Consolidation board inspector")]
pub struct Args {
    /// Snapshot JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Lane type: inbound, outbound, intertheater
    #[arg(short = 'l', long = "lane")]
    pub lane: Option<String>,

    /// Outlook window in days
    #[arg(short = 'd', long = "outlookDays")]
    pub outlook_days: Option<u32>,

    /// Config JSON file with board defaults
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Requesting user id (flags cards carrying that user's shipments)
    #[arg(short = 'u', long = "user")]
    pub user: Option<String>,

    /// Group keys to select before printing (repeatable)
    #[arg(long = "select")]
    pub select: Vec<String>,

    /// Simulate one drag-merge: SOURCE_KEY,TARGET_KEY
    #[arg(long = "merge")]
    pub merge: Option<String>,

    /// Write a JSON dump of the final board state
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(lane) = &args.lane {
        config.lane_type = LaneType::from_token(lane)
            .ok_or_else(|| anyhow::anyhow!("Unknown lane type: {lane}"))?;
    }
    if let Some(outlook_days) = args.outlook_days {
        config.outlook_days = outlook_days;
    }
    if let Some(user) = &args.user {
        config.user_id = Some(user.clone());
    }

    let raw = read_input(args.input.as_deref())?;
    let snapshot = Snapshot::from_json(&raw)?;
    let source = SnapshotSource::new(snapshot, config.user_id.clone());
    let mut board = ConsolidationBoard::from_source(config, &source)?;

    for key in &args.select {
        let key = GroupKey(key.clone());
        if !board.toggle_selection(&key, true) {
            return Err(anyhow::anyhow!("No such group to select: {key}"));
        }
    }

    if let Some(merge) = &args.merge {
        let (source_key, target_key) = parse_merge_arg(merge)?;
        if !board.begin_drag(&source_key) {
            return Err(anyhow::anyhow!("No such group to drag: {source_key}"));
        }
        match board.drop_on(&target_key) {
            Some(custom_key) => println!("merged into {custom_key}"),
            None => println!("merge of {source_key} onto {target_key} is not valid; no change"),
        }
    }

    print_board(&board);

    if let Some(path) = &args.dump {
        write_board_dump(path, &board)?;
    }

    Ok(())
}

fn print_board(board: &ConsolidationBoard) {
    let config = board.config();
    let visible = board.visible_groups();
    if visible.is_empty() {
        println!("no consolidation opportunities in the current window");
        return;
    }
    let compatible = board.compatible_keys();
    for group in &visible {
        let region = sort::sort_label(
            group,
            config.lane_type,
            board.regions(),
            &config.no_region_label,
        );
        let marker = if board.selected_keys().contains(&group.key()) {
            "*"
        } else if !compatible.contains(&group.key()) {
            "-"
        } else {
            " "
        };
        match group {
            BoardGroup::Original(original) => println!(
                "{marker} [{region}] {} -> {}  shipments={} cube={:.1}{}",
                board.regions().side_label(
                    &original.origin,
                    original.is_origin_flexible,
                    &config.no_region_label
                ),
                board.regions().side_label(
                    &original.destination,
                    original.is_destination_flexible,
                    &config.no_region_label
                ),
                original.shipment_count,
                original.total_cube,
                if original.has_user_shipments {
                    " (yours)"
                } else {
                    ""
                },
            ),
            BoardGroup::Custom(custom) => println!(
                "{marker} [{region}] custom ({} lanes)  shipments={} cube={:.1}",
                custom.combined_from.len(),
                custom.shipment_count,
                custom.total_cube,
            ),
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn parse_merge_arg(raw: &str) -> Result<(GroupKey, GroupKey)> {
    let Some((source, target)) = raw.split_once(',') else {
        return Err(anyhow::anyhow!(
            "--merge expects SOURCE_KEY,TARGET_KEY, got {raw:?}"
        ));
    };
    let source = source.trim();
    let target = target.trim();
    if source.is_empty() || target.is_empty() {
        return Err(anyhow::anyhow!(
            "--merge expects SOURCE_KEY,TARGET_KEY, got {raw:?}"
        ));
    }
    Ok((GroupKey(source.to_string()), GroupKey(target.to_string())))
}
