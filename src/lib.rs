pub mod aggregate;
pub mod board;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod merge;
pub mod model;
pub mod regions;
pub mod selection;
pub mod sort;
pub mod source;

pub use board::{ConsolidationBoard, FetchTicket};
pub use config::{BoardConfig, load_config};
pub use error::{SnapshotError, SourceError};
pub use model::{BoardGroup, ConsolidationGroup, CustomGroup, GroupKey, LaneType};
pub use regions::{RegionIndex, RegionKey, RegionPair, RegionRef};
pub use source::{ConsolidationStore, GroupSource, Snapshot, SnapshotSource};

#[cfg(feature = "cli")]
pub use cli::run;
