//! Onokoshi core
//!
//! Platform-agnostic logic for the Onokoshi remnant tracker: the route text
//! parser, the run record model, the statistics aggregator and the storage
//! seam. This crate has no UI or terminal dependencies.

pub mod config;
pub mod constants;
pub mod ids;
pub mod model;
pub mod numbers;
pub mod parser;
pub mod stats;
pub mod store;
pub mod tags;
pub mod tracker;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoadError, TrackerConfig};
pub use ids::{IdSource, RandomIds, SequentialIds};
pub use model::{Route, RouteRun, RouteSet, Run, RunSummary, Timestamp, default_run_name};
pub use parser::{NameCount, ParseMode, ParserConfig, RouteParser, parse_routes, split_count};
pub use stats::{
    RouteStats, StatsConfig, StatsReport, TagStats, accumulate, aggregate, most_frequent,
    most_recent, most_voluminous, rarest, tag_frequency,
};
pub use store::{Database, JsonFileStore, MemoryStore, RecordStore, StoreError};
pub use tags::{TagHits, TagVocabulary};
pub use tracker::{RouteSetDraft, SavedRun, Tracker, TrackerError};
