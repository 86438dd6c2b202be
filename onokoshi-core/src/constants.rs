//! Centralized defaults for Onokoshi parsing and statistics.
//!
//! Configuration files may override most of these; the values here are what
//! an empty or missing config resolves to.

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_PARSER: &str = "onokoshi::parser";
pub(crate) const LOG_TARGET_STATS: &str = "onokoshi::stats";
pub(crate) const LOG_TARGET_STORE: &str = "onokoshi::store";
pub(crate) const LOG_TARGET_TRACKER: &str = "onokoshi::tracker";

// Parser markers (LiveSplit subsplit syntax) --------------------------------
pub const DEFAULT_CHILD_MARKER: char = '-';
pub const DEFAULT_GROUP_OPEN: char = '{';
pub const DEFAULT_GROUP_CLOSE: char = '}';

// Statistics ----------------------------------------------------------------
/// Length of every ranked view.
pub const DEFAULT_TOP_K: usize = 3;
/// A route needs strictly more total runs than this to enter the rarity view.
pub const RARITY_MIN_TOTAL_RUNS: u32 = 3;

// Runs ------------------------------------------------------------------------
/// Expected elite count pre-filled when registering a route set.
pub const DEFAULT_EXPECTED_ELITE_COUNT: i32 = 400;
/// Suffix appended to the date in a freshly started run's name.
pub const RUN_NAME_SUFFIX: &str = "RUN";

/// Closed tag vocabulary offered as quick tags on a remnant comment.
pub const DEFAULT_TAGS: [&str; 6] = [
    "#ワンパンミス",
    "#ミリ残し",
    "#狩り漏れ",
    "#置き物ミス",
    "#フライングワープ",
    "#あきらめた",
];

// Storage ---------------------------------------------------------------------
pub const DEFAULT_STORE_FILE: &str = "onokoshi.json";
