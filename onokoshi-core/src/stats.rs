//! Remnant statistics over the full run history.
//!
//! One accumulation pass builds a [`RouteStats`] per route id (first-seen
//! order), then four independent ranked views and a tag ranking are cut
//! from it. Every sort is stable, so ties keep first-seen order.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::ConfigError;
use crate::constants::{DEFAULT_TAGS, DEFAULT_TOP_K, LOG_TARGET_STATS, RARITY_MIN_TOTAL_RUNS};
use crate::model::{Run, Timestamp};
use crate::numbers::rate;
use crate::tags::TagVocabulary;

/// Tunables for the aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Length of every ranked view.
    #[serde(default = "StatsConfig::default_top_k")]
    pub top_k: usize,
    /// Routes need strictly more total runs than this to be ranked as rare.
    #[serde(default = "StatsConfig::default_rarity_min_runs")]
    pub rarity_min_runs: u32,
    #[serde(default = "StatsConfig::default_tags")]
    pub tags: Vec<String>,
}

impl StatsConfig {
    const fn default_top_k() -> usize {
        DEFAULT_TOP_K
    }

    const fn default_rarity_min_runs() -> u32 {
        RARITY_MIN_TOTAL_RUNS
    }

    fn default_tags() -> Vec<String> {
        DEFAULT_TAGS.iter().map(ToString::to_string).collect()
    }

    #[must_use]
    pub fn vocabulary(&self) -> TagVocabulary {
        TagVocabulary::new(self.tags.iter().cloned())
    }

    /// # Errors
    ///
    /// Returns an error when `top_k` is zero or the tag list holds blank or
    /// duplicate entries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::ZeroTopK);
        }
        for (index, tag) in self.tags.iter().enumerate() {
            if tag.trim().is_empty() {
                return Err(ConfigError::BlankTag { index });
            }
            if self.tags[..index].contains(tag) {
                return Err(ConfigError::DuplicateTag(tag.clone()));
            }
        }
        Ok(())
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            top_k: Self::default_top_k(),
            rarity_min_runs: Self::default_rarity_min_runs(),
            tags: Self::default_tags(),
        }
    }
}

/// Per-route accumulator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub route_id: String,
    pub route_name: String,
    pub total_runs: u32,
    pub remaining_runs: u32,
    pub total_remaining_count: u64,
    pub last_remaining_timestamp: Option<Timestamp>,
}

impl RouteStats {
    fn new(route_id: &str, route_name: &str) -> Self {
        Self {
            route_id: route_id.to_string(),
            route_name: route_name.to_string(),
            total_runs: 0,
            remaining_runs: 0,
            total_remaining_count: 0,
            last_remaining_timestamp: None,
        }
    }

    /// Share of runs that left a remnant on this route.
    #[must_use]
    pub fn remaining_rate(&self) -> f64 {
        rate(self.remaining_runs, self.total_runs)
    }
}

/// Occurrences of one vocabulary tag in remnant comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagStats {
    pub tag: String,
    pub count: u32,
}

/// Everything one aggregation pass produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    /// All accumulators in first-seen order.
    pub routes: Vec<RouteStats>,
    /// Most recent remnants first.
    pub recent: Vec<RouteStats>,
    /// Highest remnant rate first.
    pub frequent: Vec<RouteStats>,
    /// Largest remnant totals first.
    pub voluminous: Vec<RouteStats>,
    /// Lowest remnant rate first, among routes with enough samples.
    pub rare: Vec<RouteStats>,
    pub tags: Vec<TagStats>,
}

impl StatsReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Fold every route outcome into per-route accumulators, in first-seen order.
#[must_use]
pub fn accumulate(runs: &[Run]) -> Vec<RouteStats> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut stats: Vec<RouteStats> = Vec::new();

    for run in runs {
        for rr in &run.routes {
            let slot = *index.entry(rr.route_id.as_str()).or_insert_with(|| {
                stats.push(RouteStats::new(&rr.route_id, &rr.route_name));
                stats.len() - 1
            });
            let entry = &mut stats[slot];
            entry.total_runs += 1;
            if rr.has_remaining {
                entry.remaining_runs += 1;
                entry.total_remaining_count += u64::from(rr.remaining_count);
                let newer = entry
                    .last_remaining_timestamp
                    .is_none_or(|seen| run.updated_at > seen);
                if newer {
                    entry.last_remaining_timestamp = Some(run.updated_at);
                }
            }
        }
    }

    stats
}

fn top_k<F, C>(stats: &[RouteStats], k: usize, keep: F, order: C) -> Vec<RouteStats>
where
    F: Fn(&RouteStats) -> bool,
    C: Fn(&RouteStats, &RouteStats) -> Ordering,
{
    let mut picked: Vec<RouteStats> = stats.iter().filter(|s| keep(s)).cloned().collect();
    picked.sort_by(|a, b| order(a, b));
    picked.truncate(k);
    picked
}

/// Routes with the most recent remnant.
#[must_use]
pub fn most_recent(stats: &[RouteStats], k: usize) -> Vec<RouteStats> {
    top_k(
        stats,
        k,
        |s| s.last_remaining_timestamp.is_some(),
        |a, b| b.last_remaining_timestamp.cmp(&a.last_remaining_timestamp),
    )
}

/// Routes with the highest remnant rate.
#[must_use]
pub fn most_frequent(stats: &[RouteStats], k: usize) -> Vec<RouteStats> {
    top_k(
        stats,
        k,
        |s| s.remaining_runs > 0,
        |a, b| b.remaining_rate().total_cmp(&a.remaining_rate()),
    )
}

/// Routes with the largest total remnant count.
#[must_use]
pub fn most_voluminous(stats: &[RouteStats], k: usize) -> Vec<RouteStats> {
    top_k(
        stats,
        k,
        |s| s.total_remaining_count > 0,
        |a, b| b.total_remaining_count.cmp(&a.total_remaining_count),
    )
}

/// Routes that rarely leave remnants, restricted to routes seen in more than
/// `min_runs` runs.
#[must_use]
pub fn rarest(stats: &[RouteStats], k: usize, min_runs: u32) -> Vec<RouteStats> {
    top_k(
        stats,
        k,
        |s| s.remaining_runs > 0 && s.total_runs > min_runs,
        |a, b| a.remaining_rate().total_cmp(&b.remaining_rate()),
    )
}

/// Count vocabulary tags across remnant comments; zero counts are dropped.
#[must_use]
pub fn tag_frequency(runs: &[Run], vocabulary: &TagVocabulary, k: usize) -> Vec<TagStats> {
    let mut counts = vec![0u32; vocabulary.len()];
    for rr in runs.iter().flat_map(|run| &run.routes) {
        if !rr.has_remaining {
            continue;
        }
        for hit in vocabulary.hits(&rr.comment) {
            counts[hit] += 1;
        }
    }

    let mut ranked: Vec<TagStats> = vocabulary
        .tags()
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(tag, count)| TagStats {
            tag: tag.clone(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(k);
    ranked
}

/// Full aggregation with the given configuration.
#[must_use]
pub fn aggregate(runs: &[Run], config: &StatsConfig) -> StatsReport {
    let routes = accumulate(runs);
    log::debug!(
        target: LOG_TARGET_STATS,
        "aggregated {} run(s) into {} route accumulator(s)",
        runs.len(),
        routes.len()
    );
    let k = config.top_k;
    StatsReport {
        recent: most_recent(&routes, k),
        frequent: most_frequent(&routes, k),
        voluminous: most_voluminous(&routes, k),
        rare: rarest(&routes, k, config.rarity_min_runs),
        tags: tag_frequency(runs, &config.vocabulary(), k),
        routes,
    }
}
