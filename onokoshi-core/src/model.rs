//! Persisted records: routes, route sets, runs and per-route outcomes.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::RUN_NAME_SUFFIX;
use crate::numbers::saturating_u64_to_i64;

/// Instant attached to saved records.
pub type Timestamp = DateTime<Utc>;

/// A named checkpoint with its expected elite count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub count: u32,
    /// Position of the source line among the non-empty input lines.
    #[serde(default)]
    pub order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

/// A reusable, named bundle of routes together with the text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSet {
    pub id: String,
    pub name: String,
    pub routes: Vec<Route>,
    #[serde(default)]
    pub expected_elite_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Input exactly as registered (trimmed), re-parsed on edit.
    #[serde(default)]
    pub original_text: String,
}

impl RouteSet {
    /// Sum of the expected counts over every route.
    #[must_use]
    pub fn route_count_total(&self) -> u64 {
        self.routes.iter().map(|route| u64::from(route.count)).sum()
    }

    /// Distinct group names in order of first appearance.
    #[must_use]
    pub fn group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.routes.iter().filter_map(|r| r.group_name.as_deref()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Outcome recorded for one route inside a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRun {
    pub route_id: String,
    /// Snapshot of the route name so history survives route deletion.
    pub route_name: String,
    #[serde(default)]
    pub has_remaining: bool,
    #[serde(default)]
    pub remaining_count: u32,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl RouteRun {
    /// Fresh, clean outcome for a route.
    #[must_use]
    pub fn for_route(route: &Route) -> Self {
        Self {
            route_id: route.id.clone(),
            route_name: route.name.clone(),
            has_remaining: false,
            remaining_count: 0,
            comment: String::new(),
            group_name: route.group_name.clone(),
        }
    }

    /// Flip the remnant flag. Turning it on starts the count at 1; turning
    /// it off clears the count.
    pub fn toggle_remaining(&mut self) {
        self.set_remaining(!self.has_remaining);
    }

    /// Set the remnant flag explicitly, applying the same count rules as a toggle.
    pub fn set_remaining(&mut self, has_remaining: bool) {
        self.has_remaining = has_remaining;
        self.remaining_count = u32::from(has_remaining);
    }

    /// Update the remnant count. Ignored while no remnant is flagged.
    pub fn set_remaining_count(&mut self, count: u32) {
        if self.has_remaining {
            self.remaining_count = count;
        }
    }

    /// Append a quick tag, separated from existing text by one space.
    pub fn append_tag(&mut self, tag: &str) {
        if self.comment.is_empty() {
            self.comment = tag.to_string();
        } else {
            self.comment.push(' ');
            self.comment.push_str(tag);
        }
    }

    /// Counted remnants: zero unless the flag is set.
    #[must_use]
    pub const fn effective_remaining(&self) -> u32 {
        if self.has_remaining {
            self.remaining_count
        } else {
            0
        }
    }
}

/// One recorded session against a route set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: String,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub routes: Vec<RouteRun>,
    #[serde(default)]
    pub expected_elite_count: i32,
    /// Known shortfall not attributable to a single route.
    #[serde(default)]
    pub tsurumi_shortage: i32,
    /// Manual correction added on top.
    #[serde(default)]
    pub adlib_addition: i32,
}

impl Run {
    /// Start a run from a route set, snapshotting every route in input order.
    #[must_use]
    pub fn from_route_set(id: String, route_set: &RouteSet, now: Timestamp) -> Self {
        let mut routes: Vec<&Route> = route_set.routes.iter().collect();
        routes.sort_by_key(|route| route.order);
        Self {
            id,
            name: default_run_name(now),
            created_at: now,
            updated_at: now,
            routes: routes.into_iter().map(RouteRun::for_route).collect(),
            expected_elite_count: route_set.expected_elite_count,
            tsurumi_shortage: 0,
            adlib_addition: 0,
        }
    }

    /// Sum of remnant counts across flagged routes.
    #[must_use]
    pub fn total_remaining(&self) -> u64 {
        self.routes
            .iter()
            .map(|rr| u64::from(rr.effective_remaining()))
            .sum()
    }

    /// `expected - remaining - shortage + addition`, unclamped. Negative
    /// values mean more remnants than expected kills.
    #[must_use]
    pub fn final_count(&self) -> i64 {
        i64::from(self.expected_elite_count)
            - saturating_u64_to_i64(self.total_remaining())
            - i64::from(self.tsurumi_shortage)
            + i64::from(self.adlib_addition)
    }

    /// No remnant anywhere in the run.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total_remaining() == 0
    }

    #[must_use]
    pub fn route_run(&self, route_id: &str) -> Option<&RouteRun> {
        self.routes.iter().find(|rr| rr.route_id == route_id)
    }

    pub fn route_run_mut(&mut self, route_id: &str) -> Option<&mut RouteRun> {
        self.routes.iter_mut().find(|rr| rr.route_id == route_id)
    }

    /// Locate a route by id first, then by exact snapshot name.
    pub fn find_route_run_mut(&mut self, key: &str) -> Option<&mut RouteRun> {
        let index = self
            .routes
            .iter()
            .position(|rr| rr.route_id == key)
            .or_else(|| self.routes.iter().position(|rr| rr.route_name == key))?;
        self.routes.get_mut(index)
    }

    /// Compact line used by run listings.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            remaining_count: self.total_remaining(),
            remaining_routes: self.routes.iter().filter(|rr| rr.has_remaining).count(),
            route_count: self.routes.len(),
            final_count: self.final_count(),
            updated_at: self.updated_at,
        }
    }
}

/// Listing view of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: String,
    pub name: String,
    pub remaining_count: u64,
    pub remaining_routes: usize,
    pub route_count: usize,
    pub final_count: i64,
    pub updated_at: Timestamp,
}

/// `"2025-12-09 RUN"` style default name.
#[must_use]
pub fn default_run_name(now: Timestamp) -> String {
    format!("{} {RUN_NAME_SUFFIX}", now.format("%Y-%m-%d"))
}
