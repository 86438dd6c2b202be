//! Tracker engine: wires the parser, a record store and the aggregator.
use anyhow::Result;
use chrono::Utc;
use thiserror::Error;

use crate::config::TrackerConfig;
use crate::constants::LOG_TARGET_TRACKER;
use crate::ids::{IdSource, RandomIds, SequentialIds};
use crate::model::{Route, RouteSet, Run, RunSummary, Timestamp};
use crate::parser::RouteParser;
use crate::stats::{StatsReport, aggregate};
use crate::store::RecordStore;

/// Rejections surfaced to the user rather than storage failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("route set name is empty")]
    EmptyName,
    #[error("route list is empty")]
    EmptyRouteText,
    #[error("no route set with id {0}")]
    UnknownRouteSet(String),
    #[error("no run with id {0}")]
    UnknownRun(String),
}

/// User input for registering or editing a route set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSetDraft {
    pub name: String,
    pub text: String,
    pub expected_elite_count: i32,
}

/// Result of saving a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRun {
    pub run: Run,
    /// No remnant anywhere: the run was cleared.
    pub completed: bool,
}

/// Main engine owning the store handle and configuration.
pub struct Tracker<S, I = RandomIds>
where
    S: RecordStore,
    I: IdSource,
{
    store: S,
    config: TrackerConfig,
    parser: RouteParser,
    ids: I,
    clock: fn() -> Timestamp,
}

impl<S> Tracker<S, RandomIds>
where
    S: RecordStore,
{
    /// Tracker with entropy-seeded ids and the system clock.
    pub fn new(store: S, config: TrackerConfig) -> Self {
        Self::with_ids(store, config, RandomIds::new())
    }
}

impl<S, I> Tracker<S, I>
where
    S: RecordStore,
    I: IdSource,
{
    pub fn with_ids(store: S, config: TrackerConfig, ids: I) -> Self {
        let parser = RouteParser::new(config.parser.clone());
        Self {
            store,
            config,
            parser,
            ids,
            clock: Utc::now,
        }
    }

    /// Replace the clock used to stamp records.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Parse route text without storing anything; ids are placeholders.
    pub fn preview_routes(&self, text: &str) -> Vec<Route> {
        self.parser.parse(text, &mut SequentialIds::new("preview"))
    }

    fn parse_draft(&mut self, draft: &RouteSetDraft) -> Result<(String, String, Vec<Route>)> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(TrackerError::EmptyName.into());
        }
        let text = draft.text.trim();
        if text.is_empty() {
            return Err(TrackerError::EmptyRouteText.into());
        }
        let routes = self.parser.parse(text, &mut self.ids);
        Ok((name.to_string(), text.to_string(), routes))
    }

    /// Parse and persist a new route set.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft is rejected or the store fails.
    pub fn register_route_set(&mut self, draft: &RouteSetDraft) -> Result<RouteSet> {
        let (name, original_text, routes) = self.parse_draft(draft)?;
        let now = (self.clock)();
        let route_set = RouteSet {
            id: self.ids.next_id(),
            name,
            routes,
            expected_elite_count: draft.expected_elite_count,
            created_at: now,
            updated_at: now,
            original_text,
        };
        self.store.save_route_set(&route_set)?;
        log::info!(
            target: LOG_TARGET_TRACKER,
            "registered route set {} ({} routes)",
            route_set.id,
            route_set.routes.len()
        );
        Ok(route_set)
    }

    /// Re-parse a route set from new text, replacing its routes wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown, the draft is rejected or the
    /// store fails.
    pub fn edit_route_set(&mut self, id: &str, draft: &RouteSetDraft) -> Result<RouteSet> {
        let existing = self.route_set(id)?;
        let (name, original_text, routes) = self.parse_draft(draft)?;
        let route_set = RouteSet {
            name,
            routes,
            expected_elite_count: draft.expected_elite_count,
            updated_at: (self.clock)(),
            original_text,
            ..existing
        };
        self.store.save_route_set(&route_set)?;
        log::info!(target: LOG_TARGET_TRACKER, "replaced route set {id}");
        Ok(route_set)
    }

    /// # Errors
    ///
    /// Returns an error if the id is unknown or the store fails.
    pub fn delete_route_set(&self, id: &str) -> Result<()> {
        if self.store.delete_route_set(id)? {
            Ok(())
        } else {
            Err(TrackerError::UnknownRouteSet(id.to_string()).into())
        }
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn route_sets(&self) -> Result<Vec<RouteSet>> {
        Ok(self.store.route_sets()?)
    }

    /// # Errors
    ///
    /// Returns an error if the id is unknown or the store fails.
    pub fn route_set(&self, id: &str) -> Result<RouteSet> {
        self.store
            .route_set(id)?
            .ok_or_else(|| TrackerError::UnknownRouteSet(id.to_string()).into())
    }

    /// Create and persist a fresh run snapshotting a route set.
    ///
    /// # Errors
    ///
    /// Returns an error if the route set is unknown or the store fails.
    pub fn start_run(&mut self, route_set_id: &str) -> Result<Run> {
        let route_set = self.route_set(route_set_id)?;
        let run = Run::from_route_set(self.ids.next_id(), &route_set, (self.clock)());
        self.store.save_run(&run)?;
        log::info!(
            target: LOG_TARGET_TRACKER,
            "started run {} from route set {route_set_id}",
            run.id
        );
        Ok(run)
    }

    /// # Errors
    ///
    /// Returns an error if the id is unknown or the store fails.
    pub fn run(&self, id: &str) -> Result<Run> {
        self.store
            .run(id)?
            .ok_or_else(|| TrackerError::UnknownRun(id.to_string()).into())
    }

    /// Stamp `updated_at` and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn save_run(&self, mut run: Run) -> Result<SavedRun> {
        run.updated_at = (self.clock)();
        self.store.save_run(&run)?;
        let completed = run.is_complete();
        if completed {
            log::info!(target: LOG_TARGET_TRACKER, "run {} saved with no remnants", run.id);
        } else {
            log::debug!(
                target: LOG_TARGET_TRACKER,
                "run {} saved with {} remnant(s)",
                run.id,
                run.total_remaining()
            );
        }
        Ok(SavedRun { run, completed })
    }

    /// Load a run, apply `edit`, then save it.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown, `edit` fails or the store fails.
    pub fn update_run<F>(&self, id: &str, edit: F) -> Result<SavedRun>
    where
        F: FnOnce(&mut Run) -> Result<()>,
    {
        let mut run = self.run(id)?;
        edit(&mut run)?;
        self.save_run(run)
    }

    /// # Errors
    ///
    /// Returns an error if the id is unknown or the store fails.
    pub fn delete_run(&self, id: &str) -> Result<()> {
        if self.store.delete_run(id)? {
            Ok(())
        } else {
            Err(TrackerError::UnknownRun(id.to_string()).into())
        }
    }

    /// Runs, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn runs(&self) -> Result<Vec<Run>> {
        Ok(self.store.runs()?)
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn run_summaries(&self) -> Result<Vec<RunSummary>> {
        Ok(self.runs()?.iter().map(Run::summary).collect())
    }

    /// Aggregate the whole run history.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn statistics(&self) -> Result<StatsReport> {
        let runs = self.runs()?;
        Ok(aggregate(&runs, &self.config.stats))
    }
}
