//! Persistence for route sets and runs.
//!
//! The tracker talks to storage only through [`RecordStore`]. Two backends
//! ship with the crate: [`MemoryStore`] for tests and throwaway sessions, and
//! [`JsonFileStore`], an explicitly opened handle over a single JSON document.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::LOG_TARGET_STORE;
use crate::model::{RouteSet, Run};

/// Storage operations needed by the tracker.
pub trait RecordStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert or replace a route set by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the route set cannot be persisted.
    fn save_route_set(&self, route_set: &RouteSet) -> Result<(), Self::Error>;

    /// All route sets in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing data cannot be read.
    fn route_sets(&self) -> Result<Vec<RouteSet>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backing data cannot be read.
    fn route_set(&self, id: &str) -> Result<Option<RouteSet>, Self::Error>;

    /// Remove a route set; `Ok(false)` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn delete_route_set(&self, id: &str) -> Result<bool, Self::Error>;

    /// Insert or replace a run by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be persisted.
    fn save_run(&self, run: &Run) -> Result<(), Self::Error>;

    /// All runs, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing data cannot be read.
    fn runs(&self) -> Result<Vec<Run>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the backing data cannot be read.
    fn run(&self, id: &str) -> Result<Option<Run>, Self::Error>;

    /// Remove a run; `Ok(false)` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn delete_run(&self, id: &str) -> Result<bool, Self::Error>;
}

/// On-disk document layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub route_sets: Vec<RouteSet>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Database {
    fn upsert_route_set(&mut self, route_set: &RouteSet) {
        match self.route_sets.iter_mut().find(|s| s.id == route_set.id) {
            Some(slot) => *slot = route_set.clone(),
            None => self.route_sets.push(route_set.clone()),
        }
    }

    fn upsert_run(&mut self, run: &Run) {
        match self.runs.iter_mut().find(|r| r.id == run.id) {
            Some(slot) => *slot = run.clone(),
            None => self.runs.push(run.clone()),
        }
    }

    fn remove_route_set(&mut self, id: &str) -> bool {
        let before = self.route_sets.len();
        self.route_sets.retain(|s| s.id != id);
        self.route_sets.len() != before
    }

    fn remove_run(&mut self, id: &str) -> bool {
        let before = self.runs.len();
        self.runs.retain(|r| r.id != id);
        self.runs.len() != before
    }

    fn runs_newest_first(&self) -> Vec<Run> {
        let mut runs = self.runs.clone();
        runs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        runs
    }
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    db: RefCell<Database>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Database {
        self.db.borrow().clone()
    }
}

impl RecordStore for MemoryStore {
    type Error = Infallible;

    fn save_route_set(&self, route_set: &RouteSet) -> Result<(), Self::Error> {
        self.db.borrow_mut().upsert_route_set(route_set);
        Ok(())
    }

    fn route_sets(&self) -> Result<Vec<RouteSet>, Self::Error> {
        Ok(self.db.borrow().route_sets.clone())
    }

    fn route_set(&self, id: &str) -> Result<Option<RouteSet>, Self::Error> {
        Ok(self.db.borrow().route_sets.iter().find(|s| s.id == id).cloned())
    }

    fn delete_route_set(&self, id: &str) -> Result<bool, Self::Error> {
        Ok(self.db.borrow_mut().remove_route_set(id))
    }

    fn save_run(&self, run: &Run) -> Result<(), Self::Error> {
        self.db.borrow_mut().upsert_run(run);
        Ok(())
    }

    fn runs(&self) -> Result<Vec<Run>, Self::Error> {
        Ok(self.db.borrow().runs_newest_first())
    }

    fn run(&self, id: &str) -> Result<Option<Run>, Self::Error> {
        Ok(self.db.borrow().runs.iter().find(|r| r.id == id).cloned())
    }

    fn delete_run(&self, id: &str) -> Result<bool, Self::Error> {
        Ok(self.db.borrow_mut().remove_run(id))
    }
}

/// Errors raised by [`JsonFileStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write store {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store {path} is not a valid onokoshi database")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode store contents")]
    Encode(#[source] serde_json::Error),
}

/// File backend: the whole database lives in one pretty-printed JSON file.
///
/// The file is read once when the handle is opened; every mutation rewrites
/// it through a sibling temp file and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    db: RefCell<Database>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty database.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let db = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
            if raw.trim().is_empty() {
                Database::default()
            } else {
                serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            log::debug!(
                target: LOG_TARGET_STORE,
                "{} does not exist yet, starting empty",
                path.display()
            );
            Database::default()
        };
        Ok(Self {
            path,
            db: RefCell::new(db),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let payload =
            serde_json::to_vec_pretty(&*self.db.borrow()).map_err(StoreError::Encode)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, payload).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        log::debug!(target: LOG_TARGET_STORE, "wrote {}", self.path.display());
        Ok(())
    }

    fn mutate<T>(&self, change: impl FnOnce(&mut Database) -> T) -> Result<T, StoreError> {
        let out = change(&mut self.db.borrow_mut());
        self.persist()?;
        Ok(out)
    }
}

impl RecordStore for JsonFileStore {
    type Error = StoreError;

    fn save_route_set(&self, route_set: &RouteSet) -> Result<(), Self::Error> {
        self.mutate(|db| db.upsert_route_set(route_set))
    }

    fn route_sets(&self) -> Result<Vec<RouteSet>, Self::Error> {
        Ok(self.db.borrow().route_sets.clone())
    }

    fn route_set(&self, id: &str) -> Result<Option<RouteSet>, Self::Error> {
        Ok(self.db.borrow().route_sets.iter().find(|s| s.id == id).cloned())
    }

    fn delete_route_set(&self, id: &str) -> Result<bool, Self::Error> {
        self.mutate(|db| db.remove_route_set(id))
    }

    fn save_run(&self, run: &Run) -> Result<(), Self::Error> {
        self.mutate(|db| db.upsert_run(run))
    }

    fn runs(&self) -> Result<Vec<Run>, Self::Error> {
        Ok(self.db.borrow().runs_newest_first())
    }

    fn run(&self, id: &str) -> Result<Option<Run>, Self::Error> {
        Ok(self.db.borrow().runs.iter().find(|r| r.id == id).cloned())
    }

    fn delete_run(&self, id: &str) -> Result<bool, Self::Error> {
        self.mutate(|db| db.remove_run(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Route, RouteRun};
    use chrono::{TimeZone, Utc};

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "onokoshi-store-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn route_set(id: &str) -> RouteSet {
        let now = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();
        RouteSet {
            id: id.to_string(),
            name: format!("set {id}"),
            routes: vec![Route {
                id: format!("{id}-r0"),
                name: "Katsu".to_string(),
                count: 5,
                order: 0,
                group_name: None,
            }],
            expected_elite_count: 400,
            created_at: now,
            updated_at: now,
            original_text: "Katsu 5".to_string(),
        }
    }

    fn run(id: &str, day: u32) -> Run {
        let now = Utc.with_ymd_and_hms(2025, 12, day, 0, 0, 0).unwrap();
        let set = route_set("s");
        let mut run = Run::from_route_set(id.to_string(), &set, now);
        run.routes[0] = RouteRun {
            has_remaining: true,
            remaining_count: 2,
            ..run.routes[0].clone()
        };
        run
    }

    #[test]
    fn memory_store_upserts_and_deletes() {
        let store = MemoryStore::new();
        store.save_route_set(&route_set("a")).unwrap();
        let mut renamed = route_set("a");
        renamed.name = "renamed".to_string();
        store.save_route_set(&renamed).unwrap();
        store.save_route_set(&route_set("b")).unwrap();

        let sets = store.route_sets().unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name, "renamed");
        assert!(store.delete_route_set("a").unwrap());
        assert!(!store.delete_route_set("a").unwrap());
        assert!(store.route_set("a").unwrap().is_none());
    }

    #[test]
    fn runs_come_back_newest_first() {
        let store = MemoryStore::new();
        store.save_run(&run("old", 1)).unwrap();
        store.save_run(&run("new", 9)).unwrap();
        store.save_run(&run("mid", 5)).unwrap();
        let ids: Vec<String> = store.runs().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn json_store_round_trips_through_disk() {
        let path = temp_path("roundtrip").join("db.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            assert!(store.route_sets().unwrap().is_empty());
            store.save_route_set(&route_set("a")).unwrap();
            store.save_run(&run("r1", 3)).unwrap();
        }
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.route_sets().unwrap(), vec![route_set("a")]);
        let loaded = reopened.run("r1").unwrap().expect("run persisted");
        assert_eq!(loaded.total_remaining(), 2);
        assert!(reopened.delete_run("r1").unwrap());
        assert!(JsonFileStore::open(&path).unwrap().runs().unwrap().is_empty());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn json_store_rejects_garbage() {
        let path = temp_path("garbage");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn json_store_rejects_malformed_timestamps() {
        let path = temp_path("timestamps");
        let doc = r#"{"routeSets": [], "runs": [{"id": "x", "name": "x",
            "createdAt": "yesterday", "updatedAt": "yesterday", "routes": []}]}"#;
        fs::write(&path, doc).unwrap();
        assert!(JsonFileStore::open(&path).is_err());
        let _ = fs::remove_file(&path);
    }
}
