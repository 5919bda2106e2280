/// Persistence gateway: progress snapshots in a synchronous key-value store.
///
/// ## Record format
///   One JSON object under `STORAGE_KEY`:
///   ```text
///   { "stations": [{"id": 1, "completed": true, "learned": {"keyFact": "..."}}],
///     "score": 100,
///     "badges": {"allComplete": false, "highRouteComplete": false} }
///   ```
///
/// ## Failure policy
///   - save: backend missing or failing → `SaveError::StorageUnavailable`.
///     Callers log and carry on; state is never rolled back.
///   - load: missing record, unreadable backend, or bad JSON all mean
///     "no prior progress". `try_load` keeps the distinction for callers
///     that want it; `load` flattens it to `None`.
///
/// ## Backends
///   `FileStorage`: one `<key>.json` file per key, written via temp+rename.
///   `MemoryStorage`: shared in-memory map for tests, can be told to fail.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::entity::{Badges, LearnedFact, StationStatus};
use crate::sim::world::WorldState;

pub const STORAGE_KEY: &str = "mars_explorer_progress";

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub stations: Vec<StationProgress>,
    pub score: u32,
    pub badges: Badges,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationProgress {
    pub id: u32,
    pub completed: bool,
    pub learned: Option<LearnedFact>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage backend rejected the operation")]
    Rejected,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("storage unavailable: {reason}")]
    StorageUnavailable { reason: String },
    #[error("corrupt progress snapshot: {source}")]
    CorruptSnapshot {
        #[source]
        source: serde_json::Error,
    },
}

impl From<StorageError> for SaveError {
    fn from(e: StorageError) -> Self {
        SaveError::StorageUnavailable { reason: e.to_string() }
    }
}

/// Synchronous key-value store.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

// ══════════════════════════════════════════════════════════════
// Gateway
// ══════════════════════════════════════════════════════════════

pub struct Persistence {
    backend: Option<Box<dyn Storage>>,
}

impl Persistence {
    pub fn new(backend: Box<dyn Storage>) -> Self {
        Persistence { backend: Some(backend) }
    }

    /// A gateway with no backend: every save fails, every load is empty.
    pub fn unavailable() -> Self {
        Persistence { backend: None }
    }

    pub fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), SaveError> {
        let backend = self.backend.as_mut().ok_or_else(|| SaveError::StorageUnavailable {
            reason: "no storage backend".into(),
        })?;
        let json = serde_json::to_string(snapshot)
            .map_err(|source| SaveError::CorruptSnapshot { source })?;
        backend.set(STORAGE_KEY, &json)?;
        debug!(score = snapshot.score, "progress saved");
        Ok(())
    }

    pub fn try_load(&self) -> Result<Option<ProgressSnapshot>, SaveError> {
        let backend = self.backend.as_ref().ok_or_else(|| SaveError::StorageUnavailable {
            reason: "no storage backend".into(),
        })?;
        let raw = match backend.get(STORAGE_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        serde_json::from_str::<ProgressSnapshot>(&raw)
            .map(Some)
            .map_err(|source| SaveError::CorruptSnapshot { source })
    }

    /// Load prior progress. Any failure is logged and reads as "none".
    pub fn load(&self) -> Option<ProgressSnapshot> {
        match self.try_load() {
            Ok(Some(snap)) => {
                info!(stations = snap.stations.len(), score = snap.score, "progress loaded");
                Some(snap)
            }
            Ok(None) => {
                info!("no saved progress, starting fresh");
                None
            }
            Err(e) => {
                warn!(error = %e, "discarding saved progress");
                None
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Snapshot capture / restore (WorldState ↔ ProgressSnapshot)
// ══════════════════════════════════════════════════════════════

pub fn capture_snapshot(w: &WorldState) -> ProgressSnapshot {
    ProgressSnapshot {
        stations: w.stations.iter().map(|s| StationProgress {
            id: s.id,
            completed: s.completed(),
            learned: s.learned.clone(),
        }).collect(),
        score: w.score,
        badges: w.badges,
    }
}

/// Seed a freshly loaded level with saved progress.
/// Unknown station ids are skipped; stations missing from the snapshot stay
/// pending. A snapshot where every station is done also opens the door.
/// Badges are re-derived from the restored stations; stored flags the
/// stations do not support are dropped.
pub fn restore_snapshot(w: &mut WorldState, snap: &ProgressSnapshot) {
    for saved in snap.stations.iter().filter(|s| s.completed) {
        let idx = match w.station_index(saved.id) {
            Some(i) => i,
            None => {
                debug!(id = saved.id, "snapshot names unknown station");
                continue;
            }
        };
        let station = &mut w.stations[idx];
        station.status = StationStatus::Completed;
        station.learned = saved.learned.clone()
            .or_else(|| station.facts.first().map(|f| LearnedFact { key_fact: f.clone() }));
    }

    w.score = w.score.max(snap.score);
    let derived = Badges {
        all_complete: w.all_stations_completed(),
        high_route_complete: w.high_route_completed(),
    };
    if snap.badges != derived {
        debug!(stored = ?snap.badges, derived = ?derived, "snapshot badges disagree with stations");
    }
    w.badges.all_complete |= derived.all_complete;
    w.badges.high_route_complete |= derived.high_route_complete;

    if w.all_stations_completed() {
        w.door.present = false;
    }
}

/// Startup path: apply whatever progress the gateway holds to a freshly
/// loaded level. Returns false when starting fresh.
pub fn resume(w: &mut WorldState, persistence: &Persistence) -> bool {
    match persistence.load() {
        Some(snap) => {
            restore_snapshot(w, &snap);
            true
        }
        None => false,
    }
}

// ══════════════════════════════════════════════════════════════
// File backend
// ══════════════════════════════════════════════════════════════

pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    /// Pick a writable save directory, searching like a portable install.
    pub fn discover() -> Self {
        FileStorage::new(save_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        write_atomic(&path, value).map_err(|source| StorageError::Write { path, source })
    }
}

fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn save_dir() -> PathBuf {
    // 1. Exe directory (local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_mars_explorer");
            if fs::write(&test_path, "").is_ok() {
                let _ = fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/mars-explorer");
        if fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Memory backend
// ══════════════════════════════════════════════════════════════

/// Clones share the same map, so a test can keep a handle while the
/// gateway owns the boxed backend.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    failing: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent get/set fail with `Rejected`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.failing.get() { return Err(StorageError::Rejected); }
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing.get() { return Err(StorageError::Rejected); }
        self.put_raw(key, value);
        Ok(())
    }
}
