//! Durable storage for the engine state, with file locking.
//!
//! The whole `EngineState` is stored as one JSON record under a versioned
//! key. Change `STORAGE_KEY` whenever the record's shape changes: an old
//! record under a stale key is simply never read. Loading never fails: an
//! absent or unreadable record comes back as `None` and the engine starts from
//! a complete default state.

use crate::types::EngineState;
use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Storage key for the current record shape
pub const STORAGE_KEY: &str = "trainlog_state_v1";

/// Somewhere the engine state can be kept between runs
pub trait StateStore {
    /// The stored state; `None` if absent or unreadable
    fn load(&self) -> Option<EngineState>;

    fn save(&mut self, state: &EngineState) -> Result<()>;
}

fn parse_state(contents: &str, origin: &dyn std::fmt::Debug) -> Option<EngineState> {
    match serde_json::from_str::<EngineState>(contents) {
        Ok(state) => {
            tracing::debug!("Loaded engine state from {:?}", origin);
            Some(state.normalized())
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse state {:?}: {}. Using defaults.",
                origin,
                e
            );
            None
        }
    }
}

/// JSON file on disk, written atomically
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under `dir`, named after the storage key
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(format!("{}.json", STORAGE_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    /// Load state with shared locking
    ///
    /// Returns `None` if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns `None`.
    fn load(&self) -> Option<EngineState> {
        let path = &self.path;
        if !path.exists() {
            tracing::info!("No state file found at {:?}", path);
            return None;
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return None;
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return None;
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        let _ = file.unlock();

        if let Err(e) = read {
            tracing::warn!(
                "Failed to read state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return None;
        }

        parse_state(&contents, path)
    }

    /// Save state with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn save(&mut self, state: &EngineState) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Other(format!("state path {:?} has no parent", self.path))
        })?;
        std::fs::create_dir_all(parent)?;

        // Unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(parent)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(state)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved engine state to {:?}", self.path);
        Ok(())
    }
}

/// In-memory key/value store holding serialized records, for tests and
/// ephemeral runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw record under any key
    pub fn with_raw(key: &str, raw: &str) -> Self {
        let mut records = HashMap::new();
        records.insert(key.to_string(), raw.to_string());
        Self { records }
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Option<EngineState> {
        parse_state(self.records.get(STORAGE_KEY)?, &STORAGE_KEY)
    }

    fn save(&mut self, state: &EngineState) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        self.records.insert(STORAGE_KEY.to_string(), raw);
        Ok(())
    }
}
