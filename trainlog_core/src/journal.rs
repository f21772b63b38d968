//! Append-only journal of finished workouts.
//!
//! Each ended workout is appended as one JSON line, under an exclusive file
//! lock so concurrently running CLI invocations never interleave records.

use crate::timer::SessionSnapshot;
use crate::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// File name of the live journal inside the history directory
pub const JOURNAL_FILE: &str = "sessions.jsonl";

/// Somewhere finished workouts are recorded
pub trait SessionSink {
    fn append(&mut self, snapshot: &SessionSnapshot) -> Result<()>;
}

/// JSONL journal with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Journal at `<history_dir>/sessions.jsonl`
    pub fn in_dir(history_dir: &Path) -> Self {
        Self::new(history_dir.join(JOURNAL_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut line = serde_json::to_string(snapshot)?;
        line.push('\n');
        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Journaled workout {} ({} ms)", snapshot.id, snapshot.elapsed_ms);
        Ok(())
    }
}

/// Read every snapshot in a journal. A missing journal is empty; lines that
/// don't parse are skipped.
pub fn read_snapshots(path: &Path) -> Result<Vec<SessionSnapshot>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut snapshots = Vec::new();
    for (line_num, line) in BufReader::new(&file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SessionSnapshot>(&line) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => {
                tracing::warn!("Skipping journal line {} in {:?}: {}", line_num + 1, path, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} snapshots from {:?}", snapshots.len(), path);
    Ok(snapshots)
}
