//! Rolls the workout journal up into a CSV history.
//!
//! The CSV is fsynced before the journal is renamed out of the way, so a crash
//! part way through can at worst duplicate rows, never lose them.

use crate::journal::read_snapshots;
use crate::timer::SessionSnapshot;
use crate::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// File name of the rolled-up history inside the data directory
pub const CSV_FILE: &str = "sessions.csv";

#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    date: String,
    week: u32,
    day: String,
    elapsed_seconds: i64,
}

impl From<&SessionSnapshot> for CsvRow {
    fn from(snapshot: &SessionSnapshot) -> Self {
        CsvRow {
            id: snapshot.id.to_string(),
            date: snapshot.date.to_string(),
            week: snapshot.week,
            day: snapshot.day_key.clone(),
            elapsed_seconds: snapshot.elapsed_ms / 1000,
        }
    }
}

/// Where a journal goes once its rows are in the CSV
pub fn processed_path(journal_path: &Path) -> PathBuf {
    let mut name = journal_path.as_os_str().to_os_string();
    name.push(".processed");
    PathBuf::from(name)
}

/// Append every journaled workout to `csv_path` (writing headers for a new
/// file), sync it, then rename the journal to `*.processed`.
///
/// Returns the number of workouts rolled up. An empty or missing journal is
/// left where it is.
pub fn journal_to_csv_and_archive(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    let snapshots = read_snapshots(journal_path)?;
    if snapshots.is_empty() {
        tracing::info!("No journaled workouts to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);
    for snapshot in &snapshots {
        writer.serialize(CsvRow::from(snapshot))?;
    }
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} workouts to {:?}", snapshots.len(), csv_path);

    let archived = processed_path(journal_path);
    std::fs::rename(journal_path, &archived)?;
    tracing::info!("Archived journal to {:?}", archived);

    Ok(snapshots.len())
}

/// Delete every `*.processed` journal in `dir`.
pub fn cleanup_processed(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed journal {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journals", count);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{JsonlSink, SessionSink, JOURNAL_FILE};
    use crate::timer::CountUpTimer;
    use std::fs::File;

    fn journal_workout(sink: &mut JsonlSink, day_key: &str, seconds: i64) {
        let mut timer = CountUpTimer::default();
        timer.start(0);
        let snapshot =
            timer.end_and_snapshot(seconds * 1000, "2026-01-19".parse().unwrap(), day_key, 3);
        sink.append(&snapshot).unwrap();
    }

    #[test]
    fn test_rollup_creates_csv_and_archives_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal = temp_dir.path().join(JOURNAL_FILE);
        let csv_path = temp_dir.path().join(CSV_FILE);

        let mut sink = JsonlSink::new(&journal);
        journal_workout(&mut sink, "mon", 3000);
        journal_workout(&mut sink, "tue", 2400);

        assert_eq!(journal_to_csv_and_archive(&journal, &csv_path).unwrap(), 2);
        assert!(!journal.exists());
        assert!(temp_dir.path().join("sessions.jsonl.processed").exists());

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("id,date,week,day,elapsed_seconds"));
        assert!(lines.next().unwrap().ends_with(",2026-01-19,3,mon,3000"));
    }

    #[test]
    fn test_second_rollup_appends_without_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal = temp_dir.path().join(JOURNAL_FILE);
        let csv_path = temp_dir.path().join(CSV_FILE);

        journal_workout(&mut JsonlSink::new(&journal), "mon", 60);
        journal_to_csv_and_archive(&journal, &csv_path).unwrap();
        journal_workout(&mut JsonlSink::new(&journal), "thu", 90);
        journal_to_csv_and_archive(&journal, &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 2);
    }

    #[test]
    fn test_empty_journal_is_left_alone() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal = temp_dir.path().join(JOURNAL_FILE);
        File::create(&journal).unwrap();

        let count = journal_to_csv_and_archive(&journal, &temp_dir.path().join(CSV_FILE)).unwrap();
        assert_eq!(count, 0);
        assert!(journal.exists());
    }

    #[test]
    fn test_cleanup_processed() {
        let temp_dir = tempfile::tempdir().unwrap();
        File::create(temp_dir.path().join("a.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join("b.jsonl.processed")).unwrap();
        File::create(temp_dir.path().join(JOURNAL_FILE)).unwrap();

        assert_eq!(cleanup_processed(temp_dir.path()).unwrap(), 2);
        assert!(temp_dir.path().join(JOURNAL_FILE).exists());
        assert_eq!(cleanup_processed(&temp_dir.path().join("missing")).unwrap(), 0);
    }
}
