//! CSV archive of rolled-up journal entries.
//!
//! A rollup appends every journal entry to the archive, syncs it, and only
//! then renames the journal to `*.wal.processed`. A crash between the two
//! steps leaves duplicates, which history loading removes by id.

use crate::{Error, HistoryEntry, HistorySource, Pillar, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Flat archive row
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    id: String,
    pillar: String,
    source: String,
    reference_id: String,
    xp: i64,
    title: String,
    date: String,
    recorded_at: String,
}

impl From<&HistoryEntry> for CsvRow {
    fn from(entry: &HistoryEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            pillar: entry.pillar.to_string(),
            source: entry.source.to_string(),
            reference_id: entry.reference_id.to_string(),
            xp: entry.xp,
            title: entry.title.clone(),
            date: entry.date.to_string(),
            recorded_at: entry.recorded_at.to_rfc3339(),
        }
    }
}

impl TryFrom<CsvRow> for HistoryEntry {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let uuid = |field: &str, s: &str| {
            Uuid::parse_str(s).map_err(|e| Error::validation(format!("invalid {}: {}", field, e)))
        };
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| Error::validation(format!("invalid date: {}", e)))?;
        let recorded_at = DateTime::parse_from_rfc3339(&row.recorded_at)
            .map_err(|e| Error::validation(format!("invalid recorded_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(HistoryEntry {
            id: uuid("id", &row.id)?,
            pillar: row.pillar.parse::<Pillar>()?,
            source: row.source.parse::<HistorySource>()?,
            reference_id: uuid("reference_id", &row.reference_id)?,
            xp: row.xp,
            title: row.title,
            date,
            recorded_at,
        })
    }
}

/// Where a journal goes once rolled up
pub fn processed_path(journal_path: &Path) -> PathBuf {
    journal_path.with_extension("wal.processed")
}

/// Move every journal entry into the CSV archive.
///
/// Returns the number of entries archived. An empty or missing journal is
/// left alone.
pub fn journal_to_csv_and_archive(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    let entries = crate::journal::read_entries(journal_path)?;
    if entries.is_empty() {
        tracing::info!("Journal is empty, nothing to roll up");
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
    for entry in &entries {
        writer.serialize(CsvRow::from(entry))?;
    }
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;
    tracing::info!("Archived {} history entries to {:?}", entries.len(), csv_path);

    let processed = processed_path(journal_path);
    std::fs::rename(journal_path, &processed)?;
    tracing::debug!("Journal moved to {:?}", processed);

    Ok(entries.len())
}

/// Every parseable entry in the archive; bad rows are skipped
pub fn read_archive(csv_path: &Path) -> Result<Vec<HistoryEntry>> {
    if !csv_path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(csv_path)?;
    let mut entries = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        match row.map_err(Error::from).and_then(HistoryEntry::try_from) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!("Skipping archive row: {}", e),
        }
    }
    Ok(entries)
}

/// Delete processed journals in `dir`
pub fn cleanup_processed_journals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            count += 1;
        }
    }
    if count > 0 {
        tracing::info!("Removed {} processed journals", count);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{HistorySink, JsonlJournal};
    use std::fs::File;

    fn entry(title: &str, xp: i64) -> HistoryEntry {
        HistoryEntry::new(
            Pillar::Relationships,
            HistorySource::Calendar,
            Uuid::new_v4(),
            xp,
            title,
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        )
    }

    #[test]
    fn test_rollup_moves_journal_into_csv() {
        let dir = tempfile::tempdir().unwrap();
        let journal_path = dir.path().join("history.wal");
        let csv_path = dir.path().join("history.csv");

        // Commas and quotes must survive the CSV trip
        let original = entry("Dinner, \"the\" usual", 15);
        JsonlJournal::new(&journal_path)
            .append(&[original.clone(), entry("Call", 5)])
            .unwrap();

        assert_eq!(journal_to_csv_and_archive(&journal_path, &csv_path).unwrap(), 2);
        assert!(!journal_path.exists());
        assert!(processed_path(&journal_path).exists());

        let archived = read_archive(&csv_path).unwrap();
        assert_eq!(archived.len(), 2);
        assert_eq!(archived[0].id, original.id);
        assert_eq!(archived[0].title, original.title);
        assert_eq!(archived[0].pillar, Pillar::Relationships);
        assert_eq!(archived[0].source, HistorySource::Calendar);
    }

    #[test]
    fn test_second_rollup_appends_without_headers() {
        let dir = tempfile::tempdir().unwrap();
        let journal_path = dir.path().join("history.wal");
        let csv_path = dir.path().join("history.csv");

        JsonlJournal::new(&journal_path).append(&[entry("A", 1)]).unwrap();
        journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();
        JsonlJournal::new(&journal_path).append(&[entry("B", 2)]).unwrap();
        journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 2);
        assert_eq!(read_archive(&csv_path).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_journal_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let journal_path = dir.path().join("history.wal");
        File::create(&journal_path).unwrap();

        let count = journal_to_csv_and_archive(&journal_path, &dir.path().join("h.csv")).unwrap();
        assert_eq!(count, 0);
        assert!(journal_path.exists());
    }

    #[test]
    fn test_cleanup_only_touches_processed() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.wal.processed")).unwrap();
        File::create(dir.path().join("b.wal.processed")).unwrap();
        File::create(dir.path().join("history.wal")).unwrap();

        assert_eq!(cleanup_processed_journals(dir.path()).unwrap(), 2);
        assert!(dir.path().join("history.wal").exists());
        assert_eq!(cleanup_processed_journals(&dir.path().join("missing")).unwrap(), 0);
    }
}
