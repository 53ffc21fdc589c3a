//! Append-only history journal.
//!
//! Every ledger posting lands here as one JSON line. Appends take an
//! exclusive lock; readers take a shared one and skip lines they cannot
//! parse.

use crate::{HistoryEntry, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Destination for history entries
pub trait HistorySink {
    fn append(&mut self, entries: &[HistoryEntry]) -> Result<()>;
}

/// JSON Lines journal file
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistorySink for JsonlJournal {
    fn append(&mut self, entries: &[HistoryEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        {
            let mut writer = BufWriter::new(&file);
            // A torn last line must not swallow the first new entry
            if !ends_with_newline(&file)? {
                writer.write_all(b"\n")?;
            }
            for entry in entries {
                serde_json::to_writer(&mut writer, entry)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        file.sync_data()?;
        file.unlock()?;

        tracing::debug!("Appended {} entries to journal {:?}", entries.len(), self.path);
        Ok(())
    }
}

fn ends_with_newline(mut file: &File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Read every parseable entry from a journal file, in append order
pub fn read_entries(path: &Path) -> Result<Vec<HistoryEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut entries = Vec::new();
    for (line_num, line) in BufReader::new(&file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HistoryEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Skipping journal line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    Ok(entries)
}
