//! On-disk layout and transactions.
//!
//! ```text
//! <data>/state/state.json     tracker state
//! <data>/state/history.wal    journal of postings not yet rolled up
//! <data>/state/.lock          held exclusively for every mutation
//! <data>/history.csv          rolled-up history
//! ```

use crate::history::{self, HistoryFilter, HistoryPage};
use crate::journal::{HistorySink, JsonlJournal};
use crate::{archive, Result, TrackerState};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Outcome of a rollup
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RollupReport {
    pub archived: usize,
    pub cleaned: usize,
}

#[derive(Clone, Debug)]
pub struct Store {
    state_dir: PathBuf,
    state_path: PathBuf,
    journal_path: PathBuf,
    lock_path: PathBuf,
    csv_path: PathBuf,
}

impl Store {
    /// Create the directory layout under `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let state_dir = data_dir.join("state");
        std::fs::create_dir_all(&state_dir)?;

        tracing::debug!("Opened store at {:?}", data_dir);
        Ok(Self {
            state_path: state_dir.join("state.json"),
            journal_path: state_dir.join("history.wal"),
            lock_path: state_dir.join(".lock"),
            csv_path: data_dir.join("history.csv"),
            state_dir,
        })
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Snapshot of the current state
    pub fn load(&self) -> Result<TrackerState> {
        TrackerState::load(&self.state_path)
    }

    /// Run `f` on the state under the store lock.
    ///
    /// On success the postings `f` made are appended to the journal and the
    /// state is saved. If `f` fails nothing is written. A state document
    /// that no longer parses is moved aside rather than overwritten.
    pub fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TrackerState) -> Result<T>,
    {
        let lock = self.lock()?;

        let mut state = TrackerState::load_for_update(&self.state_path)?;
        let value = f(&mut state)?;

        // Journal before state: a failed append leaves the state untouched
        let postings = state.ledger.take_postings();
        JsonlJournal::new(&self.journal_path).append(&postings)?;
        state.save(&self.state_path)?;

        lock.unlock()?;
        if !postings.is_empty() {
            tracing::debug!("Committed {} postings", postings.len());
        }
        Ok(value)
    }

    /// Page through the merged journal and archive
    pub fn history(&self, filter: &HistoryFilter) -> Result<HistoryPage> {
        filter.validate()?;
        let entries = history::load_history(&self.journal_path, &self.csv_path)?;
        history::query(entries, filter)
    }

    /// Move the journal into the CSV archive, optionally deleting processed
    /// journals afterwards
    pub fn rollup(&self, cleanup: bool) -> Result<RollupReport> {
        let lock = self.lock()?;
        let archived = archive::journal_to_csv_and_archive(&self.journal_path, &self.csv_path)?;
        let cleaned = if cleanup {
            archive::cleanup_processed_journals(&self.state_dir)?
        } else {
            0
        };
        lock.unlock()?;
        Ok(RollupReport { archived, cleaned })
    }

    fn lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    }
}
