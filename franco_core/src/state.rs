//! Tracker state document on disk.
//!
//! Loading never fails on a bad document: a missing or corrupt file yields
//! an empty tracker with a warning, so a damaged state file cannot lock the
//! user out. Saving replaces the file atomically.

use crate::{Error, Result, TrackerState};
use chrono::Utc;
use fs2::FileExt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

impl TrackerState {
    /// Load state from `path` under a shared lock
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file at {:?}, starting fresh", path);
            return Ok(Self::default());
        }

        let contents = match read_locked(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Unable to read state file {:?}: {}. Using defaults.", path, e);
                return Ok(Self::default());
            }
        };

        match serde_json::from_str::<TrackerState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded tracker state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!("Corrupt state file {:?}: {}. Using defaults.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Load state for a mutation.
    ///
    /// Unlike [`TrackerState::load`], a document that fails to parse is moved
    /// aside to `<name>.corrupt-<timestamp>` before starting fresh, so the
    /// following save cannot overwrite it. Read errors are returned.
    pub fn load_for_update(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = read_locked(path)?;
        match serde_json::from_str::<TrackerState>(&contents) {
            Ok(state) => Ok(state),
            Err(e) => {
                let backup = corrupt_backup_path(path);
                std::fs::rename(path, &backup)?;
                tracing::warn!(
                    "Corrupt state file {:?}: {}. Moved to {:?}, starting fresh.",
                    path,
                    e,
                    backup
                );
                Ok(Self::default())
            }
        }
    }

    /// Write state to a temp file beside `path`, sync it and rename it over
    /// the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "state path has no parent directory",
            ))
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved tracker state to {:?}", path);
        Ok(())
    }
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state.json".to_string());
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    path.with_file_name(format!("{}.corrupt-{}", name, stamp))
}

fn read_locked(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    file.lock_shared()?;
    let mut contents = String::new();
    let result = BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    result.map(|_| contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shield::{add_shield, NewShield};
    use crate::{HistoryEntry, HistorySource, Pillar};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
    }

    #[test]
    fn test_save_and_load_keeps_ledger_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/state.json");

        let mut state = TrackerState::default();
        state.ledger.post(HistoryEntry::new(
            Pillar::Finance,
            HistorySource::Objective,
            Uuid::new_v4(),
            350,
            "Emergency fund",
            today(),
        ));
        add_shield(
            &mut state,
            NewShield {
                title: "Impulse buys".into(),
                description: None,
                pillar: Pillar::Finance,
                xp_per_day: 20,
                notifications: false,
            },
            today(),
        )
        .unwrap();
        state.save(&path).unwrap();

        let loaded = TrackerState::load(&path).unwrap();
        assert_eq!(loaded.ledger.pillar(Pillar::Finance).total_xp, 350);
        assert_eq!(loaded.shields.len(), 1);
        assert_eq!(loaded.shields[0].title, "Impulse buys");
        // Pending postings belong to the process that made them
        assert!(!loaded.ledger.has_pending_postings());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = TrackerState::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(state.ledger.total_xp(), 0);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ \"ledger\": [ broken").unwrap();

        let state = TrackerState::load(&path).unwrap();
        assert!(state.shields.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_moved_aside_for_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let original = "{ \"ledger\": [ broken";
        std::fs::write(&path, original).unwrap();

        let mut state = TrackerState::load_for_update(&path).unwrap();
        assert!(state.shields.is_empty());
        assert!(!path.exists());
        state.events.clear();
        state.save(&path).unwrap();

        let backups: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.to_string_lossy().contains("state.json.corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), original);
    }

    #[test]
    fn test_load_for_update_keeps_valid_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = TrackerState::default();
        state.ledger.post(HistoryEntry::new(
            Pillar::Physical,
            HistorySource::Event,
            Uuid::new_v4(),
            40,
            "Run",
            today(),
        ));
        state.save(&path).unwrap();

        let loaded = TrackerState::load_for_update(&path).unwrap();
        assert_eq!(loaded.ledger.pillar(Pillar::Physical).total_xp, 40);
        assert!(path.exists());
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        TrackerState::default().save(&path).unwrap();
        TrackerState::default().save(&path).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);
    }
}
