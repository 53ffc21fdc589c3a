#![forbid(unsafe_code)]

//! Core domain model and business logic for Franco Assistant.
//!
//! This crate provides:
//! - The XP leveling curve and streak rewards (`xp`)
//! - The per-pillar ledger every XP change goes through
//! - Events, objectives, dopamine shields, metrics, kanban and calendar
//! - Persistence (state document, history journal, CSV archive)

pub mod types;
pub mod error;
pub mod xp;
pub mod ledger;
pub mod config;
pub mod logging;
pub mod validation;
pub mod events;
pub mod objectives;
pub mod shield;
pub mod metrics;
pub mod kanban;
pub mod calendar;
pub mod journal;
pub mod archive;
pub mod history;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use config::Config;
pub use ledger::{Ledger, LedgerChange, PillarProgress};
pub use history::{HistoryFilter, HistoryPage};
pub use journal::{HistorySink, JsonlJournal};
pub use store::{RollupReport, Store};
pub use xp::{
    cumulative_streak_reward, daily_streak_reward, level_for_points, level_progress,
    points_required_for_level, LevelProgress,
};
