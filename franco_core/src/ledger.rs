//! Per-pillar XP ledger.
//!
//! Every XP movement in the application goes through [`Ledger::post`],
//! which applies the delta and queues the matching history entry for the
//! journal. Levels are never stored: they are derived from totals through
//! [`crate::xp`].

use crate::xp::{self, Level, LevelProgress, PointTotal};
use crate::{HistoryEntry, Pillar};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated XP for one pillar
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PillarProgress {
    pub total_xp: PointTotal,
}

impl PillarProgress {
    pub fn level(&self) -> Level {
        xp::level_for_points(self.total_xp)
    }

    pub fn progress(&self) -> LevelProgress {
        xp::level_progress(self.total_xp)
    }
}

/// Result of applying one posting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerChange {
    pub pillar: Pillar,
    pub before: PointTotal,
    pub after: PointTotal,
    pub level_before: Level,
    pub level_after: Level,
}

impl LedgerChange {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }

    /// Delta actually applied, after clamping at zero
    pub fn applied(&self) -> PointTotal {
        self.after - self.before
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Ledger {
    #[serde(default)]
    pillars: BTreeMap<Pillar, PillarProgress>,

    /// Entries posted since the last save, waiting for the journal
    #[serde(skip)]
    postings: Vec<HistoryEntry>,
}

impl Ledger {
    /// Apply `entry.xp` to the entry's pillar and queue the entry.
    ///
    /// Totals never go below zero: a deduction larger than the balance
    /// empties the pillar. The queued entry carries the delta actually
    /// applied, so the journal always sums to the ledger.
    pub fn post(&mut self, mut entry: HistoryEntry) -> LedgerChange {
        let progress = self.pillars.entry(entry.pillar).or_default();
        let before = progress.total_xp;
        let after = before.saturating_add(entry.xp).max(0);
        progress.total_xp = after;

        let change = LedgerChange {
            pillar: entry.pillar,
            before,
            after,
            level_before: xp::level_for_points(before),
            level_after: xp::level_for_points(after),
        };

        tracing::info!(
            "Posted {:+} XP to {} ({}): {} -> {}",
            entry.xp,
            entry.pillar,
            entry.source,
            before,
            after
        );
        if change.leveled_up() {
            tracing::info!("{} reached level {}", entry.pillar, change.level_after);
        } else if change.level_after < change.level_before {
            tracing::info!("{} dropped to level {}", entry.pillar, change.level_after);
        }

        if change.applied() != entry.xp {
            tracing::warn!(
                "Clamped {} posting from {:+} to {:+} XP",
                entry.pillar,
                entry.xp,
                change.applied()
            );
            entry.xp = change.applied();
        }
        self.postings.push(entry);
        change
    }

    pub fn pillar(&self, pillar: Pillar) -> PillarProgress {
        self.pillars.get(&pillar).copied().unwrap_or_default()
    }

    /// XP across all pillars
    pub fn total_xp(&self) -> PointTotal {
        self.pillars
            .values()
            .fold(0, |acc: PointTotal, p| acc.saturating_add(p.total_xp))
    }

    pub fn overall_level(&self) -> Level {
        xp::level_for_points(self.total_xp())
    }

    pub fn overall_progress(&self) -> LevelProgress {
        xp::level_progress(self.total_xp())
    }

    /// Drain entries posted since the last call
    pub fn take_postings(&mut self) -> Vec<HistoryEntry> {
        std::mem::take(&mut self.postings)
    }

    pub fn has_pending_postings(&self) -> bool {
        !self.postings.is_empty()
    }
}
