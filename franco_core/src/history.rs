//! History feed over the journal and the CSV archive.
//!
//! Entries are merged from both files and deduplicated by id, so a rollup
//! interrupted after writing the archive does not double-count anything.
//! Paging is by cursor: the id of the last entry the caller saw.

use crate::validation::optional_text;
use crate::{Error, HistoryEntry, HistorySource, Pillar, Result, SortOrder};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone, Debug)]
pub struct HistoryFilter {
    pub pillar: Option<Pillar>,
    pub source: Option<HistorySource>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort: SortOrder,
    pub cursor: Option<Uuid>,
    pub limit: usize,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            pillar: None,
            source: None,
            date_from: None,
            date_to: None,
            search: None,
            sort: SortOrder::Recent,
            cursor: None,
            limit: 20,
        }
    }
}

impl HistoryFilter {
    pub fn validate(&self) -> Result<()> {
        optional_text("search", self.search.as_deref(), 100)?;
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(Error::validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(Error::validation("date_from must not be after date_to"));
            }
        }
        Ok(())
    }

    fn matches(&self, entry: &HistoryEntry, needle: Option<&str>) -> bool {
        self.pillar.map_or(true, |p| entry.pillar == p)
            && self.source.map_or(true, |s| entry.source == s)
            && self.date_from.map_or(true, |d| entry.date >= d)
            && self.date_to.map_or(true, |d| entry.date <= d)
            && needle.map_or(true, |n| entry.title.to_lowercase().contains(n))
    }
}

/// One page of the feed
#[derive(Clone, Debug, Default)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    /// Pass back as `cursor` to get the next page
    pub next_cursor: Option<Uuid>,
}

/// Load every entry from the journal and the archive, journal first
pub fn load_history(journal_path: &Path, csv_path: &Path) -> Result<Vec<HistoryEntry>> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for entry in crate::journal::read_entries(journal_path)? {
        if seen.insert(entry.id) {
            entries.push(entry);
        }
    }
    let from_journal = entries.len();

    for entry in crate::archive::read_archive(csv_path)? {
        if seen.insert(entry.id) {
            entries.push(entry);
        }
    }

    tracing::debug!(
        "Loaded {} history entries ({} from journal, {} archived)",
        entries.len(),
        from_journal,
        entries.len() - from_journal
    );
    Ok(entries)
}

/// Filter, sort and page `entries`
pub fn query(mut entries: Vec<HistoryEntry>, filter: &HistoryFilter) -> Result<HistoryPage> {
    filter.validate()?;

    let needle = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    entries.retain(|e| filter.matches(e, needle.as_deref()));

    entries.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.recorded_at.cmp(&b.recorded_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    if filter.sort == SortOrder::Recent {
        entries.reverse();
    }

    let start = match filter.cursor {
        Some(cursor) => {
            entries
                .iter()
                .position(|e| e.id == cursor)
                .ok_or_else(|| Error::not_found("History entry", cursor))?
                + 1
        }
        None => 0,
    };

    let rest = entries.len().saturating_sub(start);
    let page: Vec<_> = entries.into_iter().skip(start).take(filter.limit).collect();
    let next_cursor = if rest > page.len() {
        page.last().map(|e| e.id)
    } else {
        None
    };

    Ok(HistoryPage {
        entries: page,
        next_cursor,
    })
}
