//! Calendar: dated appointments with optional time slot and XP.

use crate::validation::{int_in, optional_clock_time, optional_text, required_text};
use crate::{CalendarEvent, Error, HistoryEntry, HistorySource, Pillar, Result, TrackerState};
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct NewCalendarEvent {
    pub title: String,
    pub description: Option<String>,
    pub pillar: Option<Pillar>,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
    pub xp: i64,
}

#[derive(Clone, Debug, Default)]
pub struct CalendarUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pillar: Option<Pillar>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub notes: Option<String>,
    pub xp: Option<i64>,
}

fn check_slot(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Result<()> {
    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Err(Error::validation("end_time must not be before start_time"));
        }
    }
    Ok(())
}

pub fn add_calendar_event(state: &mut TrackerState, input: NewCalendarEvent) -> Result<Uuid> {
    let start_time = optional_clock_time("start_time", input.start_time.as_deref())?;
    let end_time = optional_clock_time("end_time", input.end_time.as_deref())?;
    check_slot(start_time, end_time)?;

    let entry = CalendarEvent {
        id: Uuid::new_v4(),
        title: required_text("title", &input.title, 100)?,
        description: optional_text("description", input.description.as_deref(), 500)?,
        pillar: input.pillar,
        date: input.date,
        start_time,
        end_time,
        notes: optional_text("notes", input.notes.as_deref(), 1000)?,
        xp: int_in("xp", input.xp, 0..=1000)?,
        completed: false,
    };
    let id = entry.id;
    state.calendar.push(entry);
    Ok(id)
}

pub fn update_calendar_event(
    state: &mut TrackerState,
    id: Uuid,
    update: CalendarUpdate,
) -> Result<()> {
    let entry = find_mut(state, id)?;
    let mut updated = entry.clone();

    if let Some(title) = update.title {
        updated.title = required_text("title", &title, 100)?;
    }
    if let Some(description) = update.description {
        updated.description = optional_text("description", Some(&description), 500)?;
    }
    if let Some(pillar) = update.pillar {
        updated.pillar = Some(pillar);
    }
    if let Some(date) = update.date {
        updated.date = date;
    }
    if let Some(start) = update.start_time {
        updated.start_time = optional_clock_time("start_time", Some(&start))?;
    }
    if let Some(end) = update.end_time {
        updated.end_time = optional_clock_time("end_time", Some(&end))?;
    }
    if let Some(notes) = update.notes {
        updated.notes = optional_text("notes", Some(&notes), 1000)?;
    }
    if let Some(xp) = update.xp {
        updated.xp = int_in("xp", xp, 0..=1000)?;
    }
    check_slot(updated.start_time, updated.end_time)?;

    *entry = updated;
    Ok(())
}

pub fn remove_calendar_event(state: &mut TrackerState, id: Uuid) -> Result<CalendarEvent> {
    let idx = state
        .calendar
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| Error::not_found("Calendar event", id))?;
    Ok(state.calendar.remove(idx))
}

/// Entries between `from` and `to` inclusive, by date then start time
pub fn calendar_range(state: &TrackerState, from: NaiveDate, to: NaiveDate) -> Vec<&CalendarEvent> {
    let mut list: Vec<_> = state
        .calendar
        .iter()
        .filter(|c| c.date >= from && c.date <= to)
        .collect();
    list.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.start_time.cmp(&b.start_time))
            .then_with(|| a.title.cmp(&b.title))
    });
    list
}

/// Mark an appointment attended.
///
/// XP is posted only when the entry has a pillar and a positive reward.
pub fn complete_calendar_event(
    state: &mut TrackerState,
    id: Uuid,
) -> Result<Option<HistoryEntry>> {
    let entry = find_mut(state, id)?;
    if entry.completed {
        return Err(Error::validation(format!(
            "'{}' is already completed",
            entry.title
        )));
    }
    entry.completed = true;

    let posting = match entry.pillar {
        Some(pillar) if entry.xp > 0 => Some(HistoryEntry::new(
            pillar,
            HistorySource::Calendar,
            id,
            entry.xp,
            entry.title.clone(),
            entry.date,
        )),
        _ => None,
    };
    if let Some(p) = &posting {
        state.ledger.post(p.clone());
    }
    Ok(posting)
}

fn find_mut(state: &mut TrackerState, id: Uuid) -> Result<&mut CalendarEvent> {
    state
        .calendar
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| Error::not_found("Calendar event", id))
}
