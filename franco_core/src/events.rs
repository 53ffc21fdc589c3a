//! Recurring events and their completions.
//!
//! An event is due on a date according to its recurrence; completing a due
//! occurrence posts the event's XP to its pillar, at most once per date.

use crate::validation::{int_in, optional_clock_time, optional_text, required_text};
use crate::{
    Error, Event, EventCompletion, HistoryEntry, HistorySource, Pillar, Recurrence, Result,
    TrackerState,
};
use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

/// Raw input for a new event
#[derive(Clone, Debug)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub pillar: Pillar,
    pub recurrence: Recurrence,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub xp: i64,
}

/// Partial update; `None` leaves the field unchanged
#[derive(Clone, Debug, Default)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pillar: Option<Pillar>,
    pub recurrence: Option<Recurrence>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub xp: Option<i64>,
}

/// An event due on a given day
#[derive(Clone, Debug)]
pub struct AgendaItem {
    pub event: Event,
    pub done: bool,
}

/// Whether `event` has an occurrence on `date`
pub fn is_due(event: &Event, date: NaiveDate) -> bool {
    if date < event.date {
        return false;
    }
    match event.recurrence {
        Recurrence::None => date == event.date,
        Recurrence::Daily => true,
        Recurrence::Weekly => date.weekday() == event.date.weekday(),
        Recurrence::Monthly => {
            // Day 31 events fall on the last day of shorter months
            let last = last_day_of_month(date);
            date.day() == event.date.day().min(last)
        }
    }
}

fn last_day_of_month(date: NaiveDate) -> u32 {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|first| first.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

pub fn add_event(state: &mut TrackerState, input: NewEvent) -> Result<Uuid> {
    let event = Event {
        id: Uuid::new_v4(),
        title: required_text("title", &input.title, 100)?,
        description: optional_text("description", input.description.as_deref(), 500)?,
        pillar: input.pillar,
        recurrence: input.recurrence,
        date: input.date,
        time: optional_clock_time("time", input.time.as_deref())?,
        xp: int_in("xp", input.xp, 1..=1000)?,
        created_at: Utc::now(),
    };
    let id = event.id;
    tracing::debug!("Created event {} ({})", event.title, id);
    state.events.push(event);
    Ok(id)
}

pub fn update_event(state: &mut TrackerState, id: Uuid, update: EventUpdate) -> Result<()> {
    let event = find_event_mut(state, id)?;
    if let Some(title) = update.title {
        event.title = required_text("title", &title, 100)?;
    }
    if let Some(description) = update.description {
        event.description = optional_text("description", Some(&description), 500)?;
    }
    if let Some(pillar) = update.pillar {
        event.pillar = pillar;
    }
    if let Some(recurrence) = update.recurrence {
        event.recurrence = recurrence;
    }
    if let Some(date) = update.date {
        event.date = date;
    }
    if let Some(time) = update.time {
        event.time = optional_clock_time("time", Some(&time))?;
    }
    if let Some(xp) = update.xp {
        event.xp = int_in("xp", xp, 1..=1000)?;
    }
    Ok(())
}

/// Remove an event and its completion records. XP already earned stays.
pub fn remove_event(state: &mut TrackerState, id: Uuid) -> Result<Event> {
    let idx = state
        .events
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| Error::not_found("Event", id))?;
    state.completions.retain(|c| c.event_id != id);
    Ok(state.events.remove(idx))
}

/// Events due on `date`, ordered by time of day
pub fn agenda(state: &TrackerState, date: NaiveDate) -> Vec<AgendaItem> {
    let mut items: Vec<_> = state
        .events
        .iter()
        .filter(|e| is_due(e, date))
        .map(|e| AgendaItem {
            event: e.clone(),
            done: is_completed(state, e.id, date),
        })
        .collect();
    items.sort_by(|a, b| {
        a.event
            .time
            .cmp(&b.event.time)
            .then_with(|| a.event.title.cmp(&b.event.title))
    });
    items
}

pub fn is_completed(state: &TrackerState, event_id: Uuid, date: NaiveDate) -> bool {
    state
        .completions
        .iter()
        .any(|c| c.event_id == event_id && c.date == date)
}

/// Mark the occurrence of an event on `date` as done and post its XP
pub fn complete_event(state: &mut TrackerState, id: Uuid, date: NaiveDate) -> Result<HistoryEntry> {
    let event = find_event(state, id)?.clone();
    if !is_due(&event, date) {
        return Err(Error::validation(format!(
            "'{}' is not scheduled on {}",
            event.title, date
        )));
    }
    if is_completed(state, id, date) {
        return Err(Error::validation(format!(
            "'{}' is already completed on {}",
            event.title, date
        )));
    }

    state.completions.push(EventCompletion { event_id: id, date });
    let entry = HistoryEntry::new(
        event.pillar,
        HistorySource::Event,
        id,
        event.xp,
        event.title,
        date,
    );
    state.ledger.post(entry.clone());
    Ok(entry)
}

/// Revert a completion, taking back the XP it granted
pub fn uncomplete_event(
    state: &mut TrackerState,
    id: Uuid,
    date: NaiveDate,
) -> Result<HistoryEntry> {
    let event = find_event(state, id)?.clone();
    let idx = state
        .completions
        .iter()
        .position(|c| c.event_id == id && c.date == date)
        .ok_or_else(|| {
            Error::validation(format!("'{}' is not completed on {}", event.title, date))
        })?;
    state.completions.remove(idx);

    let mut entry = HistoryEntry::new(
        event.pillar,
        HistorySource::Event,
        id,
        -event.xp,
        format!("Undone: {}", event.title),
        date,
    );
    entry.xp = state.ledger.post(entry.clone()).applied();
    Ok(entry)
}

fn find_event(state: &TrackerState, id: Uuid) -> Result<&Event> {
    state
        .events
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| Error::not_found("Event", id))
}

fn find_event_mut(state: &mut TrackerState, id: Uuid) -> Result<&mut Event> {
    state
        .events
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| Error::not_found("Event", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_event(recurrence: Recurrence, date: NaiveDate) -> NewEvent {
        NewEvent {
            title: "Gym".into(),
            description: None,
            pillar: Pillar::Physical,
            recurrence,
            date,
            time: Some("07:00".into()),
            xp: 30,
        }
    }

    #[test]
    fn test_due_rules() {
        let mut state = TrackerState::default();
        // 2026-01-05 is a Monday
        let start = day(2026, 1, 5);
        let once = add_event(&mut state, new_event(Recurrence::None, start)).unwrap();
        let daily = add_event(&mut state, new_event(Recurrence::Daily, start)).unwrap();
        let weekly = add_event(&mut state, new_event(Recurrence::Weekly, start)).unwrap();

        let get = |id: Uuid| state.events.iter().find(|e| e.id == id).unwrap().clone();

        assert!(is_due(&get(once), start));
        assert!(!is_due(&get(once), day(2026, 1, 6)));
        assert!(is_due(&get(daily), day(2026, 3, 1)));
        assert!(!is_due(&get(daily), day(2026, 1, 4)));
        assert!(is_due(&get(weekly), day(2026, 1, 12)));
        assert!(!is_due(&get(weekly), day(2026, 1, 13)));
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        let mut state = TrackerState::default();
        let id = add_event(&mut state, new_event(Recurrence::Monthly, day(2026, 1, 31))).unwrap();
        let event = state.events.iter().find(|e| e.id == id).unwrap();

        assert!(is_due(event, day(2026, 2, 28)));
        assert!(!is_due(event, day(2026, 2, 27)));
        assert!(is_due(event, day(2026, 3, 31)));
        assert!(is_due(event, day(2026, 4, 30)));
        assert!(is_due(event, day(2026, 12, 31)));
    }

    #[test]
    fn test_complete_posts_xp_once_per_day() {
        let mut state = TrackerState::default();
        let start = day(2026, 1, 5);
        let id = add_event(&mut state, new_event(Recurrence::Daily, start)).unwrap();

        let entry = complete_event(&mut state, id, start).unwrap();
        assert_eq!(entry.xp, 30);
        assert_eq!(state.ledger.pillar(Pillar::Physical).total_xp, 30);

        let err = complete_event(&mut state, id, start).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        complete_event(&mut state, id, day(2026, 1, 6)).unwrap();
        assert_eq!(state.ledger.pillar(Pillar::Physical).total_xp, 60);
        assert_eq!(state.ledger.take_postings().len(), 2);
    }

    #[test]
    fn test_complete_requires_due_date() {
        let mut state = TrackerState::default();
        let id = add_event(&mut state, new_event(Recurrence::None, day(2026, 1, 5))).unwrap();
        let err = complete_event(&mut state, id, day(2026, 1, 6)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_uncomplete_reverts_xp() {
        let mut state = TrackerState::default();
        let start = day(2026, 1, 5);
        let id = add_event(&mut state, new_event(Recurrence::Daily, start)).unwrap();
        complete_event(&mut state, id, start).unwrap();

        let entry = uncomplete_event(&mut state, id, start).unwrap();
        assert_eq!(entry.xp, -30);
        assert_eq!(state.ledger.pillar(Pillar::Physical).total_xp, 0);
        assert!(!is_completed(&state, id, start));
        assert!(uncomplete_event(&mut state, id, start).is_err());
    }

    #[test]
    fn test_agenda_sorted_with_status() {
        let mut state = TrackerState::default();
        let start = day(2026, 1, 5);
        let mut late = new_event(Recurrence::Daily, start);
        late.title = "Read".into();
        late.time = Some("22:00".into());
        add_event(&mut state, late).unwrap();
        let early = add_event(&mut state, new_event(Recurrence::Daily, start)).unwrap();
        complete_event(&mut state, early, start).unwrap();

        let items = agenda(&state, start);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].event.id, early);
        assert!(items[0].done);
        assert!(!items[1].done);
    }

    #[test]
    fn test_validation_and_update() {
        let mut state = TrackerState::default();
        let mut bad = new_event(Recurrence::None, day(2026, 1, 5));
        bad.xp = 0;
        assert!(add_event(&mut state, bad).is_err());

        let id = add_event(&mut state, new_event(Recurrence::None, day(2026, 1, 5))).unwrap();
        update_event(
            &mut state,
            id,
            EventUpdate {
                xp: Some(45),
                time: Some("18:30".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let event = &state.events[0];
        assert_eq!(event.xp, 45);
        assert_eq!(event.time.unwrap().to_string(), "18:30:00");

        assert!(update_event(
            &mut state,
            id,
            EventUpdate {
                title: Some("".into()),
                ..Default::default()
            }
        )
        .is_err());
    }

    #[test]
    fn test_remove_drops_completions() {
        let mut state = TrackerState::default();
        let start = day(2026, 1, 5);
        let id = add_event(&mut state, new_event(Recurrence::Daily, start)).unwrap();
        complete_event(&mut state, id, start).unwrap();

        remove_event(&mut state, id).unwrap();
        assert!(state.events.is_empty());
        assert!(state.completions.is_empty());
        assert_eq!(state.ledger.pillar(Pillar::Physical).total_xp, 30);
        assert!(matches!(
            remove_event(&mut state, id),
            Err(Error::NotFound { .. })
        ));
    }
}
