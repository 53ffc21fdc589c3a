//! Objectives: longer-running goals with a progress percentage.

use crate::validation::{int_in, optional_text, required_text};
use crate::{Error, HistoryEntry, HistorySource, Objective, Pillar, Result, TrackerState};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct NewObjective {
    pub title: String,
    pub description: Option<String>,
    pub pillar: Pillar,
    pub deadline: Option<NaiveDate>,
    pub xp: i64,
    pub milestone: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ObjectiveUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pillar: Option<Pillar>,
    pub deadline: Option<NaiveDate>,
    pub xp: Option<i64>,
    pub milestone: Option<bool>,
}

pub fn add_objective(state: &mut TrackerState, input: NewObjective) -> Result<Uuid> {
    let objective = Objective {
        id: Uuid::new_v4(),
        title: required_text("title", &input.title, 100)?,
        description: optional_text("description", input.description.as_deref(), 500)?,
        pillar: input.pillar,
        deadline: input.deadline,
        xp: int_in("xp", input.xp, 1..=1000)?,
        milestone: input.milestone,
        progress: 0,
        completed_on: None,
        created_at: Utc::now(),
    };
    let id = objective.id;
    state.objectives.push(objective);
    Ok(id)
}

pub fn update_objective(state: &mut TrackerState, id: Uuid, update: ObjectiveUpdate) -> Result<()> {
    let objective = find_mut(state, id)?;
    if let Some(title) = update.title {
        objective.title = required_text("title", &title, 100)?;
    }
    if let Some(description) = update.description {
        objective.description = optional_text("description", Some(&description), 500)?;
    }
    if let Some(pillar) = update.pillar {
        objective.pillar = pillar;
    }
    if let Some(deadline) = update.deadline {
        objective.deadline = Some(deadline);
    }
    if let Some(xp) = update.xp {
        objective.xp = int_in("xp", xp, 1..=1000)?;
    }
    if let Some(milestone) = update.milestone {
        objective.milestone = milestone;
    }
    Ok(())
}

/// Set progress (0-100) on an open objective
pub fn set_progress(state: &mut TrackerState, id: Uuid, percent: i64) -> Result<()> {
    let percent = int_in("progress", percent, 0..=100)?;
    let objective = find_mut(state, id)?;
    if objective.completed_on.is_some() {
        return Err(Error::validation(format!(
            "'{}' is already completed",
            objective.title
        )));
    }
    objective.progress = percent as u8;
    Ok(())
}

/// Close an objective at 100% and post its XP
pub fn complete_objective(
    state: &mut TrackerState,
    id: Uuid,
    today: NaiveDate,
) -> Result<HistoryEntry> {
    let objective = find_mut(state, id)?;
    if objective.completed_on.is_some() {
        return Err(Error::validation(format!(
            "'{}' is already completed",
            objective.title
        )));
    }
    objective.progress = 100;
    objective.completed_on = Some(today);

    let title = if objective.milestone {
        format!("Milestone: {}", objective.title)
    } else {
        objective.title.clone()
    };
    let entry = HistoryEntry::new(
        objective.pillar,
        HistorySource::Objective,
        id,
        objective.xp,
        title,
        today,
    );
    state.ledger.post(entry.clone());
    Ok(entry)
}

pub fn remove_objective(state: &mut TrackerState, id: Uuid) -> Result<Objective> {
    let idx = state
        .objectives
        .iter()
        .position(|o| o.id == id)
        .ok_or_else(|| Error::not_found("Objective", id))?;
    Ok(state.objectives.remove(idx))
}

/// Objectives with open ones first, milestones ahead of the rest, then by deadline
pub fn list_objectives(state: &TrackerState, pillar: Option<Pillar>) -> Vec<&Objective> {
    let mut list: Vec<_> = state
        .objectives
        .iter()
        .filter(|o| pillar.map_or(true, |p| o.pillar == p))
        .collect();
    list.sort_by(|a, b| {
        a.completed_on
            .is_some()
            .cmp(&b.completed_on.is_some())
            .then_with(|| b.milestone.cmp(&a.milestone))
            .then_with(|| match (a.deadline, b.deadline) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.title.cmp(&b.title))
    });
    list
}

fn find_mut(state: &mut TrackerState, id: Uuid) -> Result<&mut Objective> {
    state
        .objectives
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or_else(|| Error::not_found("Objective", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    fn objective(title: &str, milestone: bool) -> NewObjective {
        NewObjective {
            title: title.into(),
            description: None,
            pillar: Pillar::Finance,
            deadline: None,
            xp: 100,
            milestone,
        }
    }

    #[test]
    fn test_complete_posts_xp_once() {
        let mut state = TrackerState::default();
        let id = add_objective(&mut state, objective("Emergency fund", true)).unwrap();
        set_progress(&mut state, id, 65).unwrap();

        let entry = complete_objective(&mut state, id, today()).unwrap();
        assert_eq!(entry.xp, 100);
        assert_eq!(entry.title, "Milestone: Emergency fund");
        assert_eq!(state.objectives[0].progress, 100);
        assert_eq!(state.ledger.pillar(Pillar::Finance).total_xp, 100);

        assert!(complete_objective(&mut state, id, today()).is_err());
        assert!(set_progress(&mut state, id, 10).is_err());
        assert_eq!(state.ledger.pillar(Pillar::Finance).total_xp, 100);
    }

    #[test]
    fn test_progress_bounds() {
        let mut state = TrackerState::default();
        let id = add_objective(&mut state, objective("Read 12 books", false)).unwrap();
        assert!(set_progress(&mut state, id, 101).is_err());
        assert!(set_progress(&mut state, id, -1).is_err());
        set_progress(&mut state, id, 25).unwrap();
        assert_eq!(state.objectives[0].progress, 25);
    }

    #[test]
    fn test_list_orders_milestones_first() {
        let mut state = TrackerState::default();
        add_objective(&mut state, objective("Plain", false)).unwrap();
        let done = add_objective(&mut state, objective("Done one", true)).unwrap();
        add_objective(&mut state, objective("Big one", true)).unwrap();
        complete_objective(&mut state, done, today()).unwrap();

        let titles: Vec<_> = list_objectives(&state, None)
            .iter()
            .map(|o| o.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Big one", "Plain", "Done one"]);
        assert!(list_objectives(&state, Some(Pillar::Physical)).is_empty());
    }

    #[test]
    fn test_update_and_remove() {
        let mut state = TrackerState::default();
        let id = add_objective(&mut state, objective("Run 5k", false)).unwrap();
        update_objective(
            &mut state,
            id,
            ObjectiveUpdate {
                milestone: Some(true),
                xp: Some(75),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(state.objectives[0].milestone);
        assert_eq!(state.objectives[0].xp, 75);

        remove_objective(&mut state, id).unwrap();
        assert!(matches!(
            remove_objective(&mut state, id),
            Err(Error::NotFound { .. })
        ));
    }
}
