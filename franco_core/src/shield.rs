//! Dopamine shields: relapse-free streaks that accrue XP day by day.
//!
//! The ledger is credited as days elapse ([`tick_shields`]) and the whole
//! accrued value is deducted when a relapse is recorded
//! ([`record_relapse`]). Both go through [`crate::ledger::Ledger::post`],
//! so the shield's accrued value and the ledger never drift apart.

use crate::validation::{int_in, optional_text, required_text};
use crate::xp::{cumulative_streak_reward, daily_streak_reward, PointTotal};
use crate::{
    DopamineShield, Error, HistoryEntry, HistorySource, Intensity, Pillar, Relapse, Result,
    TrackerState,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct NewShield {
    pub title: String,
    pub description: Option<String>,
    pub pillar: Pillar,
    pub xp_per_day: i64,
    pub notifications: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ShieldUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub notifications: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct RelapseReport {
    pub intensity: Intensity,
    pub reflection: Option<String>,
}

/// Accrued value of the current streak
pub fn shield_value(shield: &DopamineShield) -> PointTotal {
    cumulative_streak_reward(shield.streak_days, shield.xp_per_day)
}

/// What the next clean day will be worth
pub fn todays_worth(shield: &DopamineShield) -> PointTotal {
    daily_streak_reward(shield.streak_days + 1, shield.xp_per_day)
}

pub fn add_shield(state: &mut TrackerState, input: NewShield, today: NaiveDate) -> Result<Uuid> {
    let shield = DopamineShield {
        id: Uuid::new_v4(),
        title: required_text("title", &input.title, 100)?,
        description: optional_text("description", input.description.as_deref(), 500)?,
        pillar: input.pillar,
        xp_per_day: int_in("xp_per_day", input.xp_per_day, 1..=500)?,
        notifications: input.notifications,
        start_date: today,
        streak_days: 0,
        max_streak: 0,
        created_at: Utc::now(),
    };
    let id = shield.id;
    tracing::debug!("Created shield {} ({})", shield.title, id);
    state.shields.push(shield);
    Ok(id)
}

/// Rate changes are not accepted once created: the accrued value would no
/// longer match what was credited.
pub fn update_shield(state: &mut TrackerState, id: Uuid, update: ShieldUpdate) -> Result<()> {
    let shield = find_mut(state, id)?;
    if let Some(title) = update.title {
        shield.title = required_text("title", &title, 100)?;
    }
    if let Some(description) = update.description {
        shield.description = optional_text("description", Some(&description), 500)?;
    }
    if let Some(notifications) = update.notifications {
        shield.notifications = notifications;
    }
    Ok(())
}

/// Credit every shield with the clean days elapsed up to `today`.
///
/// Returns the postings made; shields with nothing new are skipped.
pub fn tick_shields(state: &mut TrackerState, today: NaiveDate) -> Vec<HistoryEntry> {
    let mut postings = Vec::new();

    for shield in state.shields.iter_mut() {
        let elapsed = (today - shield.start_date).num_days().max(0);
        if elapsed <= shield.streak_days {
            continue;
        }

        let credit = cumulative_streak_reward(elapsed, shield.xp_per_day)
            - cumulative_streak_reward(shield.streak_days, shield.xp_per_day);
        shield.streak_days = elapsed;
        shield.max_streak = shield.max_streak.max(elapsed);

        let entry = HistoryEntry::new(
            shield.pillar,
            HistorySource::Dopamine,
            shield.id,
            credit,
            format!("Shield: {} (day {})", shield.title, elapsed),
            today,
        );
        postings.push(entry);
    }

    for entry in &postings {
        state.ledger.post(entry.clone());
    }
    postings
}

/// Record a relapse: forfeit the accrued value and restart the streak
pub fn record_relapse(
    state: &mut TrackerState,
    id: Uuid,
    report: RelapseReport,
    today: NaiveDate,
) -> Result<Relapse> {
    let reflection = optional_text("reflection", report.reflection.as_deref(), 1000)?;
    let shield = find_mut(state, id)?;

    let streak_days = shield.streak_days;
    let value = shield_value(shield);
    let title = format!("Relapse: {}", shield.title);
    let pillar = shield.pillar;

    shield.streak_days = 0;
    shield.start_date = today;

    let change = state.ledger.post(HistoryEntry::new(
        pillar,
        HistorySource::Dopamine,
        id,
        -value,
        title.clone(),
        today,
    ));
    let xp_lost = -change.applied();

    let relapse = Relapse {
        id: Uuid::new_v4(),
        shield_id: id,
        date: today,
        streak_days,
        xp_lost,
        intensity: report.intensity,
        reflection,
    };
    tracing::info!(
        "Relapse on '{}' after {} days, {} XP lost",
        title,
        streak_days,
        xp_lost
    );

    state.relapses.push(relapse.clone());
    Ok(relapse)
}

/// Delete a shield and its relapse log. Ledger totals are left as they are.
pub fn remove_shield(state: &mut TrackerState, id: Uuid) -> Result<DopamineShield> {
    let idx = state
        .shields
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| Error::not_found("Shield", id))?;
    state.relapses.retain(|r| r.shield_id != id);
    Ok(state.shields.remove(idx))
}

pub fn relapses_for(state: &TrackerState, id: Uuid) -> Vec<&Relapse> {
    let mut list: Vec<_> = state.relapses.iter().filter(|r| r.shield_id == id).collect();
    list.sort_by(|a, b| b.date.cmp(&a.date));
    list
}

fn find_mut(state: &mut TrackerState, id: Uuid) -> Result<&mut DopamineShield> {
    state
        .shields
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| Error::not_found("Shield", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn new_shield(rate: i64) -> NewShield {
        NewShield {
            title: "Social media".into(),
            description: None,
            pillar: Pillar::Capability,
            xp_per_day: rate,
            notifications: true,
        }
    }

    #[test]
    fn test_tick_credits_elapsed_days() {
        let mut state = TrackerState::default();
        let id = add_shield(&mut state, new_shield(50), start()).unwrap();

        // Same day: nothing elapsed yet
        assert!(tick_shields(&mut state, start()).is_empty());

        let postings = tick_shields(&mut state, start() + Duration::days(3));
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].xp, 300);
        assert_eq!(postings[0].reference_id, id);
        assert_eq!(state.ledger.pillar(Pillar::Capability).total_xp, 300);

        // Ticking twice on the same day is a no-op
        assert!(tick_shields(&mut state, start() + Duration::days(3)).is_empty());

        // Days 4..=7 are worth 200 + 250 + 300 + 350
        let postings = tick_shields(&mut state, start() + Duration::days(7));
        assert_eq!(postings[0].xp, 1100);
        assert_eq!(state.ledger.pillar(Pillar::Capability).total_xp, 1400);
        assert_eq!(shield_value(&state.shields[0]), 1400);
        assert_eq!(todays_worth(&state.shields[0]), 400);
    }

    #[test]
    fn test_relapse_forfeits_accrued_value() {
        let mut state = TrackerState::default();
        let id = add_shield(&mut state, new_shield(50), start()).unwrap();
        tick_shields(&mut state, start() + Duration::days(7));

        let relapse_day = start() + Duration::days(8);
        let relapse = record_relapse(
            &mut state,
            id,
            RelapseReport {
                intensity: Intensity::Moderada,
                reflection: Some("Opened one notification".into()),
            },
            relapse_day,
        )
        .unwrap();

        assert_eq!(relapse.streak_days, 7);
        assert_eq!(relapse.xp_lost, 1400);
        assert_eq!(state.ledger.pillar(Pillar::Capability).total_xp, 0);

        let shield = &state.shields[0];
        assert_eq!(shield.streak_days, 0);
        assert_eq!(shield.max_streak, 7);
        assert_eq!(shield.start_date, relapse_day);
        assert_eq!(shield_value(shield), 0);

        let postings = state.ledger.take_postings();
        assert_eq!(postings.last().unwrap().xp, -1400);
    }

    #[test]
    fn test_relapse_keeps_other_xp_in_pillar() {
        let mut state = TrackerState::default();
        state.ledger.post(HistoryEntry::new(
            Pillar::Capability,
            HistorySource::Event,
            Uuid::new_v4(),
            500,
            "Deep work",
            start(),
        ));
        let id = add_shield(&mut state, new_shield(100), start()).unwrap();
        tick_shields(&mut state, start() + Duration::days(2));
        assert_eq!(state.ledger.pillar(Pillar::Capability).total_xp, 800);

        record_relapse(
            &mut state,
            id,
            RelapseReport {
                intensity: Intensity::Leve,
                reflection: None,
            },
            start() + Duration::days(2),
        )
        .unwrap();
        assert_eq!(state.ledger.pillar(Pillar::Capability).total_xp, 500);
    }

    #[test]
    fn test_streak_restarts_after_relapse() {
        let mut state = TrackerState::default();
        let id = add_shield(&mut state, new_shield(10), start()).unwrap();
        tick_shields(&mut state, start() + Duration::days(5));
        let relapse_day = start() + Duration::days(5);
        record_relapse(
            &mut state,
            id,
            RelapseReport {
                intensity: Intensity::Fuerte,
                reflection: None,
            },
            relapse_day,
        )
        .unwrap();

        let postings = tick_shields(&mut state, relapse_day + Duration::days(2));
        assert_eq!(postings[0].xp, 30);
        assert_eq!(state.shields[0].streak_days, 2);
        assert_eq!(state.shields[0].max_streak, 5);
        assert_eq!(relapses_for(&state, id).len(), 1);
    }

    #[test]
    fn test_validation() {
        let mut state = TrackerState::default();
        assert!(add_shield(&mut state, new_shield(0), start()).is_err());
        assert!(add_shield(&mut state, new_shield(501), start()).is_err());

        let id = add_shield(&mut state, new_shield(50), start()).unwrap();
        let err = record_relapse(
            &mut state,
            id,
            RelapseReport {
                intensity: Intensity::Leve,
                reflection: Some("x".repeat(1001)),
            },
            start(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(state.relapses.is_empty());

        assert!(matches!(
            record_relapse(
                &mut state,
                Uuid::new_v4(),
                RelapseReport {
                    intensity: Intensity::Leve,
                    reflection: None
                },
                start()
            ),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_and_remove() {
        let mut state = TrackerState::default();
        let id = add_shield(&mut state, new_shield(50), start()).unwrap();
        update_shield(
            &mut state,
            id,
            ShieldUpdate {
                notifications: Some(false),
                title: Some("Doomscrolling".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(state.shields[0].title, "Doomscrolling");
        assert!(!state.shields[0].notifications);

        remove_shield(&mut state, id).unwrap();
        assert!(state.shields.is_empty());
    }
}
