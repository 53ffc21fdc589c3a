//! Core domain types for Franco Assistant.
//!
//! This module defines the records tracked by the application:
//! - Pillars and the small keyword enums attached to records
//! - Events, objectives, dopamine shields and relapses
//! - Per-pillar metric readings (one concrete shape per pillar)
//! - Calendar entries and the kanban board
//! - History entries and the persisted tracker state

use crate::ledger::Ledger;
use crate::Error;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares the keyword table of a unit-only enum: its canonical name,
/// accepted aliases, `Display` and `FromStr`.
macro_rules! keywords {
    ($ty:ident { $($variant:ident => $name:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().replace('-', "_").as_str() {
                    $($name $(| $alias)* => Ok($ty::$variant),)+
                    other => Err(Error::validation(format!(
                        "unknown {} '{}'",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

// ============================================================================
// Keyword Enums
// ============================================================================

/// One of the four life domains most records are tagged with
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Finance,
    Capability,
    Physical,
    Relationships,
}

keywords!(Pillar {
    Finance => "finance" | "financiacion",
    Capability => "capability" | "capacidad",
    Physical => "physical" | "fisico",
    Relationships => "relationships" | "relaciones",
});

/// How often an event repeats
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

keywords!(Recurrence {
    None => "none",
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
});

/// Self-reported severity of a relapse
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Leve,
    Moderada,
    Fuerte,
}

keywords!(Intensity {
    Leve => "leve" | "mild",
    Moderada => "moderada" | "moderate",
    Fuerte => "fuerte" | "strong",
});

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Alto,
    Medio,
    Bajo,
}

keywords!(EnergyLevel {
    Alto => "alto" | "high",
    Medio => "medio" | "medium",
    Bajo => "bajo" | "low",
});

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipQuality {
    Profunda,
    Normal,
    Superficial,
}

keywords!(RelationshipQuality {
    Profunda => "profunda" | "deep",
    Normal => "normal",
    Superficial => "superficial" | "shallow",
});

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Baja,
    #[default]
    Media,
    Alta,
}

keywords!(Priority {
    Baja => "baja" | "low",
    Media => "media" | "medium",
    Alta => "alta" | "high",
});

/// Kanban task lane status
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    InReview,
    Done,
}

keywords!(TaskStatus {
    Todo => "todo" | "por_hacer",
    InProgress => "in_progress" | "en_progreso",
    InReview => "in_review" | "en_revision",
    Done => "done" | "completado",
});

/// Subsystem that produced a history entry
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    Event,
    Objective,
    Dopamine,
    Metric,
    Task,
    Calendar,
}

keywords!(HistorySource {
    Event => "event",
    Objective => "objective",
    Dopamine => "dopamine",
    Metric => "metric",
    Task => "task",
    Calendar => "calendar",
});

/// Ordering of the history feed
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Recent,
    Oldest,
}

keywords!(SortOrder {
    Recent => "recent" | "newest",
    Oldest => "oldest",
});

// ============================================================================
// Events and Objectives
// ============================================================================

/// A (possibly recurring) activity worth XP when completed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub pillar: Pillar,
    pub recurrence: Recurrence,
    /// First (or only) occurrence
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub xp: i64,
    pub created_at: DateTime<Utc>,
}

/// One occurrence of an event marked done
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventCompletion {
    pub event_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Objective {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub pillar: Pillar,
    pub deadline: Option<NaiveDate>,
    pub xp: i64,
    /// Major achievement, shown with emphasis
    pub milestone: bool,
    /// Percent complete, 0-100
    pub progress: u8,
    pub completed_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Dopamine Shield
// ============================================================================

/// A habit the user abstains from; accrues XP while the streak holds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DopamineShield {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub pillar: Pillar,
    pub xp_per_day: i64,
    /// Persisted but not acted upon
    pub notifications: bool,
    /// Day the current streak started
    pub start_date: NaiveDate,
    /// Clean days already credited to the ledger
    pub streak_days: i64,
    pub max_streak: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Relapse {
    pub id: Uuid,
    pub shield_id: Uuid,
    pub date: NaiveDate,
    /// Streak length at the moment of the relapse
    pub streak_days: i64,
    pub xp_lost: i64,
    pub intensity: Intensity,
    pub reflection: Option<String>,
}

// ============================================================================
// Metric Readings
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FinanceReading {
    pub income: Option<f64>,
    pub expenses: Option<f64>,
    pub savings: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CapabilityReading {
    pub focused_hours: Option<f64>,
    pub unfocused_hours: Option<f64>,
    pub energy: Option<EnergyLevel>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PhysicalReading {
    pub weight_kg: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub trained_today: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RelationshipsReading {
    pub social_interactions: Option<u32>,
    pub quality: Option<RelationshipQuality>,
    pub notes: Option<String>,
}

/// A daily reading, keyed by the pillar it belongs to
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "pillar", rename_all = "snake_case")]
pub enum MetricReading {
    Finance(FinanceReading),
    Capability(CapabilityReading),
    Physical(PhysicalReading),
    Relationships(RelationshipsReading),
}

impl MetricReading {
    pub fn pillar(&self) -> Pillar {
        match self {
            MetricReading::Finance(_) => Pillar::Finance,
            MetricReading::Capability(_) => Pillar::Capability,
            MetricReading::Physical(_) => Pillar::Physical,
            MetricReading::Relationships(_) => Pillar::Relationships,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PillarMetric {
    pub id: Uuid,
    pub date: NaiveDate,
    pub reading: MetricReading,
    pub recorded_at: DateTime<Utc>,
}

// ============================================================================
// Calendar and Kanban
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub pillar: Option<Pillar>,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub notes: Option<String>,
    pub xp: i64,
    pub completed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KanbanBoard {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KanbanColumn {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub order: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KanbanTask {
    pub id: Uuid,
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub pillar: Option<Pillar>,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
    pub xp: i64,
    pub order: usize,
    /// XP is granted on the first transition to done only
    pub xp_awarded: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// History and State
// ============================================================================

/// A single XP movement in the ledger's journal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub pillar: Pillar,
    pub source: HistorySource,
    pub reference_id: Uuid,
    pub xp: i64,
    pub title: String,
    pub date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        pillar: Pillar,
        source: HistorySource,
        reference_id: Uuid,
        xp: i64,
        title: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pillar,
            source,
            reference_id,
            xp,
            title: title.into(),
            date,
            recorded_at: Utc::now(),
        }
    }
}

/// Everything the tracker persists between runs
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct TrackerState {
    #[serde(default)]
    pub ledger: Ledger,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub completions: Vec<EventCompletion>,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub shields: Vec<DopamineShield>,
    #[serde(default)]
    pub relapses: Vec<Relapse>,
    #[serde(default)]
    pub metrics: Vec<PillarMetric>,
    #[serde(default)]
    pub calendar: Vec<CalendarEvent>,
    #[serde(default)]
    pub boards: Vec<KanbanBoard>,
    #[serde(default)]
    pub columns: Vec<KanbanColumn>,
    #[serde(default)]
    pub tasks: Vec<KanbanTask>,
}
