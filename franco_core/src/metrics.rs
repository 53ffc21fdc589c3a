//! Daily per-pillar metric log.
//!
//! Each pillar gets at most one reading per day. Logging a reading grants a
//! small, configurable amount of XP to that pillar.

use crate::validation::{finite, hours, non_negative, optional_text};
use crate::{
    CapabilityReading, Error, FinanceReading, HistoryEntry, HistorySource, MetricReading,
    PhysicalReading, Pillar, PillarMetric, RelationshipsReading, Result, TrackerState,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// Check ranges and normalise free text for a reading
pub fn validate_reading(reading: MetricReading) -> Result<MetricReading> {
    let reading = match reading {
        MetricReading::Finance(r) => MetricReading::Finance(FinanceReading {
            income: non_negative("income", r.income)?,
            expenses: non_negative("expenses", r.expenses)?,
            savings: finite("savings", r.savings)?,
        }),
        MetricReading::Capability(r) => MetricReading::Capability(CapabilityReading {
            focused_hours: hours("focused_hours", r.focused_hours)?,
            unfocused_hours: hours("unfocused_hours", r.unfocused_hours)?,
            energy: r.energy,
        }),
        MetricReading::Physical(r) => {
            if let Some(w) = r.weight_kg {
                if !(w > 0.0 && w.is_finite()) {
                    return Err(Error::validation("weight_kg must be greater than 0"));
                }
            }
            MetricReading::Physical(PhysicalReading {
                weight_kg: r.weight_kg,
                sleep_hours: hours("sleep_hours", r.sleep_hours)?,
                trained_today: r.trained_today,
            })
        }
        MetricReading::Relationships(r) => MetricReading::Relationships(RelationshipsReading {
            social_interactions: r.social_interactions,
            quality: r.quality,
            notes: optional_text("notes", r.notes.as_deref(), 500)?,
        }),
    };
    Ok(reading)
}

/// Parse a reading from JSON, rejecting fields of other pillars
pub fn reading_from_json(json: &str) -> Result<MetricReading> {
    let reading: MetricReading = serde_json::from_str(json)
        .map_err(|e| Error::validation(format!("invalid metric: {}", e)))?;
    validate_reading(reading)
}

/// Store today's reading for its pillar and post the metric XP.
///
/// Returns the new metric id.
pub fn record_metric(
    state: &mut TrackerState,
    reading: MetricReading,
    date: NaiveDate,
    metric_xp: i64,
) -> Result<Uuid> {
    let reading = validate_reading(reading)?;
    let pillar = reading.pillar();

    if state
        .metrics
        .iter()
        .any(|m| m.date == date && m.reading.pillar() == pillar)
    {
        return Err(Error::validation(format!(
            "a {} metric is already recorded for {}",
            pillar, date
        )));
    }

    let metric = PillarMetric {
        id: Uuid::new_v4(),
        date,
        reading,
        recorded_at: Utc::now(),
    };
    let id = metric.id;
    state.metrics.push(metric);

    if metric_xp > 0 {
        state.ledger.post(HistoryEntry::new(
            pillar,
            HistorySource::Metric,
            id,
            metric_xp,
            format!("Metric logged: {}", pillar),
            date,
        ));
    }
    Ok(id)
}

/// Readings filtered by pillar and inclusive date range, newest first
pub fn metrics_for(
    state: &TrackerState,
    pillar: Option<Pillar>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<&PillarMetric> {
    let mut list: Vec<_> = state
        .metrics
        .iter()
        .filter(|m| pillar.map_or(true, |p| m.reading.pillar() == p))
        .filter(|m| from.map_or(true, |f| m.date >= f))
        .filter(|m| to.map_or(true, |t| m.date <= t))
        .collect();
    list.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.reading.pillar().cmp(&b.reading.pillar()))
    });
    list
}
