//! Terminal output for list and status views.

use chrono::NaiveDate;
use franco_core::events::AgendaItem;
use franco_core::kanban::BoardView;
use franco_core::shield::{shield_value, todays_worth};
use franco_core::*;

const BAR_WIDTH: usize = 20;

fn bar(progress: &LevelProgress) -> String {
    let filled = ((progress.progress * BAR_WIDTH as f64).floor() as usize).min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn status(state: &TrackerState, today: NaiveDate) {
    let ledger = &state.ledger;
    let overall = ledger.overall_progress();
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  FRANCO · {}", today);
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  Overall  level {:<3} {:>7} XP {} {:>3.0}%",
        ledger.overall_level(),
        ledger.total_xp(),
        bar(&overall),
        overall.progress * 100.0
    );
    println!();

    for pillar in Pillar::ALL {
        let p = ledger.pillar(*pillar);
        let progress = p.progress();
        println!(
            "  {:<14} level {:<3} {:>7} XP {} {:>3.0}%",
            pillar,
            p.level(),
            p.total_xp,
            bar(&progress),
            progress.progress * 100.0
        );
    }

    if !state.shields.is_empty() {
        println!("\n  Shields");
        for s in &state.shields {
            println!(
                "  🛡 {} ({}): day {}, worth {} XP, next day +{}",
                s.title,
                s.pillar,
                s.streak_days,
                shield_value(s),
                todays_worth(s)
            );
        }
    }

    let items = events::agenda(state, today);
    let pending = items.iter().filter(|i| !i.done).count();
    println!("\n  Today: {} events, {} pending", items.len(), pending);
    println!();
}

pub fn agenda(items: &[AgendaItem], date: NaiveDate) {
    if items.is_empty() {
        println!("Nothing scheduled on {}.", date);
        return;
    }
    for item in items {
        let e = &item.event;
        println!(
            "{} {} {:<30} {:<14} {:>4} XP  {}",
            if item.done { "[x]" } else { "[ ]" },
            e.time.map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string()),
            e.title,
            e.pillar,
            e.xp,
            e.id
        );
    }
}

pub fn objectives(list: &[&Objective]) {
    if list.is_empty() {
        println!("No objectives.");
        return;
    }
    for o in list {
        let mark = match (o.completed_on, o.milestone) {
            (Some(_), _) => "✓",
            (None, true) => "★",
            (None, false) => "·",
        };
        println!(
            "{} {:<30} {:<14} {:>3}%  due {}  {} XP  {}",
            mark,
            o.title,
            o.pillar,
            o.progress,
            opt(&o.deadline),
            o.xp,
            o.id
        );
    }
}

pub fn shields(state: &TrackerState) {
    if state.shields.is_empty() {
        println!("No shields.");
        return;
    }
    for s in &state.shields {
        let relapses = shield::relapses_for(state, s.id);
        println!(
            "{:<30} {:<14} streak {:>3} (best {}), worth {} XP, {} relapses  {}",
            s.title,
            s.pillar,
            s.streak_days,
            s.max_streak,
            shield_value(s),
            relapses.len(),
            s.id
        );
    }
}

pub fn metrics(list: &[&PillarMetric]) {
    if list.is_empty() {
        println!("No metrics recorded.");
        return;
    }
    for m in list {
        let details = match &m.reading {
            MetricReading::Finance(r) => format!(
                "income {} expenses {} savings {}",
                opt(&r.income),
                opt(&r.expenses),
                opt(&r.savings)
            ),
            MetricReading::Capability(r) => format!(
                "focused {}h unfocused {}h energy {}",
                opt(&r.focused_hours),
                opt(&r.unfocused_hours),
                opt(&r.energy)
            ),
            MetricReading::Physical(r) => format!(
                "weight {}kg sleep {}h trained {}",
                opt(&r.weight_kg),
                opt(&r.sleep_hours),
                opt(&r.trained_today)
            ),
            MetricReading::Relationships(r) => format!(
                "interactions {} quality {} {}",
                opt(&r.social_interactions),
                opt(&r.quality),
                r.notes.as_deref().unwrap_or("")
            ),
        };
        println!("{} {:<14} {}", m.date, m.reading.pillar(), details);
    }
}

pub fn history(page: &HistoryPage) {
    if page.entries.is_empty() {
        println!("No history entries.");
        return;
    }
    for e in &page.entries {
        println!(
            "{} {:>+6} XP  {:<14} {:<10} {}  {}",
            e.date, e.xp, e.pillar, e.source, e.title, e.id
        );
    }
    if let Some(cursor) = page.next_cursor {
        println!("\nMore entries: --cursor {}", cursor);
    }
}

pub fn board(view: &BoardView) {
    println!("{} ({})", view.board.title, view.board.color);
    for col in &view.columns {
        println!("\n  {}  {}", col.column.title, col.column.id);
        if col.tasks.is_empty() {
            println!("    (empty)");
        }
        for t in &col.tasks {
            println!(
                "    {}. {:<30} {:<11} {:<5} {:<14} {}",
                t.order + 1,
                t.title,
                t.status,
                t.priority,
                opt(&t.pillar),
                t.id
            );
        }
    }
}

pub fn calendar(list: &[&CalendarEvent]) {
    if list.is_empty() {
        println!("No calendar entries.");
        return;
    }
    for c in list {
        let slot = match (c.start_time, c.end_time) {
            (Some(s), Some(e)) => format!("{}-{}", s.format("%H:%M"), e.format("%H:%M")),
            (Some(s), None) => s.format("%H:%M").to_string(),
            _ => "all day".to_string(),
        };
        println!(
            "{} {} {:<11} {:<30} {}  {}",
            if c.completed { "[x]" } else { "[ ]" },
            c.date,
            slot,
            c.title,
            opt(&c.pillar),
            c.id
        );
    }
}
