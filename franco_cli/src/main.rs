use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use franco_core::calendar::{self, NewCalendarEvent};
use franco_core::events::{self, NewEvent};
use franco_core::kanban::{self, NewBoard, NewTask};
use franco_core::metrics;
use franco_core::objectives::{self, NewObjective};
use franco_core::shield::{self, NewShield, RelapseReport};
use franco_core::*;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

mod render;

#[derive(Parser)]
#[command(name = "franco")]
#[command(about = "Personal habit tracker with pillar XP and streak shields", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Act as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Levels per pillar, shields and today's agenda (default)
    Status,

    /// XP calculator
    #[command(subcommand)]
    Xp(XpCommand),

    /// Recurring events
    #[command(subcommand)]
    Event(EventCommand),

    /// Long-running objectives
    #[command(subcommand)]
    Objective(ObjectiveCommand),

    /// Dopamine shields
    #[command(subcommand)]
    Shield(ShieldCommand),

    /// Daily pillar metrics
    #[command(subcommand)]
    Metric(MetricCommand),

    /// XP history feed
    History(HistoryArgs),

    /// Kanban boards
    #[command(subcommand)]
    Kanban(KanbanCommand),

    /// Calendar appointments
    #[command(subcommand)]
    Calendar(CalendarCommand),

    /// Move the history journal into the CSV archive
    Rollup {
        /// Delete processed journals afterwards
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum XpCommand {
    /// Level reached with a number of points
    Level {
        #[arg(allow_negative_numbers = true)]
        points: i64,
    },
    /// Points needed to reach a level
    Threshold {
        #[arg(allow_negative_numbers = true)]
        level: i64,
    },
    /// Reward of a streak of `days` at `rate` XP per day
    Streak {
        #[arg(allow_negative_numbers = true)]
        days: i64,
        #[arg(long, default_value_t = 50, allow_negative_numbers = true)]
        rate: i64,
    },
}

#[derive(Subcommand)]
enum EventCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        pillar: Pillar,
        #[arg(long, default_value = "none")]
        recurrence: Recurrence,
        /// First occurrence; defaults to today
        #[arg(long = "on")]
        on: Option<NaiveDate>,
        /// Time of day (HH:MM)
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        xp: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Agenda for today (or `--on`)
    List {
        #[arg(long = "on")]
        on: Option<NaiveDate>,
    },
    Done {
        id: Uuid,
        #[arg(long = "on")]
        on: Option<NaiveDate>,
    },
    Undo {
        id: Uuid,
        #[arg(long = "on")]
        on: Option<NaiveDate>,
    },
    Rm {
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum ObjectiveCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        pillar: Pillar,
        #[arg(long)]
        deadline: Option<NaiveDate>,
        #[arg(long)]
        xp: Option<i64>,
        #[arg(long)]
        milestone: bool,
        #[arg(long)]
        description: Option<String>,
    },
    /// Set progress percentage
    Progress {
        id: Uuid,
        #[arg(allow_negative_numbers = true)]
        percent: i64,
    },
    Done {
        id: Uuid,
    },
    List {
        #[arg(long)]
        pillar: Option<Pillar>,
    },
    Rm {
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum ShieldCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        pillar: Pillar,
        #[arg(long)]
        xp_per_day: Option<i64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notifications: bool,
    },
    List,
    /// Credit clean days elapsed up to today
    Tick,
    Relapse {
        id: Uuid,
        #[arg(long, default_value = "moderada")]
        intensity: Intensity,
        #[arg(long)]
        reflection: Option<String>,
    },
    Rm {
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum MetricCommand {
    Finance {
        #[arg(long)]
        income: Option<f64>,
        #[arg(long)]
        expenses: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        savings: Option<f64>,
    },
    Capability {
        #[arg(long)]
        focused_hours: Option<f64>,
        #[arg(long)]
        unfocused_hours: Option<f64>,
        #[arg(long)]
        energy: Option<EnergyLevel>,
    },
    Physical {
        #[arg(long)]
        weight_kg: Option<f64>,
        #[arg(long)]
        sleep_hours: Option<f64>,
        #[arg(long)]
        trained: Option<bool>,
    },
    Relationships {
        #[arg(long)]
        interactions: Option<u32>,
        #[arg(long)]
        quality: Option<RelationshipQuality>,
        #[arg(long)]
        notes: Option<String>,
    },
    List {
        #[arg(long)]
        pillar: Option<Pillar>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Args)]
struct HistoryArgs {
    #[arg(long)]
    pillar: Option<Pillar>,
    #[arg(long)]
    source: Option<HistorySource>,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Case-insensitive title search
    #[arg(long)]
    search: Option<String>,
    #[arg(long, default_value = "recent")]
    sort: SortOrder,
    /// Id of the last entry of the previous page
    #[arg(long)]
    cursor: Option<Uuid>,
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Subcommand)]
enum KanbanCommand {
    /// Create a board
    Board {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Append a column to a board
    Column {
        board: Uuid,
        #[arg(long)]
        title: String,
    },
    /// Append a task to a column
    Task {
        column: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        pillar: Option<Pillar>,
        #[arg(long, default_value = "media")]
        priority: Priority,
        #[arg(long)]
        deadline: Option<NaiveDate>,
        #[arg(long)]
        xp: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    Move {
        task: Uuid,
        column: Uuid,
        /// Position in the target column; defaults to the end
        #[arg(long)]
        order: Option<usize>,
    },
    Status {
        task: Uuid,
        status: TaskStatus,
    },
    Show {
        board: Uuid,
    },
    RmTask {
        task: Uuid,
    },
}

#[derive(Subcommand)]
enum CalendarCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long = "on")]
        on: NaiveDate,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        pillar: Option<Pillar>,
        #[arg(long, default_value_t = 0)]
        xp: i64,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Entries in a date range; defaults to the next 7 days
    List {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    Done {
        id: Uuid,
    },
    Rm {
        id: Uuid,
    },
}

fn main() -> ExitCode {
    franco_core::logging::init_with_level("warn");

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.kind() == ErrorKind::Internal {
                tracing::error!("{}", e);
            }
            eprintln!("error[{}]: {}", e.kind().code(), e.public_message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let today = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    // Opened lazily: the calculator never touches the data directory
    let store = || Store::open(&data_dir);

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Xp(cmd) => {
            cmd_xp(cmd);
            Ok(())
        }
        Commands::Status => cmd_status(&store()?, today),
        Commands::Event(cmd) => cmd_event(&store()?, &config, today, cmd),
        Commands::Objective(cmd) => cmd_objective(&store()?, &config, today, cmd),
        Commands::Shield(cmd) => cmd_shield(&store()?, &config, today, cmd),
        Commands::Metric(cmd) => cmd_metric(&store()?, &config, today, cmd),
        Commands::History(args) => cmd_history(&store()?, &config, args),
        Commands::Kanban(cmd) => cmd_kanban(&store()?, &config, today, cmd),
        Commands::Calendar(cmd) => cmd_calendar(&store()?, today, cmd),
        Commands::Rollup { cleanup } => cmd_rollup(&store()?, cleanup),
    }
}

fn cmd_status(store: &Store, today: NaiveDate) -> Result<()> {
    let state = store.load()?;
    render::status(&state, today);
    Ok(())
}

fn cmd_xp(cmd: XpCommand) {
    match cmd {
        XpCommand::Level { points } => {
            let level = level_for_points(points);
            let progress = level_progress(points);
            println!("Level {}", level);
            println!(
                "  {} / {} XP toward level {} ({:.0}%)",
                progress.current_level_points,
                progress.next_level_points,
                level.saturating_add(1),
                progress.progress * 100.0
            );
        }
        XpCommand::Threshold { level } => {
            println!("{}", points_required_for_level(level));
        }
        XpCommand::Streak { days, rate } => {
            println!("Day {} is worth {} XP", days, daily_streak_reward(days, rate));
            println!(
                "Streak total: {} XP",
                cumulative_streak_reward(days, rate)
            );
        }
    }
}

fn cmd_event(store: &Store, config: &Config, today: NaiveDate, cmd: EventCommand) -> Result<()> {
    match cmd {
        EventCommand::Add {
            title,
            pillar,
            recurrence,
            on,
            time,
            xp,
            description,
        } => {
            let input = NewEvent {
                title,
                description,
                pillar,
                recurrence,
                date: on.unwrap_or(today),
                time,
                xp: xp.unwrap_or(config.rewards.default_event_xp),
            };
            let id = store.transact(|s| events::add_event(s, input))?;
            println!("Created event {}", id);
        }
        EventCommand::List { on } => {
            let date = on.unwrap_or(today);
            let state = store.load()?;
            render::agenda(&events::agenda(&state, date), date);
        }
        EventCommand::Done { id, on } => {
            let entry = store.transact(|s| events::complete_event(s, id, on.unwrap_or(today)))?;
            println!("✓ {} (+{} XP {})", entry.title, entry.xp, entry.pillar);
        }
        EventCommand::Undo { id, on } => {
            let entry = store.transact(|s| events::uncomplete_event(s, id, on.unwrap_or(today)))?;
            println!("{} ({} XP {})", entry.title, entry.xp, entry.pillar);
        }
        EventCommand::Rm { id } => {
            let event = store.transact(|s| events::remove_event(s, id))?;
            println!("Removed event '{}'", event.title);
        }
    }
    Ok(())
}

fn cmd_objective(
    store: &Store,
    config: &Config,
    today: NaiveDate,
    cmd: ObjectiveCommand,
) -> Result<()> {
    match cmd {
        ObjectiveCommand::Add {
            title,
            pillar,
            deadline,
            xp,
            milestone,
            description,
        } => {
            let input = NewObjective {
                title,
                description,
                pillar,
                deadline,
                xp: xp.unwrap_or(config.rewards.default_objective_xp),
                milestone,
            };
            let id = store.transact(|s| objectives::add_objective(s, input))?;
            println!("Created objective {}", id);
        }
        ObjectiveCommand::Progress { id, percent } => {
            store.transact(|s| objectives::set_progress(s, id, percent))?;
            println!("Progress set to {}%", percent);
        }
        ObjectiveCommand::Done { id } => {
            let entry = store.transact(|s| objectives::complete_objective(s, id, today))?;
            println!("✓ {} (+{} XP {})", entry.title, entry.xp, entry.pillar);
        }
        ObjectiveCommand::List { pillar } => {
            let state = store.load()?;
            render::objectives(&objectives::list_objectives(&state, pillar));
        }
        ObjectiveCommand::Rm { id } => {
            let objective = store.transact(|s| objectives::remove_objective(s, id))?;
            println!("Removed objective '{}'", objective.title);
        }
    }
    Ok(())
}

fn cmd_shield(store: &Store, config: &Config, today: NaiveDate, cmd: ShieldCommand) -> Result<()> {
    match cmd {
        ShieldCommand::Add {
            title,
            pillar,
            xp_per_day,
            description,
            notifications,
        } => {
            let input = NewShield {
                title,
                description,
                pillar,
                xp_per_day: xp_per_day.unwrap_or(config.rewards.default_shield_xp_per_day),
                notifications: notifications || config.shields.notifications,
            };
            let id = store.transact(|s| shield::add_shield(s, input, today))?;
            println!("Created shield {}", id);
        }
        ShieldCommand::List => {
            let state = store.load()?;
            render::shields(&state);
        }
        ShieldCommand::Tick => {
            let postings = store.transact(|s| Ok(shield::tick_shields(s, today)))?;
            if postings.is_empty() {
                println!("No new clean days to credit.");
            }
            for entry in postings {
                println!("✓ {} (+{} XP {})", entry.title, entry.xp, entry.pillar);
            }
        }
        ShieldCommand::Relapse {
            id,
            intensity,
            reflection,
        } => {
            let report = RelapseReport {
                intensity,
                reflection,
            };
            let relapse = store.transact(|s| shield::record_relapse(s, id, report, today))?;
            println!(
                "Relapse recorded after {} days: -{} XP",
                relapse.streak_days, relapse.xp_lost
            );
        }
        ShieldCommand::Rm { id } => {
            let removed = store.transact(|s| shield::remove_shield(s, id))?;
            println!("Removed shield '{}'", removed.title);
        }
    }
    Ok(())
}

fn cmd_metric(store: &Store, config: &Config, today: NaiveDate, cmd: MetricCommand) -> Result<()> {
    let reading = match cmd {
        MetricCommand::Finance {
            income,
            expenses,
            savings,
        } => MetricReading::Finance(FinanceReading {
            income,
            expenses,
            savings,
        }),
        MetricCommand::Capability {
            focused_hours,
            unfocused_hours,
            energy,
        } => MetricReading::Capability(CapabilityReading {
            focused_hours,
            unfocused_hours,
            energy,
        }),
        MetricCommand::Physical {
            weight_kg,
            sleep_hours,
            trained,
        } => MetricReading::Physical(PhysicalReading {
            weight_kg,
            sleep_hours,
            trained_today: trained,
        }),
        MetricCommand::Relationships {
            interactions,
            quality,
            notes,
        } => MetricReading::Relationships(RelationshipsReading {
            social_interactions: interactions,
            quality,
            notes,
        }),
        MetricCommand::List { pillar, from, to } => {
            let state = store.load()?;
            render::metrics(&metrics::metrics_for(&state, pillar, from, to));
            return Ok(());
        }
    };

    let pillar = reading.pillar();
    let metric_xp = config.rewards.metric_xp;
    store.transact(|s| metrics::record_metric(s, reading, today, metric_xp))?;
    println!("✓ {} metric recorded for {} (+{} XP)", pillar, today, metric_xp);
    Ok(())
}

fn cmd_history(store: &Store, config: &Config, args: HistoryArgs) -> Result<()> {
    let filter = HistoryFilter {
        pillar: args.pillar,
        source: args.source,
        date_from: args.from,
        date_to: args.to,
        search: args.search,
        sort: args.sort,
        cursor: args.cursor,
        limit: args.limit.unwrap_or(config.history.page_size),
    };
    let page = store.history(&filter)?;
    render::history(&page);
    Ok(())
}

fn cmd_kanban(store: &Store, config: &Config, today: NaiveDate, cmd: KanbanCommand) -> Result<()> {
    match cmd {
        KanbanCommand::Board {
            title,
            description,
            color,
        } => {
            let input = NewBoard {
                title,
                description,
                color,
            };
            let id = store.transact(|s| kanban::add_board(s, input))?;
            println!("Created board {}", id);
        }
        KanbanCommand::Column { board, title } => {
            let id = store.transact(|s| kanban::add_column(s, board, &title))?;
            println!("Created column {}", id);
        }
        KanbanCommand::Task {
            column,
            title,
            pillar,
            priority,
            deadline,
            xp,
            description,
        } => {
            let input = NewTask {
                column_id: column,
                title,
                description,
                pillar,
                deadline,
                priority,
                xp: xp.unwrap_or(config.rewards.default_task_xp),
            };
            let id = store.transact(|s| kanban::add_task(s, input))?;
            println!("Created task {}", id);
        }
        KanbanCommand::Move {
            task,
            column,
            order,
        } => {
            store.transact(|s| kanban::move_task(s, task, column, order.unwrap_or(usize::MAX)))?;
            println!("Task moved");
        }
        KanbanCommand::Status { task, status } => {
            let posting = store.transact(|s| kanban::set_task_status(s, task, status, today))?;
            match posting {
                Some(entry) => println!("✓ {} (+{} XP {})", entry.title, entry.xp, entry.pillar),
                None => println!("Task is now {}", status),
            }
        }
        KanbanCommand::Show { board } => {
            let state = store.load()?;
            render::board(&kanban::board_view(&state, board)?);
        }
        KanbanCommand::RmTask { task } => {
            let removed = store.transact(|s| kanban::remove_task(s, task))?;
            println!("Removed task '{}'", removed.title);
        }
    }
    Ok(())
}

fn cmd_calendar(store: &Store, today: NaiveDate, cmd: CalendarCommand) -> Result<()> {
    match cmd {
        CalendarCommand::Add {
            title,
            on,
            start,
            end,
            pillar,
            xp,
            notes,
            description,
        } => {
            let input = NewCalendarEvent {
                title,
                description,
                pillar,
                date: on,
                start_time: start,
                end_time: end,
                notes,
                xp,
            };
            let id = store.transact(|s| calendar::add_calendar_event(s, input))?;
            println!("Created calendar entry {}", id);
        }
        CalendarCommand::List { from, to } => {
            let from = from.unwrap_or(today);
            let to = to.unwrap_or(from + chrono::Duration::days(6));
            let state = store.load()?;
            render::calendar(&calendar::calendar_range(&state, from, to));
        }
        CalendarCommand::Done { id } => {
            match store.transact(|s| calendar::complete_calendar_event(s, id))? {
                Some(entry) => println!("✓ {} (+{} XP {})", entry.title, entry.xp, entry.pillar),
                None => println!("✓ Marked as attended"),
            }
        }
        CalendarCommand::Rm { id } => {
            let removed = store.transact(|s| calendar::remove_calendar_event(s, id))?;
            println!("Removed calendar entry '{}'", removed.title);
        }
    }
    Ok(())
}

fn cmd_rollup(store: &Store, cleanup: bool) -> Result<()> {
    let report = store.rollup(cleanup)?;
    if report.archived == 0 {
        println!("Journal is empty - nothing to roll up.");
    } else {
        println!("✓ Rolled up {} history entries to CSV", report.archived);
        println!("  CSV: {}", store.csv_path().display());
    }
    if report.cleaned > 0 {
        println!("✓ Cleaned up {} processed journals", report.cleaned);
    }
    Ok(())
}
