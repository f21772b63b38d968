use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use trainlog_core::csv_rollup::{self, CSV_FILE};
use trainlog_core::format::{format_hms, format_ms};
use trainlog_core::journal::JOURNAL_FILE;
use trainlog_core::plan::{DayPlan, MainBlock};
use trainlog_core::progression::DaySuggestions;
use trainlog_core::*;

#[derive(Parser)]
#[command(name = "trainlog")]
#[command(about = "Training log with wall-clock workout, rest and interval timers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretend the current time is this RFC 3339 instant
    #[arg(long, global = true, hide = true, value_parser = parse_instant)]
    at: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the selected day with its log, timers and suggestions (default)
    Today,

    /// Select the day of the plan to work on
    Day { key: String },

    /// Switch run instructions between treadmill and outdoor
    Mode { mode: ModeArg },

    /// Control the workout timer
    Session { action: SessionAction },

    /// Record load and/or reps for a set of the selected day
    Log {
        #[arg(long)]
        exercise: String,

        #[arg(long)]
        set: u32,

        #[arg(long)]
        load: Option<f64>,

        #[arg(long)]
        reps: Option<u32>,
    },

    /// Tick a set as done and start its rest countdown
    Done {
        #[arg(long)]
        exercise: String,

        #[arg(long)]
        set: u32,

        /// Untick instead
        #[arg(long)]
        undo: bool,
    },

    /// Set the rest countdown length in seconds (10-600)
    Rest { seconds: u32 },

    /// Whether ticking a set surfaces its rest countdown
    AutoRest { toggle: Toggle },

    /// Mobility item countdowns for the selected day
    Mobility { action: MobilityAction, item: String },

    /// Clear this week's log for the selected day
    ResetDay,

    /// Clear this week's log
    ResetWeek,

    /// Show progression suggestions for the selected day
    Suggest,

    /// Show consecutive completed days
    Streak,

    /// Report timers that ran out
    Poll {
        /// Keep polling until no timer is left running
        #[arg(long)]
        watch: bool,
    },

    /// Run the interval timer in the foreground
    Interval {
        #[arg(long)]
        work: Option<u32>,

        #[arg(long)]
        rest: Option<u32>,

        #[arg(long)]
        rounds: Option<u32>,

        /// Stop after each phase instead of advancing
        #[arg(long)]
        manual: bool,
    },

    /// Roll the workout journal up into CSV
    Rollup {
        /// Clean up processed journals after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Treadmill,
    Outdoor,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Treadmill => Mode::Treadmill,
            ModeArg::Outdoor => Mode::Outdoor,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SessionAction {
    Start,
    Pause,
    End,
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
enum MobilityAction {
    Start,
    Done,
    Undo,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time {:?}: {}", s, e))
}

/// System time, or a pinned instant that only moves when the CLI waits
#[derive(Clone)]
enum CliClock {
    System(SystemClock),
    Pinned(ManualClock),
}

impl CliClock {
    fn wait(&self, ms: u64) {
        match self {
            CliClock::System(_) => std::thread::sleep(Duration::from_millis(ms)),
            CliClock::Pinned(clock) => clock.advance_ms(ms as i64),
        }
    }
}

impl Clock for CliClock {
    fn now_ms(&self) -> Millis {
        match self {
            CliClock::System(clock) => clock.now_ms(),
            CliClock::Pinned(clock) => clock.now_ms(),
        }
    }
}

/// Prints each expiry and rings the terminal bell
struct TerminalBell;

impl Notifier for TerminalBell {
    fn fire(&mut self, event: &TimerEvent) {
        println!("{}", describe_event(event));
        let mut stderr = io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

fn describe_event(event: &TimerEvent) -> String {
    match event {
        TimerEvent::RestFinished {
            day,
            exercise_id,
            set_index,
            ..
        } => format!("Rest finished: {} {} set {}", day, exercise_id, set_index),
        TimerEvent::MobilityFinished { day, item_id } => {
            format!("Mobility finished: {} {}", day, item_id)
        }
        TimerEvent::IntervalPhaseEnded { ended, round, next } => {
            format!("Interval {:?} done (round {}), next: {:?}", ended, round, next)
        }
    }
}

type CliEngine = Engine<CliClock, JsonFileStore>;

fn main() -> Result<()> {
    // Stdout carries command output; keep diagnostics quiet unless asked
    trainlog_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    let plan = match &config.plan.path {
        Some(path) => Plan::load_from(path)?,
        None => default_plan().clone(),
    };

    let clock = match cli.at {
        Some(at) => CliClock::Pinned(ManualClock::from_datetime(at)),
        None => CliClock::System(SystemClock),
    };

    tracing::debug!("Using data directory {:?}", data_dir);
    let store = JsonFileStore::in_dir(&data_dir.join("state"));
    let mut engine = Engine::new(clock.clone(), store, plan, &config);

    match cli.command.unwrap_or(Commands::Today) {
        Commands::Today => cmd_today(&engine),
        Commands::Day { key } => {
            if !engine.select_day(&key) {
                let keys: Vec<_> = engine.plan().days.iter().map(|d| d.key.as_str()).collect();
                return Err(Error::Plan(format!(
                    "unknown day {:?} (expected one of {})",
                    key,
                    keys.join(", ")
                )));
            }
            println!("Selected {}", day_name(&engine));
        }
        Commands::Mode { mode } => {
            engine.set_mode(mode.into());
            println!("Mode: {}", mode_name(engine.state().mode));
        }
        Commands::Session { action } => cmd_session(&mut engine, action, &data_dir)?,
        Commands::Log {
            exercise,
            set,
            load,
            reps,
        } => cmd_log(&mut engine, &exercise, set, load, reps)?,
        Commands::Done {
            exercise,
            set,
            undo,
        } => cmd_done(&mut engine, &exercise, set, undo)?,
        Commands::Rest { seconds } => {
            let stored = engine.set_rest_default_seconds(seconds);
            println!("Rest: {}s", stored);
        }
        Commands::AutoRest { toggle } => {
            let enabled = matches!(toggle, Toggle::On);
            engine.set_auto_start_rest(enabled);
            println!("Auto rest: {}", if enabled { "on" } else { "off" });
        }
        Commands::Mobility { action, item } => cmd_mobility(&mut engine, action, &item)?,
        Commands::ResetDay => {
            let week = engine.current_week();
            let day = selected_key(&engine)?;
            engine.reset_day(week, &day);
            println!("Cleared {} for week {}", day, week);
        }
        Commands::ResetWeek => {
            let week = engine.current_week();
            engine.reset_week(week);
            println!("Cleared week {}", week);
        }
        Commands::Suggest => cmd_suggest(&engine)?,
        Commands::Streak => println!("Streak: {} day(s)", engine.streak()),
        Commands::Poll { watch } => cmd_poll(&mut engine, &clock, watch, &config),
        Commands::Interval {
            work,
            rest,
            rounds,
            manual,
        } => cmd_interval(&mut engine, &clock, &config, work, rest, rounds, manual),
        Commands::Rollup { cleanup } => cmd_rollup(&data_dir, cleanup)?,
    }

    engine.flush()
}

fn selected_key(engine: &CliEngine) -> Result<String> {
    engine
        .selected_day()
        .map(|d| d.key.clone())
        .ok_or_else(|| Error::Plan("plan has no days".into()))
}

fn selected_day(engine: &CliEngine) -> Result<&DayPlan> {
    engine
        .selected_day()
        .ok_or_else(|| Error::Plan("plan has no days".into()))
}

fn day_name(engine: &CliEngine) -> String {
    engine
        .selected_day()
        .map_or_else(|| "-".to_string(), |d| d.name.clone())
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Treadmill => "treadmill",
        Mode::Outdoor => "outdoor",
    }
}

fn format_load(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{}", v))
}

fn cmd_today(engine: &CliEngine) {
    let week = engine.current_week();
    let state = engine.state();
    let Some(day) = engine.selected_day() else {
        println!("Week {}: the plan has no days", week);
        return;
    };

    println!("Week {} | {} ({})", week, day.name, mode_name(state.mode));
    println!(
        "Workout: {}{}",
        format_hms(engine.session_elapsed_ms()),
        if state.workout_session.running { "" } else { " (paused)" }
    );

    if !day.warmup.is_empty() {
        println!("\nWarm-up:");
        for line in &day.warmup {
            println!("  - {}", line);
        }
    }

    match &day.main {
        MainBlock::Strength { exercises } => {
            for ex in exercises {
                println!("\n{} ({}) {} x {}", ex.name, ex.id, ex.sets, ex.target_reps);
                for set in 1..=ex.sets {
                    let record = engine.get_set_record(week, &day.key, &ex.id, set);
                    let last = engine.prior_week_value(week, &day.key, &ex.id, set, SetField::Load);
                    let rest = engine.rest_remaining_ms(week, &day.key, &ex.id, set);
                    print!(
                        "  set {}: load {}, reps {} [{}]",
                        set,
                        format_load(record.load_value),
                        record
                            .reps_value
                            .map_or_else(|| "-".to_string(), |r| r.to_string()),
                        if record.done { "x" } else { " " }
                    );
                    if last.is_some() {
                        print!("  last week {}", format_load(last));
                    }
                    if rest > 0 && state.auto_start_rest_on_set_done {
                        print!("  rest {}", format_ms(rest));
                    }
                    println!();
                }
                if let Some(load) = engine.strength_suggestion(week, &day.key, &ex.id) {
                    println!("  suggested load: {}", load);
                }
            }
        }
        MainBlock::Run {
            title,
            details_by_mode,
            ..
        } => {
            println!("\n{}:", title);
            for line in details_by_mode.for_mode(state.mode) {
                println!("  - {}", line);
            }
            if day.shows_interval_timer() {
                println!("  (run `trainlog interval` for the interval timer)");
            }
        }
        MainBlock::Rest { details } => {
            println!("\nRest day:");
            for line in details {
                println!("  - {}", line);
            }
        }
    }

    if !day.mobility.is_empty() {
        println!("\nMobility:");
        for item in &day.mobility {
            let status = if engine.mobility_done(&day.key, &item.id) {
                "done".to_string()
            } else {
                match engine.mobility_remaining_ms(&day.key, &item.id) {
                    0 => format!("{}s", item.seconds),
                    left => format!("{} left", format_ms(left)),
                }
            };
            println!("  {} ({}): {}", item.name, item.id, status);
        }
    }

    println!("\nStreak: {} day(s)", engine.streak());
}

fn cmd_session(engine: &mut CliEngine, action: SessionAction, data_dir: &Path) -> Result<()> {
    match action {
        SessionAction::Start => {
            if !engine.start_session() {
                println!("Workout already running");
            }
            println!("Workout: {}", format_hms(engine.session_elapsed_ms()));
        }
        SessionAction::Pause => {
            if !engine.pause_session() {
                println!("Workout not running");
            }
            println!("Workout: {} (paused)", format_hms(engine.session_elapsed_ms()));
        }
        SessionAction::End => {
            let snapshot = engine.end_session();
            let mut sink = JsonlSink::in_dir(&data_dir.join("history"));
            sink.append(&snapshot)?;
            println!("Workout logged: {}", format_hms(snapshot.elapsed_ms));
            println!("Streak: {} day(s)", engine.streak());
        }
        SessionAction::Reset => {
            engine.reset_session();
            println!("Workout: {}", format_hms(0));
        }
    }
    Ok(())
}

fn require_exercise(engine: &CliEngine, exercise: &str) -> Result<String> {
    let day = selected_day(engine)?;
    if day.exercise(exercise).is_none() {
        return Err(Error::Plan(format!(
            "{} has no exercise {:?}",
            day.key, exercise
        )));
    }
    Ok(day.key.clone())
}

fn cmd_log(
    engine: &mut CliEngine,
    exercise: &str,
    set: u32,
    load: Option<f64>,
    reps: Option<u32>,
) -> Result<()> {
    let day = require_exercise(engine, exercise)?;
    let week = engine.current_week();

    if let Some(load) = load {
        engine.set_field(week, &day, exercise, set, SetField::Load, Some(load));
    }
    if let Some(reps) = reps {
        engine.set_field(week, &day, exercise, set, SetField::Reps, Some(f64::from(reps)));
    }

    let record = engine.get_set_record(week, &day, exercise, set);
    println!(
        "{} set {}: load {}, reps {}",
        exercise,
        set,
        format_load(record.load_value),
        record
            .reps_value
            .map_or_else(|| "-".to_string(), |r| r.to_string())
    );
    Ok(())
}

fn cmd_done(engine: &mut CliEngine, exercise: &str, set: u32, undo: bool) -> Result<()> {
    let day = require_exercise(engine, exercise)?;
    let week = engine.current_week();

    engine.mark_set_done(week, &day, exercise, set, !undo);
    if undo {
        println!("{} set {}: not done", exercise, set);
    } else if engine.state().auto_start_rest_on_set_done {
        println!(
            "{} set {}: done, rest {}",
            exercise,
            set,
            format_ms(engine.rest_remaining_ms(week, &day, exercise, set))
        );
    } else {
        println!("{} set {}: done", exercise, set);
    }
    Ok(())
}

fn cmd_mobility(engine: &mut CliEngine, action: MobilityAction, item: &str) -> Result<()> {
    let day = selected_key(engine)?;
    let Some(seconds) = selected_day(engine)?.mobility_item(item).map(|m| m.seconds) else {
        return Err(Error::Plan(format!("{} has no mobility item {:?}", day, item)));
    };

    match action {
        MobilityAction::Start => {
            engine.start_mobility(&day, item);
            println!("{}: {} left", item, format_ms(i64::from(seconds) * 1000));
        }
        MobilityAction::Done => {
            engine.set_mobility_done(&day, item, true);
            println!("{}: done", item);
        }
        MobilityAction::Undo => {
            engine.set_mobility_done(&day, item, false);
            println!("{}: not done", item);
        }
    }
    Ok(())
}

fn cmd_suggest(engine: &CliEngine) -> Result<()> {
    let week = engine.current_week();
    let day = selected_day(engine)?;

    match engine.suggestions(week, &day.key) {
        DaySuggestions::Strength { loads } => {
            for (id, load) in loads {
                match load {
                    Some(load) => println!("{}: {}", id, load),
                    None => println!("{}: no suggestion", id),
                }
            }
        }
        DaySuggestions::Interval(s) => {
            println!("Intervals: {} rounds, speed +{:.1} km/h", s.rounds, s.speed_bump);
        }
        DaySuggestions::Tempo { minutes } => println!("Tempo: {} min", minutes),
        DaySuggestions::LongRun { minutes } => println!("Long run: {} min", minutes),
        DaySuggestions::None => println!("No suggestions for {}", day.key),
    }
    Ok(())
}

fn cmd_poll(engine: &mut CliEngine, clock: &CliClock, watch: bool, config: &Config) {
    let mut bell = TerminalBell;
    let mut fired = engine.poll(&mut bell).len();

    while watch && engine.has_live_timers() {
        clock.wait(config.engine.poll_interval_ms);
        fired += engine.poll(&mut bell).len();
    }

    if fired == 0 && !watch {
        println!("No timers finished");
    }
}

fn cmd_interval(
    engine: &mut CliEngine,
    clock: &CliClock,
    config: &Config,
    work: Option<u32>,
    rest: Option<u32>,
    rounds: Option<u32>,
    manual: bool,
) {
    let mut interval = config.interval.clone();
    if let Some(work) = work {
        interval.work_seconds = work;
    }
    if let Some(rest) = rest {
        interval.rest_seconds = rest;
    }
    if let Some(rounds) = rounds {
        interval.rounds = rounds;
    }
    interval.auto_advance = !manual;
    engine.set_interval_config(interval);

    let cfg = engine.interval_config().clone();
    println!(
        "Intervals: {} x {}s work / {}s rest",
        cfg.rounds, cfg.work_seconds, cfg.rest_seconds
    );

    engine.start_interval();
    let mut bell = TerminalBell;
    while engine.interval().is_active() {
        clock.wait(config.engine.poll_interval_ms);
        engine.poll(&mut bell);
    }
    println!("Intervals finished");
}

fn cmd_rollup(data_dir: &Path, cleanup: bool) -> Result<()> {
    let history_dir = data_dir.join("history");
    let journal_path = history_dir.join(JOURNAL_FILE);
    let csv_path = data_dir.join(CSV_FILE);

    if !journal_path.exists() {
        println!("No journal found - nothing to roll up.");
        return Ok(());
    }

    let count = csv_rollup::journal_to_csv_and_archive(&journal_path, &csv_path)?;
    println!("Rolled up {} workouts to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = csv_rollup::cleanup_processed(&history_dir)?;
        if cleaned > 0 {
            println!("Cleaned up {} processed journals", cleaned);
        }
    }
    Ok(())
}
