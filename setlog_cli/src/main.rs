use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use setlog_core::schedule::{self, DayView};
use setlog_core::session::{Phase, SessionEvent, Step};
use setlog_core::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "setlog")]
#[command(about = "Workout plan scheduler and live session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the active plan
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Show the workout scheduled for a day (default today)
    Today {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show the next scheduled workout
    Next {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show one week of the plan
    Week {
        /// Absolute week number counted from the plan start (0-based)
        #[arg(long)]
        index: Option<u32>,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Perform the scheduled workout
    Start {
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Perform this workout letter instead of the scheduled one
        #[arg(long)]
        letter: Option<String>,

        /// Auto-complete (for testing) - log every set at its target
        #[arg(long)]
        auto_complete: bool,
    },

    /// List recent workouts
    History {
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(i64).range(1..=36_500))]
        days: i64,
    },

    /// Export the workout log to CSV
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// Validate a plan JSON file, store it and make it active
    Import {
        file: PathBuf,

        /// Store under a fresh id even if the file carries one
        #[arg(long)]
        new_id: bool,
    },
    /// Print the active plan
    Show,
    /// Delete the active plan
    Delete,
}

struct Paths {
    plans: PathBuf,
    workouts: PathBuf,
    csv: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        Self {
            plans: data_dir.join("plans.json"),
            workouts: data_dir.join("workouts.jsonl"),
            csv: data_dir.join("workouts.csv"),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    setlog_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);
    tracing::debug!("Using data directory {:?}", data_dir);
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Plan { action } => cmd_plan(&paths, &config, action),
        Commands::Today { date } => cmd_today(&paths, &config, date.unwrap_or(today)),
        Commands::Next { date } => cmd_next(&paths, &config, date.unwrap_or(today)),
        Commands::Week { index, date } => {
            cmd_week(&paths, &config, index, date.unwrap_or(today))
        }
        Commands::Start {
            date,
            letter,
            auto_complete,
        } => cmd_start(
            &paths,
            &config,
            date.unwrap_or(today),
            letter,
            auto_complete,
        ),
        Commands::History { days } => cmd_history(&paths, days),
        Commands::Export { output } => {
            let csv_path = output.unwrap_or_else(|| paths.csv.clone());
            let count = setlog_core::export::export_csv(&paths.workouts, &csv_path)?;
            println!("✓ Exported {} sets", count);
            println!("  CSV: {}", csv_path.display());
            Ok(())
        }
    }
}

fn active_plan(paths: &Paths, config: &Config) -> Result<Option<Plan>> {
    let store = FilePlanStore::new(&paths.plans);
    let plan = store.active_plan(&config.user.id)?;
    if plan.is_none() {
        println!("No active plan. Import one with `setlog plan import <file>`.");
    }
    Ok(plan)
}

fn cmd_plan(paths: &Paths, config: &Config, action: PlanAction) -> Result<()> {
    let mut store = FilePlanStore::new(&paths.plans);

    match action {
        PlanAction::Import { file, new_id } => {
            let mut plan = match Plan::load_from(&file) {
                Ok(plan) => plan,
                Err(Error::PlanValidation(problems)) => {
                    eprintln!("Plan validation errors:");
                    for problem in problems.split("; ") {
                        eprintln!("  - {}", problem);
                    }
                    return Err(Error::PlanValidation("Invalid plan".into()));
                }
                Err(e) => return Err(e),
            };
            if new_id {
                plan.id = uuid::Uuid::new_v4();
            }
            if plan.user_id.is_empty() {
                plan.user_id = config.user.id.clone();
            }

            if store.plan(plan.id)?.is_some() {
                store.update_plan(&plan)?;
            } else {
                store.save_plan(&plan)?;
            }
            store.activate_plan(&config.user.id, plan.id)?;

            println!("✓ Plan imported and activated");
            print_plan(&plan);
            Ok(())
        }
        PlanAction::Show => {
            if let Some(plan) = active_plan(paths, config)? {
                print_plan(&plan);
            }
            Ok(())
        }
        PlanAction::Delete => {
            if let Some(plan) = active_plan(paths, config)? {
                store.delete_plan(plan.id)?;
                println!("✓ Deleted plan {}", plan.id);
            }
            Ok(())
        }
    }
}

fn cmd_today(paths: &Paths, config: &Config, date: NaiveDate) -> Result<()> {
    let Some(plan) = active_plan(paths, config)? else {
        return Ok(());
    };

    match scheduled_workout_for_date(&plan, date) {
        Some(ScheduleSlot::Workout(letter)) => {
            let name = plan.workout(&letter).map(|w| w.name.as_str()).unwrap_or("");
            println!("{}: workout {} - {}", date, letter, name);
        }
        Some(ScheduleSlot::Rest) => println!("{}: rest day", date),
        None => println!(
            "{}: No workout scheduled (plan not started or completed)",
            date
        ),
    }
    Ok(())
}

fn cmd_next(paths: &Paths, config: &Config, from: NaiveDate) -> Result<()> {
    let Some(plan) = active_plan(paths, config)? else {
        return Ok(());
    };

    match next_scheduled_workout(&plan, from, config.schedule.lookahead_days) {
        Some(upcoming) => {
            let name = plan
                .workout(&upcoming.letter)
                .map(|w| w.name.as_str())
                .unwrap_or("");
            println!(
                "Next workout: {} on {} ({})",
                upcoming.letter,
                upcoming.date,
                name
            );
        }
        None => println!(
            "No upcoming workout in the next {} days",
            config.schedule.lookahead_days
        ),
    }
    Ok(())
}

fn cmd_week(
    paths: &Paths,
    config: &Config,
    index: Option<u32>,
    date: NaiveDate,
) -> Result<()> {
    let Some(plan) = active_plan(paths, config)? else {
        return Ok(());
    };

    let absolute = index
        .map(AbsoluteWeekIndex)
        .or_else(|| schedule::absolute_week_index(plan.start_date, date))
        .unwrap_or(AbsoluteWeekIndex(0));

    let days = schedule::week_view(&plan, absolute);
    let week = u64::from(absolute.0) + 1;
    if days.is_empty() {
        println!("Week {} is out of range", week);
        return Ok(());
    }

    match schedule::schedule_week_index(plan.plan_type, plan.num_weeks, absolute) {
        Some(row) => println!(
            "Week {} (plan week {} of {})",
            week,
            row.0 + 1,
            plan.num_weeks
        ),
        None => println!("Week {} (plan completed)", week),
    }

    for DayView { date, slot } in days {
        let label = match &slot {
            Some(ScheduleSlot::Workout(letter)) => {
                let name = plan.workout(letter).map(|w| w.name.as_str()).unwrap_or("");
                format!("{} - {}", letter, name)
            }
            Some(ScheduleSlot::Rest) => "rest".to_string(),
            None => "-".to_string(),
        };
        println!("  {} {}  {}", date.format("%a"), date, label);
    }
    Ok(())
}

fn cmd_start(
    paths: &Paths,
    config: &Config,
    date: NaiveDate,
    letter: Option<String>,
    auto_complete: bool,
) -> Result<()> {
    let Some(plan) = active_plan(paths, config)? else {
        return Ok(());
    };

    let resolved = match letter {
        Some(letter) => plan
            .workout(&letter)
            .map(|workout| (letter.clone(), workout))
            .ok_or_else(|| Error::Other(format!("Plan has no workout '{}'", letter)))?,
        None => match schedule::resolve_workout(&plan, date) {
            Some(resolved) => resolved,
            None => {
                println!("Nothing to do on {} - enjoy the rest.", date);
                return Ok(());
            }
        },
    };
    let (letter, workout) = resolved;

    let context = SessionContext {
        title: workout.name.clone(),
        plan_id: Some(plan.id),
        plan_workout_letter: Some(letter.clone()),
        scheduled_date: date,
    };
    let mut session = WorkoutSession::new(
        workout,
        context,
        SystemClock::new(),
        config.session_settings(),
    )?;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  WORKOUT {}: {}", letter, workout.name);
    println!("╰─────────────────────────────────────────╯");
    print_last_time(paths, plan.id, &letter)?;

    let completed = if auto_complete {
        run_auto(&mut session)?
    } else {
        run_interactive(&mut session, config)?
    };
    if !completed {
        session.abandon();
        println!("\nWorkout abandoned - nothing was saved.");
        return Ok(());
    }

    let mut catalog = BuiltinCatalog::default();
    catalog.extend_with_custom(&config.catalog.custom);
    let mut log = JsonlWorkoutLog::new(&paths.workouts);

    let record = session.persist(&mut log, &catalog)?;
    println!("\n✓ Workout logged!");
    for exercise in &record.exercises {
        println!(
            "  {} ({}): {:?}",
            exercise.exercise_name, exercise.exercise_type, exercise.reps
        );
    }
    Ok(())
}

fn target_value(session: &WorkoutSession<SystemClock>) -> Option<u32> {
    match session.current_kind()? {
        ExerciseKind::Dynamic { reps } => Some(reps),
        ExerciseKind::Static { duration } => Some(duration),
    }
}

fn run_auto(session: &mut WorkoutSession<SystemClock>) -> Result<bool> {
    while !session.is_finished() {
        match session.phase() {
            Phase::Performing => {
                print_current(session);
                let value = target_value(session)
                    .ok_or_else(|| Error::Session("no active set".into()))?;
                session.complete_set(value)?;
            }
            Phase::Resting { .. } => {
                session.skip_rest()?;
            }
            Phase::Countdown { .. } | Phase::Holding { .. } => {
                session.cancel_hold()?;
            }
            Phase::Finished => {}
        }
    }
    Ok(true)
}

/// Feed stdin lines through a channel so timers keep ticking while waiting
fn spawn_input() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn prompt(text: &str) -> Result<()> {
    print!("{}", text);
    io::stdout().flush()?;
    Ok(())
}

/// Returns false when the user quits (or input ends) before finishing
fn run_interactive(session: &mut WorkoutSession<SystemClock>, config: &Config) -> Result<bool> {
    let input = spawn_input();
    let tick = Duration::from_millis(config.session.tick_millis.max(1));

    while !session.is_finished() {
        match session.phase() {
            Phase::Performing => {
                print_current(session);
                let is_static = matches!(session.current_kind(), Some(ExerciseKind::Static { .. }));
                if is_static {
                    prompt("Enter to start the hold, a number to log seconds, 'q' to quit\n> ")?;
                } else {
                    prompt("Reps done (Enter = target, 'q' to quit)\n> ")?;
                }

                let Ok(line) = input.recv() else {
                    return Ok(false);
                };
                let line = line.trim();
                if line.eq_ignore_ascii_case("q") {
                    return Ok(false);
                }

                let outcome = match (line.is_empty(), is_static) {
                    (true, true) => session.start_hold().map(|_| None),
                    (true, false) => match target_value(session) {
                        Some(value) => session.complete_set(value).map(Some),
                        None => Ok(None),
                    },
                    (false, _) => session.complete_set_input(line).map(Some),
                };
                match outcome {
                    Ok(Some(step)) => print_step(step),
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }
            Phase::Resting { .. } | Phase::Countdown { .. } | Phase::Holding { .. } => {
                match input.recv_timeout(tick) {
                    Ok(line) => {
                        if line.trim().eq_ignore_ascii_case("q") {
                            return Ok(false);
                        }
                        interrupt_timer(session, &input)?;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        for event in session.tick() {
                            print_event(event);
                        }
                        print_timer(session)?;
                    }
                    Err(RecvTimeoutError::Disconnected) => return Ok(false),
                }
            }
            Phase::Finished => {}
        }
    }

    Ok(true)
}

/// Enter pressed while a timer runs: skip rest, or stop the hold early
fn interrupt_timer(session: &mut WorkoutSession<SystemClock>, input: &Receiver<String>) -> Result<()> {
    match session.phase() {
        Phase::Resting { .. } => {
            session.skip_rest()?;
            println!("\nRest skipped.");
        }
        Phase::Countdown { .. } => {
            session.cancel_hold()?;
            println!("\nHold cancelled.");
        }
        Phase::Holding { .. } => {
            let pending = session.stop_hold()?;
            println!("\nHold stopped after {}s.", pending.elapsed_seconds);
            loop {
                prompt(&format!(
                    "How many seconds did you hold? (Enter = {})\n> ",
                    pending.elapsed_seconds
                ))?;
                // Enter or closed input keeps the measured time
                let Ok(line) = input.recv() else { break };
                if line.trim().is_empty() {
                    break;
                }
                match session.submit_manual_duration(pending, &line) {
                    Ok(()) => break,
                    Err(e) => eprintln!("{}", e),
                }
            }
            print_step(pending.step);
        }
        Phase::Performing | Phase::Finished => {}
    }
    Ok(())
}

fn print_plan(plan: &Plan) {
    println!();
    let name = if plan.name.is_empty() {
        "Unnamed plan"
    } else {
        plan.name.as_str()
    };
    println!("  {} ({})", name, plan.id);
    println!(
        "  Starts {}, {} weeks, {}",
        plan.start_date, plan.num_weeks, plan.plan_type
    );
    for (letter, workout) in &plan.workouts {
        println!("  {}: {} ({} exercises)", letter, workout.name, workout.exercises.len());
    }
    println!();
}

fn print_current(session: &WorkoutSession<SystemClock>) {
    let (Some(cursor), Some(exercise)) = (session.cursor(), session.current_exercise()) else {
        return;
    };
    let target = match session.current_kind() {
        Some(ExerciseKind::Dynamic { reps }) => format!("{} reps", reps),
        Some(ExerciseKind::Static { duration }) => format!("{}s hold", duration),
        None => String::new(),
    };
    let (done, total) = session.progress();

    println!();
    println!(
        "  {} - set {}/{} - {}   [{}/{} sets]",
        exercise.exercise_name,
        cursor.set_index + 1,
        exercise.sets,
        target,
        done,
        total
    );
    if let Some(position) = session.superset_position().filter(|p| p.total > 1) {
        println!(
            "  superset {}/{}{}",
            position.index + 1,
            position.total,
            if position.is_last { "" } else { " - no rest before the next exercise" }
        );
    }
}

fn print_step(step: Step) {
    match step {
        Step::Rest { seconds, .. } => {
            println!("Rest {}s (Enter to skip)", seconds)
        }
        Step::Finished => println!("All sets done."),
        Step::NextInSuperset(_) | Step::Continue(_) => {}
    }
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::RestEndingSoon { remaining_secs } => {
            println!("\n\x07Get ready - {}s left", remaining_secs)
        }
        SessionEvent::RestFinished { .. } => println!("\nRest over."),
        SessionEvent::HoldStarted { duration, .. } => {
            println!("\nHold! {}s (Enter to stop early)", duration)
        }
        SessionEvent::HoldCompleted { seconds, step, .. } => {
            println!("\n✓ Held {}s", seconds);
            print_step(step);
        }
    }
}

fn print_timer(session: &WorkoutSession<SystemClock>) -> Result<()> {
    let line = if let Some(left) = session.rest_remaining() {
        format!("  resting... {:>3}s", left)
    } else if let Some(left) = session.lead_in_remaining() {
        format!("  get into position... {}", left)
    } else if let Some(left) = session.hold_remaining() {
        format!("  holding... {:>3}s", left)
    } else {
        return Ok(());
    };
    print!("\r{}", line);
    io::stdout().flush()?;
    Ok(())
}

/// Show what was logged the last time this workout was done
fn print_last_time(paths: &Paths, plan_id: uuid::Uuid, letter: &str) -> Result<()> {
    let records = setlog_core::workout_log::read_workouts(&paths.workouts)?;
    let Some(last) = setlog_core::history::last_workout_for_letter(&records, plan_id, letter)
    else {
        return Ok(());
    };

    println!("  Last time ({}):", last.scheduled_date);
    for exercise in &last.exercises {
        let values: Vec<String> = exercise.reps.iter().map(u32::to_string).collect();
        println!("    {}: {}", exercise.exercise_name, values.join("/"));
    }
    Ok(())
}

fn cmd_history(paths: &Paths, days: i64) -> Result<()> {
    let records = setlog_core::history::load_recent_workouts(&paths.workouts, days)?;
    if records.is_empty() {
        println!("No workouts in the last {} days.", days);
        return Ok(());
    }

    for record in &records {
        let letter = record
            .plan_workout_letter
            .as_deref()
            .map(|l| format!(" [{}]", l))
            .unwrap_or_default();
        println!(
            "{} {}{} - {} exercises, {} sets",
            record.scheduled_date,
            record.title,
            letter,
            record.exercises.len(),
            record.total_sets()
        );
    }
    Ok(())
}
