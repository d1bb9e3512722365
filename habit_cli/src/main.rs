use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use habit_core::date::{format_day, parse_day};
use habit_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hab")]
#[command(about = "Habit tracker with streaks and completion statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show habits due today and whether they are done (default)
    Today {
        /// Show another day instead of today (YYYY-MM-DD)
        #[arg(long, value_parser = day_arg)]
        date: Option<NaiveDate>,
    },

    /// Create a new habit
    Add {
        name: String,

        #[command(flatten)]
        details: HabitArgs,
    },

    /// Edit an existing habit
    Edit {
        /// Habit id, id prefix or name
        habit: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Turn the habit into a yes/no habit
        #[arg(long, conflicts_with_all = ["target", "unit"])]
        boolean: bool,

        /// Due every day
        #[arg(long, conflicts_with_all = ["weekly", "days"])]
        daily: bool,

        /// Remove the reminder
        #[arg(long, conflicts_with = "remind")]
        no_remind: bool,

        #[command(flatten)]
        details: HabitArgs,
    },

    /// List habits with their streaks
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,

        /// Day to compute streaks for (YYYY-MM-DD)
        #[arg(long, value_parser = day_arg)]
        today: Option<NaiveDate>,
    },

    /// Mark a habit done
    Done {
        habit: String,

        #[arg(long, value_parser = day_arg)]
        date: Option<NaiveDate>,
    },

    /// Mark a habit not done
    Undo {
        habit: String,

        #[arg(long, value_parser = day_arg)]
        date: Option<NaiveDate>,
    },

    /// Record a value for a measurable habit
    Log {
        habit: String,

        #[arg(allow_negative_numbers = true)]
        value: f64,

        #[arg(long, value_parser = day_arg)]
        date: Option<NaiveDate>,
    },

    /// Show statistics for a habit
    Stats {
        habit: String,

        /// Day treated as today (YYYY-MM-DD)
        #[arg(long, value_parser = day_arg)]
        today: Option<NaiveDate>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Archive a habit (keeps its history)
    Archive { habit: String },

    /// Bring an archived habit back
    Restore { habit: String },

    /// Delete a habit and all of its history
    Delete { habit: String },

    /// Export all history to CSV
    Export { path: PathBuf },
}

/// Shared habit options for `add` and `edit`
#[derive(Args)]
struct HabitArgs {
    /// Free text description
    #[arg(long)]
    description: Option<String>,

    /// Daily target, makes the habit measurable
    #[arg(long)]
    target: Option<f64>,

    /// Unit for the target (e.g. minutes)
    #[arg(long, requires = "target")]
    unit: Option<String>,

    /// Due once a week, on the weekday the habit was created
    #[arg(long, conflicts_with = "days")]
    weekly: bool,

    /// Due on these weekdays, e.g. mon,wed,fri or 1,3,5
    #[arg(long)]
    days: Option<String>,

    /// Colour as #RRGGBB
    #[arg(long)]
    color: Option<String>,

    /// Icon name (check, book, run, water, meditate, sleep, food, music, code, heart, star)
    #[arg(long)]
    icon: Option<String>,

    /// Daily reminder time (HH:MM)
    #[arg(long, value_parser = time_arg)]
    remind: Option<NaiveTime>,
}

impl HabitArgs {
    fn recurrence(&self) -> Result<Option<Recurrence>> {
        if self.weekly {
            return Ok(Some(Recurrence::Weekly));
        }
        match &self.days {
            Some(days) => Ok(Some(Recurrence::Custom {
                days: days.parse()?,
            })),
            None => Ok(None),
        }
    }

    fn kind(&self) -> Result<Option<HabitKind>> {
        match self.target {
            Some(target) => Ok(Some(HabitKind::measurable(
                target,
                self.unit.clone().unwrap_or_default(),
            )?)),
            None => Ok(None),
        }
    }

    fn color(&self) -> Result<Option<HabitColor>> {
        self.color.as_deref().map(HabitColor::parse).transpose()
    }

    fn icon(&self) -> Result<Option<HabitIcon>> {
        self.icon.as_deref().map(|s| s.parse::<HabitIcon>()).transpose()
    }
}

type Tracker = HabitTracker<FileStore, Box<dyn ReminderScheduler>>;

fn main() -> ExitCode {
    // Initialize logging
    habit_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let mut tracker = open_tracker(&data_dir, &config)?;
    let today = Local::now().date_naive();

    match cli.command {
        Some(Commands::Today { date }) => cmd_today(&tracker, date.unwrap_or(today)),
        None => cmd_today(&tracker, today),
        Some(Commands::Add { name, details }) => cmd_add(&mut tracker, name, details),
        Some(Commands::Edit {
            habit,
            name,
            boolean,
            daily,
            no_remind,
            details,
        }) => cmd_edit(&mut tracker, &habit, name, boolean, daily, no_remind, details),
        Some(Commands::List { all, today: day }) => {
            cmd_list(&tracker, all, day.unwrap_or(today))
        }
        Some(Commands::Done { habit, date }) => {
            cmd_mark(&mut tracker, &habit, date.unwrap_or(today), true)
        }
        Some(Commands::Undo { habit, date }) => {
            cmd_mark(&mut tracker, &habit, date.unwrap_or(today), false)
        }
        Some(Commands::Log { habit, value, date }) => {
            cmd_log(&mut tracker, &habit, value, date.unwrap_or(today))
        }
        Some(Commands::Stats {
            habit,
            today: day,
            json,
        }) => cmd_stats(&tracker, &habit, day.unwrap_or(today), json),
        Some(Commands::Archive { habit }) => {
            let habit = resolve(&tracker, &habit)?;
            tracker.archive_habit(&habit.id)?;
            println!("✓ Archived '{}'", habit.name);
            Ok(())
        }
        Some(Commands::Restore { habit }) => {
            let habit = resolve(&tracker, &habit)?;
            tracker.restore_habit(&habit.id)?;
            println!("✓ Restored '{}'", habit.name);
            Ok(())
        }
        Some(Commands::Delete { habit }) => {
            let habit = resolve(&tracker, &habit)?;
            tracker.delete_habit(&habit.id)?;
            println!("✓ Deleted '{}' and its history", habit.name);
            Ok(())
        }
        Some(Commands::Export { path }) => cmd_export(&tracker, &path),
    }
}

fn open_tracker(data_dir: &std::path::Path, config: &Config) -> Result<Tracker> {
    let store = FileStore::open(Config::data_file(data_dir))?;
    let scheduler: Box<dyn ReminderScheduler> = if config.reminders.enabled {
        Box::new(LogScheduler)
    } else {
        Box::new(NoopScheduler)
    };
    Ok(HabitTracker::new(store, scheduler).with_window_days(config.stats.completion_window_days))
}

fn resolve(tracker: &Tracker, query: &str) -> Result<Habit> {
    tracker
        .find_habit(query)?
        .ok_or_else(|| Error::NotFound(query.to_string()))
}

fn cmd_today(tracker: &Tracker, day: NaiveDate) -> Result<()> {
    let due = tracker.due_on(day)?;

    println!("Habits due {}", format_day(day));
    if due.is_empty() {
        println!("  Nothing due.");
        return Ok(());
    }

    for item in &due {
        let mark = if item.completed { "x" } else { " " };
        let progress = match (&item.habit.kind, item.entry.as_ref().and_then(|e| e.value)) {
            (HabitKind::Measurable { target, unit }, value) => format!(
                "  {}/{} {}",
                format_value(value.unwrap_or(0.0)),
                format_value(*target),
                unit
            ),
            (HabitKind::Boolean, _) => String::new(),
        };
        println!("  [{}] {}{}", mark, item.habit.name, progress.trim_end());
    }

    let done = due.iter().filter(|d| d.completed).count();
    println!();
    println!("  {}/{} done", done, due.len());
    Ok(())
}

fn cmd_add(tracker: &mut Tracker, name: String, details: HabitArgs) -> Result<()> {
    let kind = details.kind()?.unwrap_or(HabitKind::Boolean);
    let recurrence = details.recurrence()?.unwrap_or(Recurrence::Daily);

    let mut new = NewHabit::new(name, kind, recurrence);
    new.description = details.description.clone();
    new.reminder_time = details.remind;
    if let Some(color) = details.color()? {
        new.color = color;
    }
    if let Some(icon) = details.icon()? {
        new.icon = icon;
    }

    let habit = tracker.create_habit(new)?;
    println!("✓ Added '{}' ({})", habit.name, habit.recurrence);
    println!("  id: {}", habit.id);
    Ok(())
}

fn cmd_edit(
    tracker: &mut Tracker,
    query: &str,
    name: Option<String>,
    boolean: bool,
    daily: bool,
    no_remind: bool,
    details: HabitArgs,
) -> Result<()> {
    let habit = resolve(tracker, query)?;

    let kind = if boolean {
        Some(HabitKind::Boolean)
    } else {
        match details.target {
            // keep the current unit unless a new one is given
            Some(target) => {
                let unit = details
                    .unit
                    .clone()
                    .or_else(|| habit.kind.unit().map(str::to_string))
                    .unwrap_or_default();
                Some(HabitKind::measurable(target, unit)?)
            }
            None => None,
        }
    };
    let recurrence = if daily {
        Some(Recurrence::Daily)
    } else {
        details.recurrence()?
    };
    let reminder_time = if no_remind {
        Some(None)
    } else {
        details.remind.map(Some)
    };

    let update = HabitUpdate {
        name,
        description: details.description.clone().map(Some),
        kind,
        recurrence,
        color: details.color()?,
        icon: details.icon()?,
        reminder_time,
    };

    let habit = tracker.update_habit(&habit.id, update)?;
    println!("✓ Updated '{}' ({})", habit.name, habit.recurrence);
    Ok(())
}

fn cmd_list(tracker: &Tracker, all: bool, today: NaiveDate) -> Result<()> {
    let habits = tracker.habits(all)?;
    if habits.is_empty() {
        println!("No habits yet. Add one with `hab add <name>`.");
        return Ok(());
    }

    for habit in habits {
        let stats = tracker.stats(&habit.id, today)?;
        let archived = if habit.active { "" } else { "  [archived]" };
        println!(
            "  {}  {:<24} {:<14} streak {} (best {}){}",
            short_id(&habit.id),
            habit.name,
            habit.recurrence.to_string(),
            stats.current_streak,
            stats.best_streak,
            archived
        );
    }
    Ok(())
}

fn cmd_mark(tracker: &mut Tracker, query: &str, day: NaiveDate, completed: bool) -> Result<()> {
    let habit = resolve(tracker, query)?;
    tracker.set_completed(&habit.id, day, completed)?;

    if completed {
        let stats = tracker.stats(&habit.id, day)?;
        println!("✓ '{}' done for {}", habit.name, format_day(day));
        println!("  Streak: {} days", stats.current_streak);
    } else {
        println!("✓ '{}' marked not done for {}", habit.name, format_day(day));
    }
    Ok(())
}

fn cmd_log(tracker: &mut Tracker, query: &str, value: f64, day: NaiveDate) -> Result<()> {
    let habit = resolve(tracker, query)?;
    let entry = tracker.record_value(&habit.id, day, value)?;

    let unit = habit.kind.unit().unwrap_or_default();
    let target = habit.kind.target().unwrap_or_default();
    let status = if is_completed(&habit, &entry) {
        "target reached"
    } else {
        "below target"
    };
    println!(
        "✓ Logged {} {} for '{}' on {} ({}, target {})",
        format_value(value),
        unit,
        habit.name,
        format_day(day),
        status,
        format_value(target)
    );
    Ok(())
}

fn cmd_stats(tracker: &Tracker, query: &str, today: NaiveDate, json: bool) -> Result<()> {
    let habit = resolve(tracker, query)?;
    let stats = tracker.stats(&habit.id, today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let unit = habit.kind.unit().unwrap_or_default();
    println!("{} ({})", habit.name, habit.recurrence);
    println!("  Current streak:  {} days", stats.current_streak);
    println!("  Best streak:     {} days", stats.best_streak);
    println!("  Completions:     {}", stats.total_completions);
    println!("  Completion rate: {}%", stats.completion_rate);
    println!(
        "  Last done:       {}",
        stats.last_completed.map(format_day).unwrap_or_else(|| "-".into())
    );
    if habit.kind.is_measurable() {
        println!("  Total:           {}", optional_value(stats.total_value, unit));
        println!("  Average:         {}", optional_value(stats.average_value, unit));
    }
    Ok(())
}

fn cmd_export(tracker: &Tracker, path: &std::path::Path) -> Result<()> {
    let habits = tracker.habits(true)?;
    let entries = tracker.store().all_entries();
    let count = export_entries_csv(&habits, &entries, path)?;

    println!("✓ Exported {} entries", count);
    println!("  CSV: {}", path.display());
    Ok(())
}

fn short_id(id: &HabitId) -> &str {
    let s = id.as_str();
    s.get(..8).unwrap_or(s)
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn optional_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {}", format_value(v), unit).trim_end().to_string(),
        None => "-".into(),
    }
}

fn day_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_day(s).map_err(|e| e.to_string())
}

fn time_arg(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("'{}' is not HH:MM: {}", s, e))
}
