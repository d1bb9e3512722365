//! Streak and completion statistics for a single habit.
//!
//! Everything here is a pure function of the habit, its entries and the day
//! treated as "today". The recurrence rule is deliberately not consulted:
//! every calendar day counts for streaks, and the completion rate is over
//! logged days only.

use crate::date::{days_between, window_start};
use crate::{Entry, Habit, HabitKind, HabitStats};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Default trailing window for the completion rate, in days (today included)
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Collapsed view of one calendar day
#[derive(Clone, Copy, Debug)]
struct DayRecord {
    completed: bool,
    value: Option<f64>,
}

/// Whether an entry counts as done for `habit`
///
/// A stored `completed` flag wins. Without one, measurable habits compare the
/// logged value against the habit's current target; boolean entries without
/// a flag are not done.
pub fn is_completed(habit: &Habit, entry: &Entry) -> bool {
    if let Some(flag) = entry.completed {
        return flag;
    }
    match (&habit.kind, entry.value) {
        (HabitKind::Measurable { target, .. }, Some(value)) => value >= *target,
        _ => false,
    }
}

/// Compute statistics with the default 30-day completion window
pub fn compute_stats(habit: &Habit, entries: &[Entry], today: NaiveDate) -> HabitStats {
    compute_stats_with_window(habit, entries, today, DEFAULT_WINDOW_DAYS)
}

/// Compute statistics with a custom completion window
///
/// Entries belonging to other habits are dropped with a warning rather than
/// folded into the result.
pub fn compute_stats_with_window(
    habit: &Habit,
    entries: &[Entry],
    today: NaiveDate,
    window_days: u32,
) -> HabitStats {
    let days = collapse_days(habit, entries);
    if days.is_empty() {
        return HabitStats::default();
    }

    let total_completions = days.values().filter(|r| r.completed).count() as u32;
    let last_completed = days
        .iter()
        .rev()
        .find(|(_, r)| r.completed)
        .map(|(d, _)| *d);
    let (average_value, total_value) = value_summary(habit, &days);

    let stats = HabitStats {
        total_completions,
        completion_rate: completion_rate(&days, today, window_days),
        current_streak: current_streak(&days, today),
        best_streak: best_streak(&days),
        average_value,
        total_value,
        last_completed,
    };

    tracing::debug!(
        "Stats for {}: {} completions, streak {}/{}, rate {}%",
        habit.id,
        stats.total_completions,
        stats.current_streak,
        stats.best_streak,
        stats.completion_rate
    );

    stats
}

fn collapse_days(habit: &Habit, entries: &[Entry]) -> BTreeMap<NaiveDate, DayRecord> {
    let mut days: BTreeMap<NaiveDate, DayRecord> = BTreeMap::new();
    let mut foreign = 0usize;

    for entry in entries {
        if entry.habit_id != habit.id {
            foreign += 1;
            continue;
        }

        let record = DayRecord {
            completed: is_completed(habit, entry),
            value: entry.value,
        };

        match days.get_mut(&entry.day) {
            Some(existing) => {
                tracing::warn!(
                    "Duplicate entry for habit {} on {}, merging",
                    habit.id,
                    entry.day
                );
                existing.completed |= record.completed;
                existing.value = record.value.or(existing.value);
            }
            None => {
                days.insert(entry.day, record);
            }
        }
    }

    if foreign > 0 {
        tracing::warn!(
            "Ignored {} entries belonging to other habits while computing stats for {}",
            foreign,
            habit.id
        );
    }

    days
}

fn completion_rate(days: &BTreeMap<NaiveDate, DayRecord>, today: NaiveDate, window_days: u32) -> u32 {
    let start = window_start(today, window_days);
    let (logged, completed) = days
        .range(start..=today)
        .fold((0u32, 0u32), |(logged, completed), (_, r)| {
            (logged + 1, completed + u32::from(r.completed))
        });

    if logged == 0 {
        return 0;
    }
    (f64::from(completed) * 100.0 / f64::from(logged)).round() as u32
}

/// Consecutive completed days walking back from today, or from yesterday if
/// today is not done yet. A missing day ends the walk.
fn current_streak(days: &BTreeMap<NaiveDate, DayRecord>, today: NaiveDate) -> u32 {
    let done = |d: NaiveDate| days.get(&d).map_or(false, |r| r.completed);

    let mut cursor = if done(today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) => yesterday,
            None => return 0,
        }
    };

    let mut streak = 0;
    while done(cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

/// Longest run of completed entries on consecutive calendar days
fn best_streak(days: &BTreeMap<NaiveDate, DayRecord>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for (day, record) in days {
        if !record.completed {
            run = 0;
            prev = None;
            continue;
        }

        run = match prev {
            Some(p) if days_between(p, *day) == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(*day);
    }

    best
}

fn value_summary(habit: &Habit, days: &BTreeMap<NaiveDate, DayRecord>) -> (Option<f64>, Option<f64>) {
    if !habit.kind.is_measurable() {
        return (None, None);
    }

    let values: Vec<f64> = days.values().filter_map(|r| r.value).collect();
    if values.is_empty() {
        return (None, None);
    }

    let total: f64 = values.iter().sum();
    (Some(total / values.len() as f64), Some(total))
}
