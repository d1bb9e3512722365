//! Recurrence evaluation: is a habit due on a given calendar day?
//!
//! Rules:
//! - Archived habits are never due
//! - `Daily` is due every day
//! - `Weekly` is due on one weekday: the weekday of the habit's creation
//!   date (UTC calendar date of `created_at`)
//! - `Custom` is due on the listed weekdays
//!
//! Evaluation is pure. It never consults the current time, so it can be
//! used for historical days just as well as for today.

use crate::{Habit, Recurrence};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Weekday};

/// The weekday a `Weekly` habit falls on
pub fn weekly_anchor(habit: &Habit) -> Weekday {
    habit.created_at.date_naive().weekday()
}

/// Whether `habit` should be performed on `day`
pub fn is_due(habit: &Habit, day: NaiveDate) -> bool {
    if !habit.active {
        return false;
    }

    match &habit.recurrence {
        Recurrence::Daily => true,
        Recurrence::Weekly => day.weekday() == weekly_anchor(habit),
        Recurrence::Custom { days } => days.contains_weekday(day.weekday()),
    }
}

/// Same as [`is_due`] for an instant, using its calendar date in its own offset
pub fn is_due_at<Tz: TimeZone>(habit: &Habit, at: &DateTime<Tz>) -> bool {
    is_due(habit, at.date_naive())
}

/// All due days in the inclusive range `from..=to`
pub fn due_days(habit: &Habit, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| is_due(habit, *d))
        .collect()
}
