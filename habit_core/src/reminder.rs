//! Reminder scheduling hooks.
//!
//! The tracker notifies a scheduler whenever a habit is created, edited,
//! archived or deleted. Delivering notifications is the host's business;
//! a headless build uses `NoopScheduler` or `LogScheduler`.

use crate::{Habit, HabitId};

/// Receives reminder (re)scheduling requests
pub trait ReminderScheduler {
    /// (Re)schedule the recurring reminder for `habit`
    ///
    /// Called with habits that may have no reminder time or be archived;
    /// implementations should cancel in that case.
    fn schedule(&mut self, habit: &Habit);

    fn cancel(&mut self, habit_id: &HabitId);
}

impl<T: ReminderScheduler + ?Sized> ReminderScheduler for Box<T> {
    fn schedule(&mut self, habit: &Habit) {
        (**self).schedule(habit)
    }

    fn cancel(&mut self, habit_id: &HabitId) {
        (**self).cancel(habit_id)
    }
}

/// Scheduler that does nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopScheduler;

impl ReminderScheduler for NoopScheduler {
    fn schedule(&mut self, _habit: &Habit) {}

    fn cancel(&mut self, _habit_id: &HabitId) {}
}

/// Scheduler that records requests as tracing events
#[derive(Clone, Copy, Debug, Default)]
pub struct LogScheduler;

impl ReminderScheduler for LogScheduler {
    fn schedule(&mut self, habit: &Habit) {
        match (habit.active, habit.reminder_time) {
            (true, Some(time)) => tracing::info!(
                "Reminder for '{}' scheduled at {} ({})",
                habit.name,
                time.format("%H:%M"),
                habit.recurrence
            ),
            _ => self.cancel(&habit.id),
        }
    }

    fn cancel(&mut self, habit_id: &HabitId) {
        tracing::info!("Reminder for habit {} cancelled", habit_id);
    }
}
