//! Habit tracker facade.
//!
//! Ties a store, a reminder scheduler and the pure selectors (`is_due`,
//! `compute_stats`) together behind the operations a UI needs.

use crate::recurrence::is_due;
use crate::reminder::{NoopScheduler, ReminderScheduler};
use crate::stats::{compute_stats_with_window, is_completed, DEFAULT_WINDOW_DAYS};
use crate::store::{EntryStore, HabitStore};
use crate::{Entry, Error, Habit, HabitId, HabitKind, HabitStats, HabitUpdate, NewHabit, Result};
use chrono::{NaiveDate, Utc};

/// A habit due on some day, with that day's entry if one exists
#[derive(Clone, Debug)]
pub struct DueHabit {
    pub habit: Habit,
    pub entry: Option<Entry>,
    pub completed: bool,
}

/// Store plus scheduler with the tracker operations on top
pub struct HabitTracker<S, R = NoopScheduler> {
    store: S,
    scheduler: R,
    window_days: u32,
}

impl<S> HabitTracker<S, NoopScheduler>
where
    S: HabitStore + EntryStore,
{
    /// Tracker without reminders
    pub fn headless(store: S) -> Self {
        Self::new(store, NoopScheduler)
    }
}

impl<S, R> HabitTracker<S, R>
where
    S: HabitStore + EntryStore,
    R: ReminderScheduler,
{
    pub fn new(store: S, scheduler: R) -> Self {
        Self {
            store,
            scheduler,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Use a different completion-rate window
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &R {
        &self.scheduler
    }

    // ------------------------------------------------------------------
    // Habits
    // ------------------------------------------------------------------

    pub fn create_habit(&mut self, new: NewHabit) -> Result<Habit> {
        let habit = Habit::new(new, Utc::now())?;
        self.store.put_habit(habit.clone())?;
        self.scheduler.schedule(&habit);
        tracing::info!("Created habit '{}' ({})", habit.name, habit.id);
        Ok(habit)
    }

    pub fn update_habit(&mut self, id: &HabitId, update: HabitUpdate) -> Result<Habit> {
        let mut habit = self.habit(id)?;
        habit.apply(update)?;
        self.store.put_habit(habit.clone())?;
        self.scheduler.schedule(&habit);
        tracing::info!("Updated habit '{}' ({})", habit.name, habit.id);
        Ok(habit)
    }

    /// Hide a habit from due lists while keeping its history
    pub fn archive_habit(&mut self, id: &HabitId) -> Result<Habit> {
        self.set_active(id, false)
    }

    pub fn restore_habit(&mut self, id: &HabitId) -> Result<Habit> {
        self.set_active(id, true)
    }

    fn set_active(&mut self, id: &HabitId, active: bool) -> Result<Habit> {
        let mut habit = self.habit(id)?;
        habit.active = active;
        self.store.put_habit(habit.clone())?;
        self.scheduler.schedule(&habit);
        tracing::info!(
            "{} habit '{}'",
            if active { "Restored" } else { "Archived" },
            habit.name
        );
        Ok(habit)
    }

    /// Delete a habit and all of its entries
    ///
    /// The store removes habit and entries as one unit; the reminder is
    /// cancelled afterwards. Returns false if the habit was already gone.
    pub fn delete_habit(&mut self, id: &HabitId) -> Result<bool> {
        let existed = self.store.delete_habit(id)?;
        self.scheduler.cancel(id);
        if existed {
            tracing::info!("Deleted habit {}", id);
        }
        Ok(existed)
    }

    /// Look up a habit that must exist
    pub fn habit(&self, id: &HabitId) -> Result<Habit> {
        self.store
            .get_habit(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Resolve a user-supplied reference: exact id, then name
    /// (case-insensitive), then unique id prefix
    pub fn find_habit(&self, query: &str) -> Result<Option<Habit>> {
        let query = query.trim();
        if let Some(habit) = self.store.get_habit(&HabitId::from(query))? {
            return Ok(Some(habit));
        }

        let habits = self.store.get_all_habits()?;

        let by_name: Vec<&Habit> = habits
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(query))
            .collect();
        match by_name.as_slice() {
            [one] => return Ok(Some((*one).clone())),
            [] => {}
            _ => {
                return Err(Error::Other(format!(
                    "'{}' matches {} habits, use the id instead",
                    query,
                    by_name.len()
                )))
            }
        }

        if query.len() < 4 {
            return Ok(None);
        }
        let by_prefix: Vec<&Habit> = habits
            .iter()
            .filter(|h| h.id.as_str().starts_with(query))
            .collect();
        match by_prefix.as_slice() {
            [one] => Ok(Some((*one).clone())),
            [] => Ok(None),
            _ => Err(Error::Other(format!(
                "id prefix '{}' is ambiguous ({} habits)",
                query,
                by_prefix.len()
            ))),
        }
    }

    pub fn habits(&self, include_archived: bool) -> Result<Vec<Habit>> {
        Ok(self
            .store
            .get_all_habits()?
            .into_iter()
            .filter(|h| include_archived || h.active)
            .collect())
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    /// Mark a day done or not done
    ///
    /// For measurable habits this stores an explicit override next to any
    /// logged value; the override is authoritative for that day.
    pub fn set_completed(&mut self, id: &HabitId, day: NaiveDate, completed: bool) -> Result<Entry> {
        let habit = self.habit(id)?;
        let now = Utc::now();

        let entry = match self.store.get_entry(&habit.id, day)? {
            Some(mut existing) if habit.kind.is_measurable() => {
                existing.completed = Some(completed);
                existing.completed_at = if completed { Some(now) } else { None };
                existing
            }
            _ => Entry::check(habit.id.clone(), day, completed, Some(now)),
        };

        self.store.put_entry(entry.clone())?;
        tracing::debug!(
            "Marked '{}' {} on {}",
            habit.name,
            if completed { "done" } else { "not done" },
            day
        );
        Ok(entry)
    }

    /// Log a measured value for a day, replacing any earlier value
    ///
    /// No completion flag is stored: completion is derived from the habit's
    /// target whenever statistics are computed, so editing the target later
    /// re-evaluates old days.
    pub fn record_value(&mut self, id: &HabitId, day: NaiveDate, value: f64) -> Result<Entry> {
        let habit = self.habit(id)?;
        let target = match &habit.kind {
            HabitKind::Measurable { target, .. } => *target,
            HabitKind::Boolean => {
                return Err(Error::validation(
                    "entry",
                    format!("'{}' is a yes/no habit and takes no value", habit.name),
                ))
            }
        };

        let mut entry = Entry::measured(habit.id.clone(), day, value)?;
        if value >= target {
            entry.completed_at = Some(Utc::now());
        }

        self.store.put_entry(entry.clone())?;
        tracing::debug!("Recorded {} for '{}' on {}", value, habit.name, day);
        Ok(entry)
    }

    pub fn entry(&self, id: &HabitId, day: NaiveDate) -> Result<Option<Entry>> {
        self.store.get_entry(id, day)
    }

    pub fn entries(&self, id: &HabitId) -> Result<Vec<Entry>> {
        self.store.get_all_entries(id)
    }

    // ------------------------------------------------------------------
    // Selectors
    // ------------------------------------------------------------------

    /// Active habits due on `day`, with their entry for that day
    pub fn due_on(&self, day: NaiveDate) -> Result<Vec<DueHabit>> {
        let mut due = Vec::new();
        for habit in self.store.get_all_habits()? {
            if !is_due(&habit, day) {
                continue;
            }
            let entry = self.store.get_entry(&habit.id, day)?;
            let completed = entry.as_ref().map_or(false, |e| is_completed(&habit, e));
            due.push(DueHabit {
                habit,
                entry,
                completed,
            });
        }
        Ok(due)
    }

    pub fn stats(&self, id: &HabitId, today: NaiveDate) -> Result<HabitStats> {
        let habit = self.habit(id)?;
        let entries = self.store.get_all_entries(&habit.id)?;
        Ok(compute_stats_with_window(
            &habit,
            &entries,
            today,
            self.window_days,
        ))
    }
}
