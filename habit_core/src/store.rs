//! Habit and entry stores.
//!
//! The traits are the read/write contract the tracker and the statistics
//! consumers depend on. `MemoryStore` is the in-process implementation; the
//! file-backed store in `persist` wraps it.

use crate::{Entry, Error, Habit, HabitId, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Storage for habit definitions
pub trait HabitStore {
    fn get_all_habits(&self) -> Result<Vec<Habit>>;

    fn get_habit(&self, id: &HabitId) -> Result<Option<Habit>>;

    /// Insert or replace a habit
    fn put_habit(&mut self, habit: Habit) -> Result<()>;

    /// Remove a habit together with all of its entries
    ///
    /// Returns false if the habit did not exist. Deleting twice is harmless.
    fn delete_habit(&mut self, id: &HabitId) -> Result<bool>;
}

/// Storage for daily entries, at most one per (habit, day)
pub trait EntryStore {
    /// All entries for a habit, oldest day first
    fn get_all_entries(&self, habit_id: &HabitId) -> Result<Vec<Entry>>;

    fn get_entry(&self, habit_id: &HabitId, day: NaiveDate) -> Result<Option<Entry>>;

    /// Insert or overwrite the entry for (habit_id, day)
    fn put_entry(&mut self, entry: Entry) -> Result<()>;

    fn delete_all_entries(&mut self, habit_id: &HabitId) -> Result<()>;
}

/// In-memory store holding habits and their entries
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    habits: BTreeMap<HabitId, Habit>,
    entries: BTreeMap<HabitId, BTreeMap<NaiveDate, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry across all habits
    pub fn all_entries(&self) -> Vec<Entry> {
        self.entries
            .values()
            .flat_map(|days| days.values().cloned())
            .collect()
    }

    pub fn habit_count(&self) -> usize {
        self.habits.len()
    }
}

impl HabitStore for MemoryStore {
    fn get_all_habits(&self) -> Result<Vec<Habit>> {
        let mut habits: Vec<Habit> = self.habits.values().cloned().collect();
        habits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(habits)
    }

    fn get_habit(&self, id: &HabitId) -> Result<Option<Habit>> {
        Ok(self.habits.get(id).cloned())
    }

    fn put_habit(&mut self, habit: Habit) -> Result<()> {
        habit.validate()?;
        if let Some(existing) = self.habits.get(&habit.id) {
            if existing.created_at != habit.created_at {
                return Err(Error::validation(
                    "habit",
                    "creation timestamp cannot be changed",
                ));
            }
        }
        tracing::debug!("Stored habit {} ({})", habit.id, habit.name);
        self.habits.insert(habit.id.clone(), habit);
        Ok(())
    }

    fn delete_habit(&mut self, id: &HabitId) -> Result<bool> {
        let removed_entries = self.entries.remove(id).map_or(0, |days| days.len());
        let existed = self.habits.remove(id).is_some();
        if existed {
            tracing::debug!("Deleted habit {} and {} entries", id, removed_entries);
        }
        Ok(existed)
    }
}

impl EntryStore for MemoryStore {
    fn get_all_entries(&self, habit_id: &HabitId) -> Result<Vec<Entry>> {
        Ok(self
            .entries
            .get(habit_id)
            .map(|days| days.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get_entry(&self, habit_id: &HabitId, day: NaiveDate) -> Result<Option<Entry>> {
        Ok(self
            .entries
            .get(habit_id)
            .and_then(|days| days.get(&day))
            .cloned())
    }

    fn put_entry(&mut self, entry: Entry) -> Result<()> {
        entry.validate()?;
        if !self.habits.contains_key(&entry.habit_id) {
            return Err(Error::NotFound(entry.habit_id.to_string()));
        }
        let replaced = self
            .entries
            .entry(entry.habit_id.clone())
            .or_default()
            .insert(entry.day, entry.clone())
            .is_some();
        tracing::debug!(
            "{} entry for habit {} on {}",
            if replaced { "Replaced" } else { "Added" },
            entry.habit_id,
            entry.day
        );
        Ok(())
    }

    fn delete_all_entries(&mut self, habit_id: &HabitId) -> Result<()> {
        self.entries.remove(habit_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HabitKind, NewHabit, Recurrence};
    use chrono::{Duration, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store_with_habit() -> (MemoryStore, Habit) {
        let mut store = MemoryStore::new();
        let habit = Habit::new(
            NewHabit::new("Walk", HabitKind::Boolean, Recurrence::Daily),
            Utc::now(),
        )
        .unwrap();
        store.put_habit(habit.clone()).unwrap();
        (store, habit)
    }

    #[test]
    fn test_put_entry_overwrites_same_day() {
        let (mut store, habit) = store_with_habit();
        let d = day(2024, 2, 1);

        store
            .put_entry(Entry::check(habit.id.clone(), d, true, None))
            .unwrap();
        store
            .put_entry(Entry::check(habit.id.clone(), d, false, None))
            .unwrap();

        let entries = store.get_all_entries(&habit.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].completed, Some(false));
    }

    #[test]
    fn test_get_entry_missing_is_none() {
        let (store, habit) = store_with_habit();
        assert!(store.get_entry(&habit.id, day(2024, 2, 1)).unwrap().is_none());
        assert!(store
            .get_habit(&HabitId::from("missing"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_entries_sorted_by_day() {
        let (mut store, habit) = store_with_habit();
        for offset in [3, 1, 2] {
            store
                .put_entry(Entry::check(
                    habit.id.clone(),
                    day(2024, 2, 1) + Duration::days(offset),
                    true,
                    None,
                ))
                .unwrap();
        }

        let days: Vec<_> = store
            .get_all_entries(&habit.id)
            .unwrap()
            .into_iter()
            .map(|e| e.day)
            .collect();
        assert_eq!(days, vec![day(2024, 2, 2), day(2024, 2, 3), day(2024, 2, 4)]);
    }

    #[test]
    fn test_cascade_delete() {
        let (mut store, habit) = store_with_habit();
        store
            .put_entry(Entry::check(habit.id.clone(), day(2024, 2, 1), true, None))
            .unwrap();

        assert!(store.delete_habit(&habit.id).unwrap());
        assert!(store.get_all_entries(&habit.id).unwrap().is_empty());
        assert!(store.get_habit(&habit.id).unwrap().is_none());

        // idempotent
        assert!(!store.delete_habit(&habit.id).unwrap());
    }

    #[test]
    fn test_put_entry_rejects_invalid_value() {
        let (mut store, habit) = store_with_habit();
        let mut entry = Entry::check(habit.id.clone(), day(2024, 2, 1), true, None);
        entry.value = Some(f64::NAN);

        assert!(matches!(
            store.put_entry(entry),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_put_entry_for_unknown_habit() {
        let mut store = MemoryStore::new();
        let entry = Entry::check(HabitId::from("ghost"), day(2024, 2, 1), true, None);
        assert!(matches!(store.put_entry(entry), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_put_habit_keeps_creation_time() {
        let (mut store, habit) = store_with_habit();
        let mut edited = habit.clone();
        edited.created_at = habit.created_at - Duration::days(3);
        assert!(store.put_habit(edited).is_err());

        let mut renamed = habit.clone();
        renamed.name = "Long walk".into();
        store.put_habit(renamed).unwrap();
        assert_eq!(
            store.get_habit(&habit.id).unwrap().unwrap().name,
            "Long walk"
        );
    }

    #[test]
    fn test_delete_all_entries_keeps_habit() {
        let (mut store, habit) = store_with_habit();
        store
            .put_entry(Entry::check(habit.id.clone(), day(2024, 2, 1), true, None))
            .unwrap();

        store.delete_all_entries(&habit.id).unwrap();
        assert!(store.get_all_entries(&habit.id).unwrap().is_empty());
        assert!(store.get_habit(&habit.id).unwrap().is_some());
    }
}
