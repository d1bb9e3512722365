//! CSV export of habit history.
//!
//! One row per entry. The `completed` column is the effective completion
//! (stored flag or value against the current target), the same answer the
//! statistics use.

use crate::date::format_day;
use crate::stats::is_completed;
use crate::{Entry, Habit, HabitId, Result};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    habit_id: &'a str,
    habit_name: &'a str,
    day: String,
    completed: bool,
    value: Option<f64>,
    unit: Option<&'a str>,
}

/// Write `entries` to `path` as CSV, replacing any existing file
///
/// Entries whose habit is not in `habits` are skipped. Returns the number of
/// rows written.
pub fn export_entries_csv(habits: &[Habit], entries: &[Entry], path: &Path) -> Result<usize> {
    let by_id: HashMap<&HabitId, &Habit> = habits.iter().map(|h| (&h.id, h)).collect();

    let mut rows: Vec<(&Habit, &Entry)> = Vec::with_capacity(entries.len());
    for entry in entries {
        match by_id.get(&entry.habit_id) {
            Some(habit) => rows.push((habit, entry)),
            None => tracing::warn!(
                "Skipping entry on {} for unknown habit {}",
                entry.day,
                entry.habit_id
            ),
        }
    }
    rows.sort_by(|(ha, ea), (hb, eb)| {
        ha.name
            .cmp(&hb.name)
            .then_with(|| ha.id.cmp(&hb.id))
            .then_with(|| ea.day.cmp(&eb.day))
    });

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);

    for (habit, entry) in &rows {
        writer.serialize(CsvRow {
            habit_id: habit.id.as_str(),
            habit_name: &habit.name,
            day: format_day(entry.day),
            completed: is_completed(habit, entry),
            value: entry.value,
            unit: habit.kind.unit(),
        })?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} entries to {:?}", rows.len(), path);
    Ok(rows.len())
}
