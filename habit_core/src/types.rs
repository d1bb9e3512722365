//! Core domain types for the habit tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Habits, their kind (yes/no or measured) and recurrence rule
//! - Presentation fields (colour, icon) validated at the boundary
//! - Daily entries keyed by (habit, calendar day)
//! - Derived statistics

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Opaque, immutable habit identifier
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HabitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for HabitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Habit Kind
// ============================================================================

/// How a habit is satisfied on a given day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HabitKind {
    /// Done or not done
    Boolean,
    /// Accumulates a numeric value against a target (e.g. 20 minutes)
    Measurable { target: f64, unit: String },
}

impl HabitKind {
    /// Build a validated measurable kind
    pub fn measurable(target: f64, unit: impl Into<String>) -> Result<Self> {
        let kind = HabitKind::Measurable {
            target,
            unit: unit.into(),
        };
        kind.validate()?;
        Ok(kind)
    }

    pub fn is_measurable(&self) -> bool {
        matches!(self, HabitKind::Measurable { .. })
    }

    pub fn target(&self) -> Option<f64> {
        match self {
            HabitKind::Boolean => None,
            HabitKind::Measurable { target, .. } => Some(*target),
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            HabitKind::Boolean => None,
            HabitKind::Measurable { unit, .. } => Some(unit),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let HabitKind::Measurable { target, .. } = self {
            if !target.is_finite() || *target <= 0.0 {
                return Err(Error::validation(
                    "habit",
                    format!("measurable target must be a positive number, got {}", target),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Recurrence
// ============================================================================

const WEEKDAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// Non-empty set of weekday indices, 0 = Sunday .. 6 = Saturday
///
/// Serialized as a sorted array so the on-disk form does not depend on the
/// order days were added in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(BTreeSet<u8>);

impl WeekdaySet {
    pub fn new(days: impl IntoIterator<Item = u8>) -> Result<Self> {
        let set: BTreeSet<u8> = days.into_iter().collect();
        if set.is_empty() {
            return Err(Error::validation(
                "recurrence",
                "custom recurrence needs at least one weekday",
            ));
        }
        if let Some(bad) = set.iter().find(|d| **d > 6) {
            return Err(Error::validation(
                "recurrence",
                format!("weekday index {} is out of range 0..=6", bad),
            ));
        }
        Ok(Self(set))
    }

    pub fn contains(&self, index: u8) -> bool {
        self.0.contains(&index)
    }

    pub fn contains_weekday(&self, weekday: Weekday) -> bool {
        self.contains(weekday.num_days_from_sunday() as u8)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = Error;

    fn try_from(days: Vec<u8>) -> Result<Self> {
        WeekdaySet::new(days)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Accepts comma separated names (`mon,wed,fri`) or indices (`1,3,5`)
impl FromStr for WeekdaySet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut days = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let lower = part.to_lowercase();
            let index = match lower.parse::<u8>() {
                Ok(n) => n,
                Err(_) => WEEKDAY_NAMES
                    .iter()
                    .position(|name| lower.starts_with(name))
                    .map(|i| i as u8)
                    .ok_or_else(|| {
                        Error::validation("recurrence", format!("unknown weekday '{}'", part))
                    })?,
            };
            days.push(index);
        }
        WeekdaySet::new(days)
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|d| WEEKDAY_NAMES[d as usize]).collect();
        f.write_str(&names.join(","))
    }
}

/// Which calendar days a habit should be performed on
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    /// Once a week, on the weekday the habit was created
    Weekly,
    Custom { days: WeekdaySet },
}

impl Recurrence {
    pub fn custom(days: impl IntoIterator<Item = u8>) -> Result<Self> {
        Ok(Recurrence::Custom {
            days: WeekdaySet::new(days)?,
        })
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::Daily => f.write_str("daily"),
            Recurrence::Weekly => f.write_str("weekly"),
            Recurrence::Custom { days } => write!(f, "{}", days),
        }
    }
}

// ============================================================================
// Presentation
// ============================================================================

/// `#RRGGBB` colour, stored lowercase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HabitColor(String);

impl HabitColor {
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').ok_or_else(|| {
            Error::validation("colour", format!("'{}' must start with '#'", s))
        })?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::validation(
                "colour",
                format!("'{}' is not a #RRGGBB hex colour", s),
            ));
        }
        Ok(Self(format!("#{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HabitColor {
    fn default() -> Self {
        Self("#4caf50".into())
    }
}

impl TryFrom<String> for HabitColor {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        HabitColor::parse(&s)
    }
}

impl From<HabitColor> for String {
    fn from(color: HabitColor) -> Self {
        color.0
    }
}

/// Built-in habit icons
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HabitIcon {
    #[default]
    Check,
    Book,
    Run,
    Water,
    Meditate,
    Sleep,
    Food,
    Music,
    Code,
    Heart,
    Star,
}

impl HabitIcon {
    pub const ALL: [HabitIcon; 11] = [
        HabitIcon::Check,
        HabitIcon::Book,
        HabitIcon::Run,
        HabitIcon::Water,
        HabitIcon::Meditate,
        HabitIcon::Sleep,
        HabitIcon::Food,
        HabitIcon::Music,
        HabitIcon::Code,
        HabitIcon::Heart,
        HabitIcon::Star,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HabitIcon::Check => "check",
            HabitIcon::Book => "book",
            HabitIcon::Run => "run",
            HabitIcon::Water => "water",
            HabitIcon::Meditate => "meditate",
            HabitIcon::Sleep => "sleep",
            HabitIcon::Food => "food",
            HabitIcon::Music => "music",
            HabitIcon::Code => "code",
            HabitIcon::Heart => "heart",
            HabitIcon::Star => "star",
        }
    }
}

impl FromStr for HabitIcon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        HabitIcon::ALL
            .iter()
            .copied()
            .find(|icon| icon.name() == lower)
            .ok_or_else(|| Error::validation("icon", format!("unknown icon '{}'", s)))
    }
}

// ============================================================================
// Habit
// ============================================================================

/// A recurring tracked behaviour
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: HabitKind,
    pub recurrence: Recurrence,
    #[serde(default)]
    pub color: HabitColor,
    #[serde(default)]
    pub icon: HabitIcon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<NaiveTime>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the user when creating a habit
#[derive(Clone, Debug)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub kind: HabitKind,
    pub recurrence: Recurrence,
    pub color: HabitColor,
    pub icon: HabitIcon,
    pub reminder_time: Option<NaiveTime>,
}

impl NewHabit {
    pub fn new(name: impl Into<String>, kind: HabitKind, recurrence: Recurrence) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            recurrence,
            color: HabitColor::default(),
            icon: HabitIcon::default(),
            reminder_time: None,
        }
    }
}

/// Partial edit of a habit. Identifier and creation time are not editable.
#[derive(Clone, Debug, Default)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub kind: Option<HabitKind>,
    pub recurrence: Option<Recurrence>,
    pub color: Option<HabitColor>,
    pub icon: Option<HabitIcon>,
    pub reminder_time: Option<Option<NaiveTime>>,
}

impl Habit {
    /// Create a validated, active habit with a fresh identifier
    pub fn new(new: NewHabit, created_at: DateTime<Utc>) -> Result<Self> {
        let habit = Habit {
            id: HabitId::generate(),
            name: new.name.trim().to_string(),
            description: new.description,
            kind: new.kind,
            recurrence: new.recurrence,
            color: new.color,
            icon: new.icon,
            reminder_time: new.reminder_time,
            active: true,
            created_at,
        };
        habit.validate()?;
        Ok(habit)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(Error::validation("habit", "identifier must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::validation("habit", "name must not be empty"));
        }
        self.kind.validate()
    }

    /// Apply an edit; the habit is left untouched if the result is invalid
    pub fn apply(&mut self, update: HabitUpdate) -> Result<()> {
        let mut edited = self.clone();
        if let Some(name) = update.name {
            edited.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            edited.description = description;
        }
        if let Some(kind) = update.kind {
            edited.kind = kind;
        }
        if let Some(recurrence) = update.recurrence {
            edited.recurrence = recurrence;
        }
        if let Some(color) = update.color {
            edited.color = color;
        }
        if let Some(icon) = update.icon {
            edited.icon = icon;
        }
        if let Some(reminder_time) = update.reminder_time {
            edited.reminder_time = reminder_time;
        }
        edited.validate()?;
        *self = edited;
        Ok(())
    }
}

// ============================================================================
// Entry
// ============================================================================

/// One day's record for one habit, identified by (habit_id, day)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub habit_id: HabitId,
    pub day: NaiveDate,
    /// Authoritative when present; measured entries usually leave it unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Display only, never used for streaks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// A yes/no entry
    pub fn check(
        habit_id: HabitId,
        day: NaiveDate,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            habit_id,
            day,
            completed: Some(completed),
            value: None,
            completed_at: if completed { completed_at } else { None },
        }
    }

    /// A measured entry; completion is derived from the habit target when read
    pub fn measured(habit_id: HabitId, day: NaiveDate, value: f64) -> Result<Self> {
        let entry = Self {
            habit_id,
            day,
            completed: None,
            value: Some(value),
            completed_at: None,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(value) = self.value {
            if !value.is_finite() {
                return Err(Error::validation(
                    "entry",
                    format!("value must be a finite number, got {}", value),
                ));
            }
            if value < 0.0 {
                return Err(Error::validation(
                    "entry",
                    format!("value must not be negative, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Statistics derived from a habit's full entry history
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitStats {
    pub total_completions: u32,
    /// Percent of logged days in the trailing window that were completed
    pub completion_rate: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    /// Measurable habits only; absent when nothing was ever measured
    pub average_value: Option<f64>,
    pub total_value: Option<f64>,
    pub last_completed: Option<NaiveDate>,
}
