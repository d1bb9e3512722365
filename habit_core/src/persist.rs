//! File-backed habit and entry store with file locking.
//!
//! The whole data set lives in one JSON document. Every mutation is applied
//! to a copy of the in-memory store, written out atomically, and only then
//! becomes visible, so a habit delete and its entry cascade land together or
//! not at all.
//!
//! Records that fail to load are kept verbatim and written back on every
//! save, so a later edit never erases data this version could not read.

use crate::store::{EntryStore, HabitStore, MemoryStore};
use crate::{Entry, Error, Habit, HabitId, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const DOCUMENT_VERSION: u32 = 1;

#[derive(Serialize)]
struct Document {
    version: u32,
    habits: Vec<serde_json::Value>,
    entries: Vec<serde_json::Value>,
}

/// Loose on-disk form so one bad record does not cost the whole file
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    habits: Vec<serde_json::Value>,
    #[serde(default)]
    entries: Vec<serde_json::Value>,
}

/// Raw records that could not be loaded
#[derive(Clone, Debug, Default)]
struct Rejected {
    habits: Vec<serde_json::Value>,
    entries: Vec<serde_json::Value>,
}

impl Rejected {
    fn is_empty(&self) -> bool {
        self.habits.is_empty() && self.entries.is_empty()
    }

    /// Drop unreadable entries that belong to `habit_id`
    fn forget_entries_of(&mut self, habit_id: &HabitId) {
        self.entries.retain(|value| {
            value.get("habit_id").and_then(serde_json::Value::as_str) != Some(habit_id.as_str())
        });
    }
}

/// JSON document store at a fixed path
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    rejected: Rejected,
}

impl FileStore {
    /// Open the store at `path`
    ///
    /// A missing file yields an empty store. A file that is not a valid
    /// document is reported as `Error::Corrupt` instead of being replaced.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (inner, rejected) = load(&path)?;
        Ok(Self {
            path,
            inner,
            rejected,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry across all habits
    pub fn all_entries(&self) -> Vec<Entry> {
        self.inner.all_entries()
    }

    /// Number of habit and entry records kept on disk but not loaded
    pub fn unreadable_records(&self) -> (usize, usize) {
        (self.rejected.habits.len(), self.rejected.entries.len())
    }

    fn mutate<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut MemoryStore, &mut Rejected) -> Result<T>,
    {
        let mut next = self.inner.clone();
        let mut rejected = self.rejected.clone();
        let out = f(&mut next, &mut rejected)?;
        save(&self.path, &next, &rejected)?;
        self.inner = next;
        self.rejected = rejected;
        Ok(out)
    }
}

impl HabitStore for FileStore {
    fn get_all_habits(&self) -> Result<Vec<Habit>> {
        self.inner.get_all_habits()
    }

    fn get_habit(&self, id: &HabitId) -> Result<Option<Habit>> {
        self.inner.get_habit(id)
    }

    fn put_habit(&mut self, habit: Habit) -> Result<()> {
        self.mutate(|store, _| store.put_habit(habit))
    }

    fn delete_habit(&mut self, id: &HabitId) -> Result<bool> {
        self.mutate(|store, rejected| {
            let existed = store.delete_habit(id)?;
            rejected.forget_entries_of(id);
            Ok(existed)
        })
    }
}

impl EntryStore for FileStore {
    fn get_all_entries(&self, habit_id: &HabitId) -> Result<Vec<Entry>> {
        self.inner.get_all_entries(habit_id)
    }

    fn get_entry(&self, habit_id: &HabitId, day: NaiveDate) -> Result<Option<Entry>> {
        self.inner.get_entry(habit_id, day)
    }

    fn put_entry(&mut self, entry: Entry) -> Result<()> {
        self.mutate(|store, _| store.put_entry(entry))
    }

    fn delete_all_entries(&mut self, habit_id: &HabitId) -> Result<()> {
        self.mutate(|store, rejected| {
            store.delete_all_entries(habit_id)?;
            rejected.forget_entries_of(habit_id);
            Ok(())
        })
    }
}

/// Load a store from disk with a shared lock
fn load(path: &Path) -> Result<(MemoryStore, Rejected)> {
    if !path.exists() {
        tracing::info!("No data file at {:?}, starting empty", path);
        return Ok((MemoryStore::new(), Rejected::default()));
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    if contents.trim().is_empty() {
        tracing::warn!("Data file {:?} is empty, starting empty", path);
        return Ok((MemoryStore::new(), Rejected::default()));
    }

    let raw: RawDocument = serde_json::from_str(&contents).map_err(|e| Error::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if raw.version > DOCUMENT_VERSION {
        return Err(Error::Corrupt {
            path: path.display().to_string(),
            reason: format!(
                "document version {} is newer than supported version {}",
                raw.version, DOCUMENT_VERSION
            ),
        });
    }

    let mut store = MemoryStore::new();
    let mut rejected = Rejected::default();

    for (index, value) in raw.habits.into_iter().enumerate() {
        let loaded = serde_json::from_value::<Habit>(value.clone())
            .map_err(Error::from)
            .and_then(|habit| store.put_habit(habit));
        if let Err(e) = loaded {
            tracing::warn!("Skipping habit #{} in {:?}: {}", index + 1, path, e);
            rejected.habits.push(value);
        }
    }

    for (index, value) in raw.entries.into_iter().enumerate() {
        let loaded = serde_json::from_value::<Entry>(value.clone())
            .map_err(Error::from)
            .and_then(|entry| store.put_entry(entry));
        if let Err(e) = loaded {
            tracing::warn!("Skipping entry #{} in {:?}: {}", index + 1, path, e);
            rejected.entries.push(value);
        }
    }

    if !rejected.is_empty() {
        tracing::warn!(
            "{} habits and {} entries in {:?} could not be read and will be preserved as-is",
            rejected.habits.len(),
            rejected.entries.len(),
            path
        );
    }

    tracing::debug!(
        "Loaded {} habits and {} entries from {:?}",
        store.habit_count(),
        store.all_entries().len(),
        path
    );
    Ok((store, rejected))
}

/// Save a store with exclusive locking
///
/// Atomically writes the document by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
fn save(path: &Path, store: &MemoryStore, rejected: &Rejected) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut habits = store
        .get_all_habits()?
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    habits.extend(rejected.habits.iter().cloned());

    let mut entries = store
        .all_entries()
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    entries.extend(rejected.entries.iter().cloned());

    let document = Document {
        version: DOCUMENT_VERSION,
        habits,
        entries,
    };

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!(
        "Saved {} habits and {} entries to {:?}",
        document.habits.len(),
        document.entries.len(),
        path
    );
    Ok(())
}
