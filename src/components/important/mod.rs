//! Persistent set of event identifiers the user marked as important
//!
//! Flags live independently of the events themselves: a flag can be toggled
//! for an id the calendar no longer knows, and deleting an event only drops
//! its flag when the caller asks for it.

use crate::error::PulseResult;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Key the identifiers are stored under
pub const IMPORTANT_EVENTS_KEY: &str = "calendarpulse.important_event_ids";

/// Storage for importance flags
pub trait FlagStore: Send + Sync {
    fn all(&self) -> HashSet<String>;

    fn contains(&self, id: &str) -> bool {
        self.all().contains(id)
    }

    /// Flip the flag and return whether `id` is important afterwards
    fn toggle(&self, id: &str) -> PulseResult<bool>;

    fn remove(&self, id: &str) -> PulseResult<()>;
}

/// Preference entries keyed by name, each holding a string set
type Preferences = BTreeMap<String, BTreeSet<String>>;

/// A [`FlagStore`] backed by a small JSON preferences file
#[derive(Debug)]
pub struct ImportantEventStore {
    backing_file: Option<PathBuf>,
    data: Mutex<Preferences>,
}

impl ImportantEventStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: &Path) -> PulseResult<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            backing_file: Some(path.to_path_buf()),
            data: Mutex::new(data),
        })
    }

    /// A store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            backing_file: None,
            data: Mutex::new(Preferences::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Preferences> {
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn save(&self, data: &Preferences) -> PulseResult<()> {
        let Some(path) = &self.backing_file else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut BTreeSet<String>) -> T) -> PulseResult<T> {
        let mut data = self.lock();
        // Work on a copy so a failed save leaves the flags untouched
        let mut updated = data.clone();
        let result = f(updated.entry(IMPORTANT_EVENTS_KEY.to_string()).or_default());
        if let Err(err) = self.save(&updated) {
            warn!("Unable to persist importance flags: {}", err);
            return Err(err);
        }
        *data = updated;
        Ok(result)
    }
}

impl FlagStore for ImportantEventStore {
    fn all(&self) -> HashSet<String> {
        self.lock()
            .get(IMPORTANT_EVENTS_KEY)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn toggle(&self, id: &str) -> PulseResult<bool> {
        let important = self.modify(|ids| {
            if !ids.remove(id) {
                ids.insert(id.to_string());
            }
            ids.contains(id)
        })?;
        debug!("Event {} important: {}", id, important);
        Ok(important)
    }

    fn remove(&self, id: &str) -> PulseResult<()> {
        self.modify(|ids| {
            ids.remove(id);
        })
    }
}
