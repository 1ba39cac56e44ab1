//! Durable key-value store backed by a single JSON file

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Key holding the current [`TimerState`](super::TimerState)
pub const TIMER_STATE_KEY: &str = "timerState";
/// Key holding the current [`SessionType`](super::SessionType)
pub const SESSION_TYPE_KEY: &str = "sessionType";
/// Key holding pending alarms as `{name: fireAt}`
pub const ALARMS_KEY: &str = "alarms";

/// Key-value store that survives process restarts.
///
/// Writes are applied in memory first and then flushed to disk, so a failed
/// flush never loses the value for the running process.
#[derive(Debug)]
pub struct Store {
    path: Option<PathBuf>,
    entries: Mutex<Map<String, Value>>,
    fresh_install: bool,
}

impl Store {
    /// Open the store at `path`, treating a missing or unreadable file as empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (entries, fresh_install) = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(entries) => (entries, false),
                Err(e) => {
                    warn!("State file {} is corrupt, starting empty: {}", path.display(), e);
                    (Map::new(), false)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Map::new(), true),
            Err(e) => {
                warn!("Failed to read state file {}: {}", path.display(), e);
                (Map::new(), false)
            }
        };

        debug!("Opened store at {} with {} entries", path.display(), entries.len());
        Self {
            path: Some(path),
            entries: Mutex::new(entries),
            fresh_install,
        }
    }

    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Map::new()),
            fresh_install: true,
        }
    }

    /// Whether no state file existed when the store was opened
    pub fn fresh_install(&self) -> bool {
        self.fresh_install
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read and decode the value stored under `key`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.lock();
        let value = entries.get(key)?.clone();
        drop(entries);

        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Ignoring undecodable value under '{}': {}", key, e);
                None
            }
        }
    }

    /// Store `value` under `key` and flush to disk
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), String> {
        let value = serde_json::to_value(value)
            .map_err(|e| format!("Failed to encode value for '{}': {}", key, e))?;

        let mut entries = self.lock();
        entries.insert(key.to_string(), value);
        self.flush(&entries)
    }

    /// Remove `key` and flush to disk
    pub fn remove(&self, key: &str) -> Result<(), String> {
        let mut entries = self.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn flush(&self, entries: &Map<String, Value>) -> Result<(), String> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create state directory: {}", e))?;
        }

        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| format!("Failed to encode state file: {}", e))?;

        // Write-then-rename keeps the previous file intact if we die mid-write
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(|e| format!("Failed to write state file: {}", e))?;
        fs::rename(&tmp, path).map_err(|e| format!("Failed to replace state file: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SessionType, TimerState};

    #[test]
    fn missing_file_is_a_fresh_install() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("state.json"));

        assert!(store.fresh_install());
        assert!(store.get::<TimerState>(TIMER_STATE_KEY).is_none());
    }

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = Store::open(&path);
        store.set(SESSION_TYPE_KEY, &SessionType::Break).unwrap();
        store.set(TIMER_STATE_KEY, &TimerState::inactive()).unwrap();
        drop(store);

        let reopened = Store::open(&path);
        assert!(!reopened.fresh_install());
        assert_eq!(reopened.get(SESSION_TYPE_KEY), Some(SessionType::Break));
        assert_eq!(reopened.get(TIMER_STATE_KEY), Some(TimerState::inactive()));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let store = Store::open(&path);
        assert!(!store.fresh_install());
        assert!(store.get::<SessionType>(SESSION_TYPE_KEY).is_none());

        store.set(SESSION_TYPE_KEY, &SessionType::Work).unwrap();
        assert_eq!(Store::open(&path).get(SESSION_TYPE_KEY), Some(SessionType::Work));
    }

    #[test]
    fn undecodable_values_read_as_absent() {
        let store = Store::in_memory();
        store.set(SESSION_TYPE_KEY, &"lunch").unwrap();
        assert!(store.get::<SessionType>(SESSION_TYPE_KEY).is_none());
    }

    #[test]
    fn remove_deletes_the_key() {
        let store = Store::in_memory();
        store.set(ALARMS_KEY, &serde_json::json!({})).unwrap();
        store.remove(ALARMS_KEY).unwrap();
        store.remove(ALARMS_KEY).unwrap();
        assert!(store.get::<Value>(ALARMS_KEY).is_none());
    }
}
