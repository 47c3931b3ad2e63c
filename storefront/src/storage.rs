//! Persistent client state.
//!
//! Three values survive a restart: the session token, the signed-in account
//! id and the selected city id. Storage is best effort; a failing store
//! behaves like an empty one.
//!
//! Reducers never touch the store directly. Reads and writes run inside
//! effects built with [`read_effect`] and [`write_effect`].

use crate::error::StorageError;
use cyclecare_core::effect::Effect;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Key holding the signed-in user's id.
pub const USER_ID_KEY: &str = "userId";

/// Key holding the confirmed city id.
pub const CITY_ID_KEY: &str = "cityId";

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    fn set(&self, key: &str, value: &str);

    /// Forget `key`.
    fn remove(&self, key: &str);
}

/// Read from `storage` in an effect and feed the result back as an action.
pub fn read_effect<A, F>(storage: &Arc<dyn KeyValueStore>, read: F) -> Effect<A>
where
    A: Send + 'static,
    F: FnOnce(&dyn KeyValueStore) -> A + Send + 'static,
{
    let storage = Arc::clone(storage);
    Effect::future(async move { Some(read(storage.as_ref())) })
}

/// Apply writes to `storage` in an effect that feeds nothing back.
pub fn write_effect<A, F>(storage: &Arc<dyn KeyValueStore>, write: F) -> Effect<A>
where
    A: Send + 'static,
    F: FnOnce(&dyn KeyValueStore) + Send + 'static,
{
    let storage = Arc::clone(storage);
    Effect::future(async move {
        write(storage.as_ref());
        None
    })
}

/// In-memory store, used in tests and as a fallback.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given entries.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        for (key, value) in entries {
            store.set(key, value);
        }
        store
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }
}

/// Store backed by a JSON object file.
///
/// Every operation re-reads the file so several processes see each other's
/// writes. A missing file is an empty store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Use the file at `path`, creating it on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    fn update(&self, key: &str, f: impl FnOnce(&mut BTreeMap<String, String>)) {
        let _guard = match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut entries = self.read().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable storage file");
            BTreeMap::new()
        });
        f(&mut entries);

        if let Err(e) = self.write(&entries) {
            tracing::warn!(path = %self.path.display(), key, error = %e, "Failed to persist storage");
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match self.read() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), key, error = %e, "Failed to read storage");
                None
            },
        }
    }

    fn set(&self, key: &str, value: &str) {
        self.update(key, |entries| {
            entries.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        self.update(key, |entries| {
            entries.remove(key);
        });
    }
}

/// Store for contexts without persistence: writes vanish, reads are absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl KeyValueStore for NullStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, key: &str, _value: &str) {
        tracing::trace!(key, "Dropping write to null store");
    }

    fn remove(&self, _key: &str) {}
}
