//! Persisted guard state.
//!
//! The guard survives process restarts the same way the admin UI survives
//! page reloads: three string values in a small key-value store. The store
//! is a trait so tests can inject [`MemoryStore`]; production uses
//! [`FileStore`], a single JSON object rewritten on every mutation.
//!
//! Malformed or absent values always degrade to safe defaults (zero failed
//! attempts, no lockout, no session) -- there is no schema versioning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persisted key: consecutive failed login attempts (decimal string).
pub const FAILED_ATTEMPTS_KEY: &str = "admin_failed_attempts";

/// Persisted key: lockout expiry, epoch milliseconds (decimal string).
pub const LOCKOUT_KEY: &str = "admin_lockout";

/// Persisted key: session expiry, epoch milliseconds (decimal string).
pub const SESSION_END_KEY: &str = "admin_session_end";

/// Synchronous string key-value storage scoped to this deployment.
///
/// All reads and writes are local (no network round-trip), so callers may
/// treat a read-modify-write inside one critical section as atomic.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }
}

/// File-backed store: one JSON object, rewritten in full on each mutation.
///
/// Write failures are logged and otherwise ignored -- losing persisted guard
/// state degrades to the safe defaults, it never blocks a login or logout.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or create) the store at `path`, loading any existing values.
    ///
    /// A missing file or unparseable contents start the store empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Discarding malformed state file");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Serialize the current map to disk. Caller holds the lock.
    fn flush(&self, values: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::error!(path = %self.path.display(), error = %e, "Failed to create state directory");
                    return;
                }
            }
        }
        match serde_json::to_string(values) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(&self.path, raw) {
                    tracing::error!(path = %self.path.display(), error = %e, "Failed to write state file");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize guard state");
            }
        }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value.to_string());
        self.flush(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.lock().unwrap();
        if values.remove(key).is_some() {
            self.flush(&values);
        }
    }
}

/// Read a key and parse it as `i64`, treating malformed values as absent.
pub(crate) fn read_i64(store: &dyn StateStore, key: &str) -> Option<i64> {
    store.get(key)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(FAILED_ATTEMPTS_KEY), None);

        store.set(FAILED_ATTEMPTS_KEY, "2");
        assert_eq!(store.get(FAILED_ATTEMPTS_KEY).as_deref(), Some("2"));

        store.remove(FAILED_ATTEMPTS_KEY);
        assert_eq!(store.get(FAILED_ATTEMPTS_KEY), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("guard_state.json");

        let store = FileStore::open(&path);
        store.set(LOCKOUT_KEY, "1234567890");
        store.set(SESSION_END_KEY, "987654321");
        drop(store);

        // A fresh instance over the same file sees the persisted values.
        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get(LOCKOUT_KEY).as_deref(), Some("1234567890"));
        assert_eq!(reopened.get(SESSION_END_KEY).as_deref(), Some("987654321"));

        reopened.remove(LOCKOUT_KEY);
        let reopened_again = FileStore::open(&path);
        assert_eq!(reopened_again.get(LOCKOUT_KEY), None);
        assert_eq!(
            reopened_again.get(SESSION_END_KEY).as_deref(),
            Some("987654321")
        );
    }

    #[test]
    fn test_file_store_discards_malformed_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("guard_state.json");
        std::fs::write(&path, "not json at all").expect("write");

        let store = FileStore::open(&path);
        assert_eq!(store.get(FAILED_ATTEMPTS_KEY), None);
    }

    #[test]
    fn test_read_i64_degrades_on_garbage() {
        let store = MemoryStore::new();
        store.set(LOCKOUT_KEY, "not-a-number");
        assert_eq!(read_i64(&store, LOCKOUT_KEY), None);

        store.set(LOCKOUT_KEY, "42");
        assert_eq!(read_i64(&store, LOCKOUT_KEY), Some(42));
    }
}
