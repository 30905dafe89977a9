//! Per-subject thread persistence.
//!
//! One conversation thread per review subject, reused across rounds so the
//! assistant keeps its context. The external scheduler serializes events per
//! subject, so a store never sees concurrent writers for the same key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maps review subjects to their persisted thread ids.
pub trait ThreadStore: Send + Sync {
    /// The thread id recorded for a subject, if any.
    fn get(&self, subject: &str) -> Option<String>;

    /// Record the thread id for a subject, replacing any previous one.
    fn put(&self, subject: &str, thread_id: &str);

    /// Forget a subject's thread.
    fn remove(&self, subject: &str);
}

/// Process-lifetime store, for tests and ephemeral deployments.
#[derive(Default)]
pub struct InMemoryThreadStore {
    inner: Mutex<HashMap<String, String>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThreadStore for InMemoryThreadStore {
    fn get(&self, subject: &str) -> Option<String> {
        self.inner.lock().unwrap().get(subject).cloned()
    }

    fn put(&self, subject: &str, thread_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .insert(subject.to_string(), thread_id.to_string());
    }

    fn remove(&self, subject: &str) {
        self.inner.lock().unwrap().remove(subject);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ThreadRecord {
    thread_id: String,
    updated_at: DateTime<Utc>,
}

/// Store backed by a single JSON file.
///
/// Reads happen against the in-memory map; every write rewrites the file.
/// A failed save is logged and the in-memory state kept. Losing a thread
/// id only costs one thread reuse, never a review.
pub struct JsonThreadStore {
    path: PathBuf,
    inner: Mutex<HashMap<String, ThreadRecord>>,
}

impl JsonThreadStore {
    /// Open the store, loading existing records if the file is present.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "thread state file is corrupt, starting empty");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            path,
            inner: Mutex::new(records),
        })
    }

    fn save(&self, records: &HashMap<String, ThreadRecord>) {
        if let Some(parent) = self.path.parent().filter(|p| *p != Path::new("")) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to create thread state directory");
                return;
            }
        }
        match serde_json::to_string_pretty(records) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(&self.path, raw) {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to persist thread state");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize thread state");
            }
        }
    }
}

impl ThreadStore for JsonThreadStore {
    fn get(&self, subject: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .get(subject)
            .map(|r| r.thread_id.clone())
    }

    fn put(&self, subject: &str, thread_id: &str) {
        let mut records = self.inner.lock().unwrap();
        records.insert(
            subject.to_string(),
            ThreadRecord {
                thread_id: thread_id.to_string(),
                updated_at: Utc::now(),
            },
        );
        self.save(&records);
    }

    fn remove(&self, subject: &str) {
        let mut records = self.inner.lock().unwrap();
        if records.remove(subject).is_some() {
            self.save(&records);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn in_memory_roundtrip() {
        let store = InMemoryThreadStore::new();
        assert!(store.get("P1").is_none());
        store.put("P1", "t1");
        assert_eq!(store.get("P1").unwrap(), "t1");
        store.remove("P1");
        assert!(store.get("P1").is_none());
    }

    #[test]
    fn json_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("threads.json");

        let store = JsonThreadStore::open(&path).unwrap();
        store.put("P1", "t1");
        store.put("P2", "t2");
        drop(store);

        let reopened = JsonThreadStore::open(&path).unwrap();
        assert_eq!(reopened.get("P1").unwrap(), "t1");
        assert_eq!(reopened.get("P2").unwrap(), "t2");
        reopened.remove("P1");

        let reopened = JsonThreadStore::open(&path).unwrap();
        assert!(reopened.get("P1").is_none());
        assert_eq!(reopened.get("P2").unwrap(), "t2");
    }

    #[test]
    fn corrupt_state_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("threads.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonThreadStore::open(&path).unwrap();
        assert!(store.get("P1").is_none());
    }

    #[test]
    fn missing_parent_directories_are_created_on_put() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/state/threads.json");

        let store = JsonThreadStore::open(&path).unwrap();
        store.put("P1", "t1");
        assert!(path.exists());
    }
}
