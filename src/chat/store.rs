// src/chat/store.rs - Durable session collection
//
// The whole collection lives as one JSON array under a single slot. Writes
// that do not fit are retried after dropping sessions from the tail (the
// oldest, since new sessions go to the front) until one session is left.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::session::Session;
use crate::infra::errors::StoreError;

/// Slot the session collection is stored under.
pub const SESSIONS_SLOT: &str = "chats";

/// Key/value persistence with a size limit.
pub trait StorageBackend: Send {
    fn read(&self, slot: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, slot: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, slot: &str) -> Result<(), StoreError>;
}

impl<T: StorageBackend + Sync> StorageBackend for Arc<T> {
    fn read(&self, slot: &str) -> Result<Option<String>, StoreError> {
        (**self).read(slot)
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(slot, value)
    }

    fn remove(&self, slot: &str) -> Result<(), StoreError> {
        (**self).remove(slot)
    }
}

/// One file per slot under `dir`, written atomically (temp file + rename).
pub struct FileBackend {
    dir: PathBuf,
    max_bytes: Option<usize>,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: Option<usize>) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn check_quota(size: usize, limit: Option<usize>) -> Result<(), StoreError> {
    match limit {
        Some(limit) if size > limit => Err(StoreError::CapacityExceeded { size, limit }),
        _ => Ok(()),
    }
}

/// Disk-full surfaces as a capacity failure so eviction can kick in.
fn map_io(e: std::io::Error, size: usize) -> StoreError {
    if e.kind() == std::io::ErrorKind::StorageFull {
        StoreError::StorageFull { size }
    } else {
        StoreError::Io(e)
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, slot: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.slot_path(slot)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), StoreError> {
        let size = value.len();
        check_quota(size, self.max_bytes)?;

        std::fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!(".{slot}.json.tmp"));
        let dst = self.slot_path(slot);

        let result: std::io::Result<()> = (|| {
            let mut f = std::fs::File::create(&tmp)?;
            f.write_all(value.as_bytes())?;
            f.flush()?;
            f.sync_all()?;
            std::fs::rename(&tmp, &dst)
        })();

        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp);
            return Err(map_io(e, size));
        }
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.slot_path(slot)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

/// In-process backend with an optional quota.
#[derive(Default)]
pub struct MemoryBackend {
    slots: Mutex<HashMap<String, String>>,
    max_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(max_bytes: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            max_bytes: Some(max_bytes),
        }
    }

    /// Seed a slot directly, bypassing the quota.
    pub fn insert_raw(&self, slot: &str, value: &str) {
        self.lock().insert(slot.to_string(), value.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, slot: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(slot).cloned())
    }

    fn write(&self, slot: &str, value: &str) -> Result<(), StoreError> {
        check_quota(value.len(), self.max_bytes)?;
        self.lock().insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), StoreError> {
        self.lock().remove(slot);
        Ok(())
    }
}

/// Outcome of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: usize,
    pub evicted: usize,
}

pub struct SessionStore {
    backend: Box<dyn StorageBackend>,
}

impl SessionStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn open_dir(dir: impl Into<PathBuf>, max_bytes: Option<usize>) -> Self {
        Self::new(Box::new(FileBackend::new(dir, max_bytes)))
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Read the stored collection. Missing or unreadable data loads as empty.
    pub fn load(&self) -> Vec<Session> {
        let raw = match self.backend.read(SESSIONS_SLOT) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Error loading chats: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Session>>(&raw) {
            Ok(sessions) => {
                tracing::debug!("Loaded {} chat(s)", sessions.len());
                sessions
            }
            Err(e) => {
                tracing::warn!("Stored chats are unreadable, starting fresh: {}", e);
                Vec::new()
            }
        }
    }

    /// Write the full collection, evicting from the tail on capacity errors.
    ///
    /// Evicted sessions are removed from `sessions` as well, so the caller's
    /// working copy matches what was stored. Never evicts the last session;
    /// if even that does not fit the capacity error is returned.
    pub fn save(&self, sessions: &mut Vec<Session>) -> Result<SaveReport, StoreError> {
        let mut evicted = 0;
        loop {
            let payload = serde_json::to_string(&*sessions)?;
            match self.backend.write(SESSIONS_SLOT, &payload) {
                Ok(()) => {
                    if evicted > 0 {
                        tracing::info!("Removed {} older chat(s) to free up space", evicted);
                    }
                    tracing::trace!("Chats saved ({} bytes)", payload.len());
                    return Ok(SaveReport {
                        saved: sessions.len(),
                        evicted,
                    });
                }
                Err(e) if e.is_capacity() && sessions.len() > 1 => {
                    if let Some(dropped) = sessions.pop() {
                        tracing::debug!("Evicting chat {} ({})", dropped.id, dropped.title);
                    }
                    evicted += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(SESSIONS_SLOT)
    }
}
