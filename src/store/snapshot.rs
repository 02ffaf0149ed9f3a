//! Durable snapshot slot for the saved-books list.
//!
//! The whole list is written on every mutation and read once at startup.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use crate::book::BookRecord;

use super::SnapshotError;

/// Default slot name for the saved-books snapshot file.
pub const DEFAULT_SNAPSHOT_FILE: &str = "savedBooks.json";

/// Read-at-init, write-after-mutate persistence for the saved-books list.
pub trait SnapshotStore: Send + Sync {
    /// Returns the stored list, or an empty list when the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Read`] or [`SnapshotError::Corrupt`].
    fn load(&self) -> Result<Vec<BookRecord>, SnapshotError>;

    /// Replaces the stored list.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Write`] when the slot cannot be written.
    fn save(&self, books: &[BookRecord]) -> Result<(), SnapshotError>;

    /// Human-readable slot name for messages.
    fn slot(&self) -> String;
}

/// Parses and validates snapshot content.
fn decode(slot: &str, raw: &str) -> Result<Vec<BookRecord>, SnapshotError> {
    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(Vec::new());
    }
    let books: Vec<BookRecord> =
        serde_json::from_str(raw).map_err(|e| SnapshotError::corrupt(slot, e))?;

    let mut seen = HashSet::with_capacity(books.len());
    for book in &books {
        if book.copy_count == 0 {
            return Err(SnapshotError::corrupt(
                slot,
                format!("ISBN {} has a copy count of 0", book.isbn),
            ));
        }
        if !seen.insert(book.isbn.as_str()) {
            return Err(SnapshotError::corrupt(
                slot,
                format!("ISBN {} appears more than once", book.isbn),
            ));
        }
    }
    Ok(books)
}

// ==================== JsonFileSnapshot ====================

/// Snapshot stored as a pretty-printed JSON array in one file.
///
/// Writes go to a sibling temp file that is renamed over the slot, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileSnapshot {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Vec<BookRecord>, SnapshotError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot yet; starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(SnapshotError::read(&self.path, &e)),
        };
        let books = decode(&self.slot(), &raw)?;
        debug!(count = books.len(), "Snapshot loaded");
        Ok(books)
    }

    #[instrument(skip(self, books), fields(path = %self.path.display(), count = books.len()))]
    fn save(&self, books: &[BookRecord]) -> Result<(), SnapshotError> {
        let slot = self.slot();
        let json = serde_json::to_vec_pretty(books).map_err(|e| SnapshotError::write(&slot, e))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| SnapshotError::write(&slot, e))?;
        }

        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| SnapshotError::write(&slot, e))?;
        fs::rename(&temp, &self.path).map_err(|e| SnapshotError::write(&slot, e))?;
        debug!("Snapshot written");
        Ok(())
    }

    fn slot(&self) -> String {
        self.path.display().to_string()
    }
}

// ==================== MemorySnapshot ====================

#[derive(Debug, Default)]
struct MemorySlot {
    content: Option<String>,
    fail_writes: bool,
    writes: usize,
}

/// In-memory snapshot holding the serialized JSON.
///
/// Clones share the same slot, so a test can keep a handle and inspect
/// what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    inner: Arc<Mutex<MemorySlot>>,
}

impl MemorySnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot pre-filled with raw content, as if written by an earlier session.
    #[must_use]
    pub fn with_content(raw: impl Into<String>) -> Self {
        let snapshot = Self::default();
        if let Ok(mut slot) = snapshot.inner.lock() {
            slot.content = Some(raw.into());
        }
        snapshot
    }

    /// Makes subsequent writes fail (simulates a full disk).
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut slot) = self.inner.lock() {
            slot.fail_writes = fail;
        }
    }

    /// Raw slot content.
    #[must_use]
    pub fn content(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|slot| slot.content.clone())
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|slot| slot.writes).unwrap_or(0)
    }
}

impl SnapshotStore for MemorySnapshot {
    fn load(&self) -> Result<Vec<BookRecord>, SnapshotError> {
        let content = self.content();
        content.map_or_else(|| Ok(Vec::new()), |raw| decode(&self.slot(), &raw))
    }

    fn save(&self, books: &[BookRecord]) -> Result<(), SnapshotError> {
        let mut slot = self
            .inner
            .lock()
            .map_err(|_| SnapshotError::write(self.slot(), "slot lock poisoned"))?;
        if slot.fail_writes {
            return Err(SnapshotError::write(self.slot(), "simulated write failure"));
        }
        let json = serde_json::to_string(books).map_err(|e| SnapshotError::write(self.slot(), e))?;
        slot.content = Some(json);
        slot.writes += 1;
        Ok(())
    }

    fn slot(&self) -> String {
        "memory".to_string()
    }
}
