//! Snapshot persistence for the todo collection.
//!
//! The persisted state is a single serialized array of todo records; the
//! entire array is rewritten on every mutation. Persistence failures are a
//! warning class: the in-memory store stays authoritative for the life of
//! the process.

use crate::todo::Todo;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors from reading or writing the persisted snapshot.
///
/// These are logged by the store, never surfaced to callers.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Filesystem read/write failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored bytes were not a valid todo array.
    #[error("snapshot is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Storage for a whole-collection snapshot.
pub trait Snapshot: Send + Sync {
    /// Read the persisted array. An absent snapshot is an empty array, not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the backing storage cannot be read
    /// or the stored bytes do not decode.
    fn load(&self) -> Result<Vec<Todo>, SnapshotError>;

    /// Rewrite the persisted array with the given records.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the backing storage cannot be
    /// written.
    fn save(&self, todos: &[Todo]) -> Result<(), SnapshotError>;
}

/// Snapshot stored as a JSON file on local disk.
///
/// Writes go to a sibling temp file first and are moved into place, so a
/// crash mid-write cannot leave a truncated snapshot behind.
#[derive(Clone, Debug)]
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    /// Snapshot backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Snapshot for JsonFileSnapshot {
    fn load(&self) -> Result<Vec<Todo>, SnapshotError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, todos: &[Todo]) -> Result<(), SnapshotError> {
        let bytes = serde_json::to_vec(todos)?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory snapshot for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    stored: Mutex<Vec<Todo>>,
}

impl MemorySnapshot {
    /// Snapshot pre-seeded with existing records.
    #[must_use]
    pub fn seeded(todos: Vec<Todo>) -> Self {
        Self {
            stored: Mutex::new(todos),
        }
    }

    /// Current persisted contents.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (a writer panicked).
    #[must_use]
    pub fn contents(&self) -> Vec<Todo> {
        #[allow(clippy::unwrap_used)]
        let stored = self.stored.lock().unwrap();
        stored.clone()
    }
}

impl Snapshot for MemorySnapshot {
    fn load(&self) -> Result<Vec<Todo>, SnapshotError> {
        let stored = self
            .stored
            .lock()
            .map_err(|_| std::io::Error::other("snapshot lock poisoned"))?;
        Ok(stored.clone())
    }

    fn save(&self, todos: &[Todo]) -> Result<(), SnapshotError> {
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| std::io::Error::other("snapshot lock poisoned"))?;
        *stored = todos.to_vec();
        Ok(())
    }
}
