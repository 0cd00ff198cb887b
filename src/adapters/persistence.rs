//! Persistence Store Adapters
//!
//! Implements the `PersistenceStore` port on a local file and in memory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::PersistenceStore;
use crate::error::{Error, Result};

/// File-backed store.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write never leaves a truncated blob behind.
#[derive(Debug, Clone)]
pub struct FilePersistenceStore {
    path: PathBuf,
}

impl FilePersistenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistenceStore for FilePersistenceStore {
    fn load_blob(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No persisted warm set");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save_blob(&self, blob: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(blob)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            Error::Persistence(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct InMemoryPersistenceStore {
    blob: RwLock<Option<Vec<u8>>>,
    saves: AtomicU64,
}

impl InMemoryPersistenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store, e.g. to simulate a previous session
    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self {
            blob: RwLock::new(Some(blob)),
            saves: AtomicU64::new(0),
        }
    }

    pub fn blob(&self) -> Option<Vec<u8>> {
        self.blob.read().clone()
    }

    /// Number of writes since creation
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }
}

impl PersistenceStore for InMemoryPersistenceStore {
    fn load_blob(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.blob.read().clone())
    }

    fn save_blob(&self, blob: &[u8]) -> Result<()> {
        *self.blob.write() = Some(blob.to_vec());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistenceStore::new(dir.path().join("warm.json"));
        assert!(store.load_blob().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistenceStore::new(dir.path().join("state").join("warm.json"));

        store.save_blob(b"[\"a\"]").unwrap();
        store.save_blob(b"[\"a\",\"b\"]").unwrap();

        assert_eq!(store.load_blob().unwrap().unwrap(), b"[\"a\",\"b\"]".to_vec());
        assert!(!dir.path().join("state").join("warm.json.tmp").exists());
    }

    #[test]
    fn test_in_memory_store_counts_saves() {
        let store = InMemoryPersistenceStore::new();
        assert!(store.load_blob().unwrap().is_none());

        store.save_blob(b"[]").unwrap();
        store.save_blob(b"[\"x\"]").unwrap();

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.blob().unwrap(), b"[\"x\"]".to_vec());
    }
}
