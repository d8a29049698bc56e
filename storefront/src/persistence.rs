//! Durable storage for the cart and the selected country.
//!
//! The storefront writes a [`PersistedCart`] snapshot after every mutation
//! and restores it on startup. Writes run as effects, so they may complete
//! out of order; every snapshot carries a revision and adapters drop writes
//! older than the newest one they have stored.

use crate::cart::CartItem;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors raised by storage adapters
#[derive(Error, Debug)]
pub enum StorageError {
    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Snapshot written to storage
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    /// Increases with every snapshot
    #[serde(default)]
    pub revision: u64,
    /// Cart lines
    #[serde(default)]
    pub cart: Vec<CartItem>,
    /// Country the catalog is filtered by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_country: Option<String>,
}

/// Boxed future returned by [`CartStorage`] methods
pub type StorageFuture<'a, T> = BoxFuture<'a, Result<T, StorageError>>;

/// Where cart snapshots live
///
/// Uses explicit boxed futures so reducers can hold an `Arc<dyn CartStorage>`.
pub trait CartStorage: Send + Sync {
    /// Read the stored snapshot, `None` if nothing was saved yet
    fn load(&self) -> StorageFuture<'_, Option<PersistedCart>>;

    /// Store `snapshot` unless a newer revision is already stored
    ///
    /// Returns whether the snapshot was written.
    fn save(&self, snapshot: PersistedCart) -> StorageFuture<'_, bool>;
}

/// JSON file storage
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash never leaves a half-written snapshot.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    latest: tokio::sync::Mutex<Option<u64>>,
}

impl FileStorage {
    /// Storage backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            latest: tokio::sync::Mutex::new(None),
        }
    }

    /// File the snapshot is written to
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

impl CartStorage for FileStorage {
    fn load(&self) -> StorageFuture<'_, Option<PersistedCart>> {
        Box::pin(async move {
            let bytes = match tokio::fs::read(&self.path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            let snapshot: PersistedCart = serde_json::from_slice(&bytes)?;
            let mut latest = self.latest.lock().await;
            *latest = Some(latest.map_or(snapshot.revision, |r| r.max(snapshot.revision)));

            tracing::debug!(
                path = %self.path.display(),
                revision = snapshot.revision,
                items = snapshot.cart.len(),
                "Cart snapshot loaded"
            );
            Ok(Some(snapshot))
        })
    }

    fn save(&self, snapshot: PersistedCart) -> StorageFuture<'_, bool> {
        Box::pin(async move {
            let mut latest = self.latest.lock().await;
            if latest.is_some_and(|r| snapshot.revision < r) {
                tracing::debug!(revision = snapshot.revision, "Dropping stale cart snapshot");
                return Ok(false);
            }

            let bytes = serde_json::to_vec_pretty(&snapshot)?;
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }

            let temp = self.temp_path();
            tokio::fs::write(&temp, bytes).await?;
            tokio::fs::rename(&temp, &self.path).await?;

            *latest = Some(snapshot.revision);
            tracing::trace!(path = %self.path.display(), revision = snapshot.revision, "Cart snapshot saved");
            Ok(true)
        })
    }
}

/// In-memory storage for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Option<PersistedCart>>,
    writes: Mutex<usize>,
}

impl MemoryStorage {
    /// Empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `snapshot`
    #[must_use]
    pub fn with_snapshot(snapshot: PersistedCart) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            writes: Mutex::new(0),
        }
    }

    /// Currently stored snapshot
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedCart> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of accepted writes
    #[must_use]
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> StorageFuture<'_, Option<PersistedCart>> {
        let snapshot = self.snapshot();
        Box::pin(async move { Ok(snapshot) })
    }

    fn save(&self, snapshot: PersistedCart) -> StorageFuture<'_, bool> {
        let written = {
            let mut stored = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
            if stored.as_ref().is_some_and(|s| snapshot.revision < s.revision) {
                false
            } else {
                *stored = Some(snapshot);
                *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
                true
            }
        };
        Box::pin(async move { Ok(written) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(revision: u64, country: &str) -> PersistedCart {
        PersistedCart {
            revision,
            cart: Vec::new(),
            selected_country: Some(country.to_string()),
        }
    }

    #[tokio::test]
    async fn test_memory_storage_drops_stale_revisions() {
        let storage = MemoryStorage::new();

        assert!(matches!(storage.save(snapshot(2, "Uganda")).await, Ok(true)));
        assert!(matches!(storage.save(snapshot(1, "Rwanda")).await, Ok(false)));

        assert_eq!(storage.snapshot(), Some(snapshot(2, "Uganda")));
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let json = serde_json::to_value(snapshot(3, "Liberia")).unwrap_or_default();
        assert_eq!(json["revision"], 3);
        assert_eq!(json["selectedCountry"], "Liberia");
        assert!(json["cart"].as_array().is_some_and(Vec::is_empty));
    }
}
