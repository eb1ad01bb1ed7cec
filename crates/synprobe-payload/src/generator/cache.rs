//! On-disk covering-array cache keyed by `(cardinalities, strength)`.
//!
//! Entries are published atomically (write to a temporary file in the cache
//! directory, then rename), and generation for one key is serialized by a
//! per-key lock, so concurrent requests never observe a half-written array.

use crate::error::{PayloadError, PayloadResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use synprobe_types::{ArrayKey, CoveringArray};
use tempfile::TempDir;
use tracing::{debug, warn};

type KeyLocks = Mutex<HashMap<ArrayKey, Arc<tokio::sync::Mutex<()>>>>;

pub struct ArrayCache {
    dir: PathBuf,
    locks: KeyLocks,
}

/// Shared claim on the generation lock of one key.
///
/// The map entry is removed when the last claim is dropped.
pub(crate) struct KeyLease<'a> {
    locks: &'a KeyLocks,
    key: ArrayKey,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl KeyLease<'_> {
    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        // One reference is ours, the other belongs to the map.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}

impl ArrayCache {
    /// Open (and create if needed) a cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> PayloadResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Location of the canonical CSV for `key`.
    pub fn path_for(&self, key: &ArrayKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Lock serializing generation for one key.
    pub(crate) fn key_lock(&self, key: &ArrayKey) -> KeyLease<'_> {
        let lock = self
            .locks
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        KeyLease {
            locks: &self.locks,
            key: key.clone(),
            lock,
        }
    }

    /// Scratch directory for a backend run, removed on drop.
    pub(crate) fn workdir(&self) -> PayloadResult<TempDir> {
        Ok(tempfile::Builder::new()
            .prefix(".work-")
            .tempdir_in(&self.dir)?)
    }

    /// A previously published array for `key`, if one exists and is usable.
    ///
    /// The file must be larger than the number of positions (a cheap
    /// non-emptiness check), parse as canonical CSV, hold at least one row and
    /// fit the key's cardinalities. Anything else is treated as stale.
    pub async fn lookup(&self, key: &ArrayKey) -> PayloadResult<Option<CoveringArray>> {
        let path = self.path_for(key);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Ok(None),
        };
        if metadata.len() <= key.columns() as u64 {
            debug!(key = %key, size = metadata.len(), "cached array too small, regenerating");
            return Ok(None);
        }

        let text = tokio::fs::read_to_string(&path).await?;
        match CoveringArray::from_csv(&text, key.columns()) {
            Ok(array) if !array.is_empty() && array.fits(key.cardinalities()) => Ok(Some(array)),
            Ok(_) => {
                warn!(key = %key, path = %path.display(), "cached array is stale, regenerating");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, path = %path.display(), error = %e, "cached array is corrupt, regenerating");
                Ok(None)
            }
        }
    }

    /// Atomically publish `array` as the entry for `key`.
    ///
    /// The temporary file is removed on every failure path.
    pub async fn publish(&self, key: &ArrayKey, array: &CoveringArray) -> PayloadResult<PathBuf> {
        let path = self.path_for(key);
        let dir = self.dir.clone();
        let target = path.clone();
        let prefix = format!(".{}.", key.file_name());
        let contents = array.to_csv();

        tokio::task::spawn_blocking(move || -> PayloadResult<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            tmp.write_all(contents.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| PayloadError::Io(std::io::Error::other(e)))??;

        debug!(key = %key, path = %path.display(), rows = array.row_count(), "covering array published");
        Ok(path)
    }

    #[cfg(test)]
    pub(crate) fn tracked_keys(&self) -> usize {
        self.locks.lock().len()
    }
}
