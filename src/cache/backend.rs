//! Storage media for cache records.
//!
//! [`CacheBackend`] is the only thing the [`CacheStore`](super::CacheStore)
//! needs from a medium: get and put a serialized record by key. Two media
//! ship with the crate:
//!
//! - [`FileBackend`]: one JSON file per key under a directory. Survives
//!   restarts; this is what the CLI uses.
//! - [`MemoryBackend`]: bounded in-process LRU (moka). Useful for tests and
//!   for long-running processes that do not want disk writes.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use tracing::debug;

use super::key::CacheKey;
use crate::{PromptcError, Result};

/// Durable key-value medium for serialized cache records.
pub trait CacheBackend: Send + Sync {
    /// Medium name for logging.
    fn name(&self) -> &str;

    /// Read the record stored under `key`, if any.
    fn get(&self, key: &CacheKey) -> Result<Option<String>>;

    /// Write `record` under `key`, replacing any previous record.
    fn put(&self, key: &CacheKey, record: String) -> Result<()>;

    /// Remove every record, returning how many were removed.
    fn clear(&self) -> Result<usize>;
}

// ============================================================================
// FileBackend
// ============================================================================

/// Distinguishes temp files of concurrent writers within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One pretty-printed JSON file per key: `<dir>/<key>.json`.
///
/// Writes go to a temp file in the same directory and are renamed into
/// place, so readers never observe a half-written record.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a cache directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            PromptcError::Cache(format!(
                "failed to create cache directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PromptcError::Cache(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn put(&self, key: &CacheKey, record: String) -> Result<()> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(
            "{key}.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&tmp, record).map_err(|e| {
            PromptcError::Cache(format!("failed to write {}: {e}", tmp.display()))
        })?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(PromptcError::Cache(format!(
                "failed to move record into {}: {e}",
                path.display()
            )));
        }

        debug!(path = %path.display(), "cache record written");
        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            PromptcError::Cache(format!("failed to list {}: {e}", self.dir.display()))
        })?;

        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    PromptcError::Cache(format!("failed to list {}: {e}", self.dir.display()))
                })?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).map_err(|e| {
                    PromptcError::Cache(format!("failed to remove {}: {e}", path.display()))
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// ============================================================================
// MemoryBackend
// ============================================================================

/// Default maximum number of records held in memory.
const DEFAULT_MEMORY_MAX_ENTRIES: u64 = 10_000;

/// Bounded in-process LRU of serialized records.
///
/// Expiry is still decided by the store from each record's timestamp; the
/// LRU bound only caps memory.
pub struct MemoryBackend {
    records: Cache<String, String>,
}

impl MemoryBackend {
    /// Create an empty backend with the default capacity (10,000).
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MEMORY_MAX_ENTRIES)
    }

    /// Create a backend with a custom capacity.
    pub fn with_max_entries(max: u64) -> Self {
        Self {
            records: Cache::new(max),
        }
    }

    /// Number of records currently held.
    pub fn len(&self) -> u64 {
        self.records.run_pending_tasks();
        self.records.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        Ok(self.records.get(key.as_str()))
    }

    fn put(&self, key: &CacheKey, record: String) -> Result<()> {
        self.records.insert(key.as_str().to_owned(), record);
        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let count = self.len() as usize;
        self.records.invalidate_all();
        self.records.run_pending_tasks();
        Ok(count)
    }
}
