//! Content-addressed response cache.
//!
//! A [`CacheStore`] maps a [`RequestDescriptor`] to the processed response
//! previously generated for it. The address is a [`CacheKey`] (SHA-256 of
//! the descriptor's canonical JSON), so reordering keys in a prompt file
//! never causes a miss.
//!
//! Records are [`CacheEntry`] values serialized to JSON and held by a
//! [`CacheBackend`]. Expiry is logical: an entry older than the retention
//! window is reported as absent but left in place until it is overwritten.
//!
//! Lookups never fail. A record that cannot be read or decoded is logged and
//! treated as a miss, so a corrupt cache only costs a regeneration. Store
//! failures are surfaced to the caller.

pub mod backend;
pub mod entry;
pub mod key;

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use entry::CacheEntry;
pub use key::CacheKey;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::telemetry;
use crate::types::RequestDescriptor;
use crate::{PromptcError, Result};

/// Default retention window: 24 hours.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Tuning knobs for a [`CacheStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an entry stays valid after it was stored.
    pub retention: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
        }
    }
}

impl CacheConfig {
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}

/// Response cache over a pluggable storage medium.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl CacheStore {
    /// Create a store over `backend` with default retention.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_config(backend, CacheConfig::default())
    }

    pub fn with_config(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    /// File-backed store rooted at `dir` (created if missing).
    pub fn file(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Arc::new(FileBackend::new(dir)?)))
    }

    /// In-memory store; nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn CacheBackend {
        self.backend.as_ref()
    }

    /// Return the cached response for `descriptor`, if a fresh one exists.
    pub fn lookup(&self, descriptor: &RequestDescriptor) -> Option<String> {
        self.lookup_at(descriptor, Utc::now())
    }

    /// [`lookup`](Self::lookup) evaluated at an explicit point in time.
    pub fn lookup_at(&self, descriptor: &RequestDescriptor, now: DateTime<Utc>) -> Option<String> {
        let key = CacheKey::for_descriptor(descriptor);
        let found = self.read_fresh(&key, now);

        let counter = if found.is_some() {
            telemetry::CACHE_HITS_TOTAL
        } else {
            telemetry::CACHE_MISSES_TOTAL
        };
        metrics::counter!(counter, "medium" => self.backend.name().to_owned()).increment(1);

        found
    }

    fn read_fresh(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<String> {
        let record = match self.backend.get(key) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let entry = match CacheEntry::from_record(&record) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "undecodable cache record, treating as miss");
                return None;
            }
        };

        if entry.key != *key {
            warn!(key = %key, stored = %entry.key, "cache record key mismatch, treating as miss");
            return None;
        }
        if entry.is_expired(now, self.config.retention) {
            debug!(key = %key, created_at = %entry.created_at, "cache entry expired");
            return None;
        }
        Some(entry.response)
    }

    /// Store `response` for `descriptor`, replacing any previous entry.
    pub fn store(&self, descriptor: &RequestDescriptor, response: &str) -> Result<()> {
        self.store_entry(&CacheEntry::new(descriptor.clone(), response))
    }

    /// Write a fully-formed entry (its `created_at` is kept as-is).
    pub fn store_entry(&self, entry: &CacheEntry) -> Result<()> {
        let record = entry.to_record().map_err(|e| {
            PromptcError::Cache(format!("failed to encode cache entry {}: {e}", entry.key))
        })?;
        self.backend.put(&entry.key, record)?;
        debug!(key = %entry.key, medium = self.backend.name(), "cache entry stored");
        Ok(())
    }

    /// Remove every stored entry, returning how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.backend.clear()?;
        debug!(removed, medium = self.backend.name(), "cache cleared");
        Ok(removed)
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("medium", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use tempfile::TempDir;

    struct BrokenBackend;

    impl CacheBackend for BrokenBackend {
        fn name(&self) -> &str {
            "broken"
        }
        fn get(&self, _key: &CacheKey) -> Result<Option<String>> {
            Err(PromptcError::Cache("disk on fire".into()))
        }
        fn put(&self, _key: &CacheKey, _record: String) -> Result<()> {
            Err(PromptcError::Cache("disk on fire".into()))
        }
        fn clear(&self) -> Result<usize> {
            Ok(0)
        }
    }

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::new().with("name", "Test").with("language", "python")
    }

    #[test]
    fn store_then_lookup() {
        let store = CacheStore::in_memory();
        assert_eq!(store.lookup(&descriptor()), None);
        store.store(&descriptor(), "def f():\n    pass").unwrap();
        assert_eq!(store.lookup(&descriptor()).as_deref(), Some("def f():\n    pass"));
    }

    #[test]
    fn last_writer_wins() {
        let store = CacheStore::in_memory();
        store.store(&descriptor(), "one").unwrap();
        store.store(&descriptor(), "two").unwrap();
        assert_eq!(store.lookup(&descriptor()).as_deref(), Some("two"));
    }

    #[test]
    fn expired_entry_is_absent_but_kept() {
        let store = CacheStore::in_memory();
        let old = CacheEntry::created_at(descriptor(), "stale", Utc::now() - TimeDelta::hours(25));
        store.store_entry(&old).unwrap();

        assert_eq!(store.lookup(&descriptor()), None);
        assert!(store.backend().get(&old.key).unwrap().is_some());
    }

    #[test]
    fn custom_retention() {
        let backend = Arc::new(MemoryBackend::new());
        let store = CacheStore::with_config(
            backend,
            CacheConfig::default().retention(Duration::from_secs(60)),
        );
        store.store(&descriptor(), "x").unwrap();

        let now = Utc::now();
        assert!(store.lookup_at(&descriptor(), now + TimeDelta::seconds(30)).is_some());
        assert!(store.lookup_at(&descriptor(), now + TimeDelta::seconds(120)).is_none());
    }

    #[test]
    fn corrupt_record_is_a_miss() {
        let backend = Arc::new(MemoryBackend::new());
        let key = CacheKey::for_descriptor(&descriptor());
        backend.put(&key, "{ truncated".to_string()).unwrap();

        let store = CacheStore::new(backend);
        assert_eq!(store.lookup(&descriptor()), None);
    }

    #[test]
    fn mismatched_key_is_a_miss() {
        let backend = Arc::new(MemoryBackend::new());
        let other = CacheEntry::new(RequestDescriptor::new().with("name", "Other"), "other");
        let key = CacheKey::for_descriptor(&descriptor());
        backend.put(&key, other.to_record().unwrap()).unwrap();

        let store = CacheStore::new(backend);
        assert_eq!(store.lookup(&descriptor()), None);
    }

    #[test]
    fn read_failure_degrades_to_miss() {
        let store = CacheStore::new(Arc::new(BrokenBackend));
        assert_eq!(store.lookup(&descriptor()), None);
    }

    #[test]
    fn write_failure_surfaces() {
        let store = CacheStore::new(Arc::new(BrokenBackend));
        let err = store.store(&descriptor(), "x").unwrap_err();
        assert!(matches!(err, PromptcError::Cache(_)));
    }

    #[test]
    fn persistence_failures_on_disk_are_cache_errors() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("cache");
        let store = CacheStore::file(&dir).unwrap();

        // Replace the directory with a plain file.
        std::fs::remove_dir_all(&dir).unwrap();
        std::fs::write(&dir, "not a directory").unwrap();

        let err = store.store(&descriptor(), "x").unwrap_err();
        assert!(matches!(err, PromptcError::Cache(_)));

        let err = store.clear().unwrap_err();
        assert!(matches!(err, PromptcError::Cache(_)));
    }

    #[test]
    fn clear_empties_store() {
        let store = CacheStore::in_memory();
        store.store(&descriptor(), "x").unwrap();
        assert_eq!(store.clear().unwrap(), 1);
        assert_eq!(store.lookup(&descriptor()), None);
    }
}
