//! Explicit, caller-owned file content cache.
//!
//! Extraction writes many PNGs that downstream steps (base64 encoding,
//! recropping) read straight back. A [`FileContentCache`] handed in through
//! [`crate::config::ExtractionConfig::cache`] keeps those bytes in memory:
//! every write primes it, every read goes through it.
//!
//! The cache is bounded by total bytes and evicts least-recently-used
//! entries. It is shared behind an `Arc` and guarded by a `Mutex`; a
//! poisoned lock is recovered rather than propagated since the map stays
//! consistent between operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Byte-bounded LRU cache of file contents keyed by path.
#[derive(Debug)]
pub struct FileContentCache {
    max_bytes: usize,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<PathBuf, Entry>,
    total_bytes: usize,
    /// Monotonic access counter used as the recency stamp.
    clock: u64,
}

#[derive(Debug)]
struct Entry {
    bytes: Arc<[u8]>,
    last_used: u64,
}

impl FileContentCache {
    /// 256 MiB.
    pub const DEFAULT_MAX_BYTES: usize = 256 * 1024 * 1024;

    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, path: &Path) -> Option<Arc<[u8]>> {
        let mut inner = self.lock();
        inner.clock += 1;
        let now = inner.clock;
        inner.entries.get_mut(path).map(|e| {
            e.last_used = now;
            Arc::clone(&e.bytes)
        })
    }

    /// Store `bytes` for `path`, replacing any previous entry.
    ///
    /// Entries larger than the whole budget are not cached.
    pub fn insert(&self, path: &Path, bytes: Vec<u8>) {
        let mut inner = self.lock();
        if let Some(old) = inner.entries.remove(path) {
            inner.total_bytes -= old.bytes.len();
        }
        if bytes.len() > self.max_bytes {
            debug!("Not caching {} ({} bytes > budget)", path.display(), bytes.len());
            return;
        }

        inner.clock += 1;
        let now = inner.clock;
        inner.total_bytes += bytes.len();
        inner.entries.insert(
            path.to_path_buf(),
            Entry {
                bytes: bytes.into(),
                last_used: now,
            },
        );

        while inner.total_bytes > self.max_bytes {
            let Some(victim) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(p, _)| p.clone())
            else {
                break;
            };
            if let Some(e) = inner.entries.remove(&victim) {
                inner.total_bytes -= e.bytes.len();
            }
        }
    }

    /// Cached bytes for `path`, reading the file on a miss.
    pub fn get_or_load(&self, path: &Path) -> std::io::Result<Arc<[u8]>> {
        if let Some(bytes) = self.get(path) {
            return Ok(bytes);
        }
        let bytes = std::fs::read(path)?;
        self.insert(path, bytes.clone());
        Ok(bytes.into())
    }

    pub fn invalidate(&self, path: &Path) {
        let mut inner = self.lock();
        if let Some(e) = inner.entries.remove(path) {
            inner.total_bytes -= e.bytes.len();
        }
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> usize {
        self.lock().total_bytes
    }
}

impl Default for FileContentCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_BYTES)
    }
}

/// Read through the cache when one is configured.
pub(crate) fn read_file(cache: Option<&FileContentCache>, path: &Path) -> std::io::Result<Arc<[u8]>> {
    match cache {
        Some(cache) => cache.get_or_load(path),
        None => std::fs::read(path).map(Arc::from),
    }
}
