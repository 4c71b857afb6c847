//! Reference-counted, capacity-bounded cache of open datasets.
//!
//! Every `open_dataset` must be paired with a `close_dataset` for the same
//! path. An entry whose open count drops to zero stays cached, so a later
//! open is a hit, until the cache grows beyond its capacity; then idle entries
//! are evicted least-recently-used first. Entries in use are never evicted.

use lru::LruCache;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{Dataset, DatasetOpener};
use crate::error::Result;

/// Statistics for the dataset cache
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct CacheEntry {
    file_path: PathBuf,
    handle: Arc<dyn Dataset>,
    open_count: usize,
}

struct CacheState {
    /// Most recently opened entries first
    entries: LruCache<PathBuf, CacheEntry>,
    stats: CacheStats,
}

/// Cache of open dataset handles, keyed by path
pub struct DatasetCache {
    opener: Arc<dyn DatasetOpener>,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl DatasetCache {
    /// Create a cache holding at most `capacity` idle handles
    pub fn new(opener: Arc<dyn DatasetOpener>, capacity: usize) -> Self {
        Self {
            opener,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Return the handle for `path`, opening the file if it is not cached.
    ///
    /// Open failures propagate and leave no entry behind.
    pub fn open_dataset(&self, path: &Path) -> Result<Arc<dyn Dataset>> {
        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            if let Some(entry) = state.entries.get_mut(path) {
                entry.open_count += 1;
                let handle = entry.handle.clone();
                state.stats.hits += 1;
                return Ok(handle);
            }
            state.stats.misses += 1;
        }

        // Open outside the lock so slow opens of different files can overlap
        let handle = self.opener.open(path)?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let handle = match state.entries.get_mut(path) {
            // Another thread opened the same file meanwhile; share its handle
            Some(entry) => {
                entry.open_count += 1;
                entry.handle.clone()
            }
            None => {
                debug!(path = %path.display(), "Opened dataset");
                state.entries.put(
                    path.to_path_buf(),
                    CacheEntry {
                        file_path: path.to_path_buf(),
                        handle: handle.clone(),
                        open_count: 1,
                    },
                );
                handle
            }
        };
        self.evict_idle(state);
        Ok(handle)
    }

    /// Release one reference to `path`. Unknown paths are ignored.
    pub fn close_dataset(&self, path: &Path) {
        let mut state = self.state.lock();
        match state.entries.peek_mut(path) {
            Some(entry) => entry.open_count = entry.open_count.saturating_sub(1),
            None => return,
        }
        self.evict_idle(&mut state);
    }

    /// Drop every idle entry
    pub fn clear_idle(&self) {
        let mut state = self.state.lock();
        let idle: Vec<PathBuf> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.open_count == 0)
            .map(|(path, _)| path.clone())
            .collect();
        for path in idle {
            state.entries.pop(&path);
        }
    }

    /// Current open count of `path`, if it is cached
    pub fn open_count(&self, path: &Path) -> Option<usize> {
        self.state.lock().entries.peek(path).map(|entry| entry.open_count)
    }

    /// Whether `path` currently has a cached handle
    pub fn contains(&self, path: &Path) -> bool {
        self.state.lock().entries.contains(path)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.entries.len(),
            ..state.stats.clone()
        }
    }

    fn evict_idle(&self, state: &mut CacheState) {
        while state.entries.len() > self.capacity {
            // Iteration runs from most to least recently used
            let victim = state
                .entries
                .iter()
                .rev()
                .find(|(_, entry)| entry.open_count == 0)
                .map(|(path, _)| path.clone());

            match victim {
                Some(path) => {
                    if let Some(entry) = state.entries.pop(&path) {
                        debug!(path = %entry.file_path.display(), "Evicted dataset");
                    }
                    state.stats.evictions += 1;
                }
                None => {
                    warn!(
                        entries = state.entries.len(),
                        capacity = self.capacity,
                        "All cached datasets are in use; cache exceeds its capacity"
                    );
                    break;
                }
            }
        }
    }
}
