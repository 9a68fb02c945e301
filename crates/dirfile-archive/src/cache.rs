//! Inflated segment cache
//!
//! Afterburner segments are inflated at most once per archive in the
//! common case. Concurrent first loads of the same id may both inflate, but
//! only the first result is stored and every caller gets that buffer.

use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Segments currently cached
    pub cached_segments: usize,
    /// Bytes held by cached segments
    pub cached_bytes: usize,
    /// Loads served from the cache
    pub hits: u64,
    /// Segments inflated
    pub inflations: u64,
}

/// Arena of inflated buffers indexed by resource id
#[derive(Debug, Default)]
pub struct SegmentCache {
    arena: RwLock<HashMap<u32, Bytes>>,
    hits: AtomicU64,
    inflations: AtomicU64,
}

impl SegmentCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached payload for `id`
    pub fn get(&self, id: u32) -> Option<Bytes> {
        let found = self.arena.read().get(&id).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store a freshly inflated payload and return the canonical copy
    ///
    /// When another caller stored the same id first, its buffer is returned
    /// and `payload` is dropped.
    pub fn insert(&self, id: u32, payload: Bytes) -> Bytes {
        self.record_inflation();
        self.arena.write().entry(id).or_insert(payload).clone()
    }

    /// Count an inflation whose result is not stored
    pub fn record_inflation(&self) {
        self.inflations.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        let arena = self.arena.read();
        CacheStats {
            cached_segments: arena.len(),
            cached_bytes: arena.values().map(Bytes::len).sum(),
            hits: self.hits.load(Ordering::Relaxed),
            inflations: self.inflations.load(Ordering::Relaxed),
        }
    }
}
