// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use hashbrown::HashMap;

use crate::fingerprint::CacheKey;
use crate::surface::BitmapHandle;

/// A cached bitmap and the serial of its last access.
#[derive(Debug)]
pub struct CacheEntry {
    handle: BitmapHandle,
    last_used: u64,
}

impl CacheEntry {
    /// The cache's reference to the bitmap.
    pub fn handle(&self) -> &BitmapHandle {
        &self.handle
    }

    /// The access serial of the last lookup or insertion of this entry.
    pub fn last_used(&self) -> u64 {
        self.last_used
    }
}

/// A least-recently-used cache of rendered bitmaps.
///
/// The cache owns one reference to each bitmap it stores and releases it exactly once, when
/// the entry is evicted, replaced or cleared. Handles returned by [`get`](Self::get) are
/// independent references that outlive eviction.
#[derive(Debug)]
pub struct BitmapCache {
    entries: HashMap<CacheKey, CacheEntry>,
    capacity: usize,
    serial: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl BitmapCache {
    /// Creates an empty cache holding at most `capacity` bitmaps.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            serial: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Returns a new reference to the bitmap for `key` and marks it as recently used.
    pub fn get(&mut self, key: &CacheKey) -> Option<BitmapHandle> {
        self.serial += 1;
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = self.serial;
                self.hits += 1;
                log::trace!("bitmap cache hit for {key}");
                Some(entry.handle.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores `handle` under `key`, replacing any previous bitmap, then evicts the least
    /// recently used entries until the cache is within capacity.
    pub fn insert(&mut self, key: CacheKey, handle: BitmapHandle) {
        self.serial += 1;
        let entry = CacheEntry {
            handle,
            last_used: self.serial,
        };
        if let Some(old) = self.entries.insert(key, entry) {
            old.handle.release();
        }
        while self.entries.len() > self.capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                log::debug!("evicting bitmap {oldest}");
                entry.handle.release();
                self.evictions += 1;
            }
        }
    }

    /// Releases every cached bitmap.
    pub fn clear(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.handle.release();
        }
    }

    /// Whether a bitmap is cached for `key`. This does not affect recency.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the entry for `key` without affecting recency.
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Number of cached bitmaps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The maximum number of cached bitmaps.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lookup hits, lookup misses and evictions so far.
    pub fn stats(&self) -> (u64, u64, u64) {
        (self.hits, self.misses, self.evictions)
    }
}
