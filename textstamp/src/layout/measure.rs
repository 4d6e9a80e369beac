// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memoized text measurement.
//!
//! Wrapping measures the same words and word prefixes over and over, so every measurement is
//! cached by its exact font descriptor and string.

use core::fmt::{Debug, Formatter};
use core::hash::{Hash, Hasher};

use hashbrown::{Equivalent, HashMap};

use crate::style::FontDescriptor;
use crate::surface::TextMeasurer;

struct MeasureKey {
    font: FontDescriptor,
    text: Box<str>,
}

impl Hash for MeasureKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.font.hash(state);
        self.text.hash(state);
    }
}

impl PartialEq for MeasureKey {
    fn eq(&self, other: &Self) -> bool {
        self.font == other.font && self.text == other.text
    }
}

impl Eq for MeasureKey {}

/// Borrowed form of [`MeasureKey`], so that hits do not allocate.
struct MeasureLookupKey<'a> {
    font: &'a FontDescriptor,
    text: &'a str,
}

impl Hash for MeasureLookupKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.font.hash(state);
        self.text.hash(state);
    }
}

impl Equivalent<MeasureKey> for MeasureLookupKey<'_> {
    fn equivalent(&self, key: &MeasureKey) -> bool {
        *self.font == key.font && self.text == &*key.text
    }
}

struct MeasureEntry {
    width: f32,
    serial: u64,
}

/// A bounded cache of text widths.
///
/// When the cache grows past its capacity, the least recently accessed entries are evicted
/// until it is back to three quarters of its capacity.
pub struct MeasureCache {
    entries: HashMap<MeasureKey, MeasureEntry>,
    capacity: usize,
    serial: u64,
    epoch: u64,
    hits: u64,
    misses: u64,
}

impl Debug for MeasureCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MeasureCache")
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("epoch", &self.epoch)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}

impl MeasureCache {
    /// Creates an empty cache holding at most `capacity` widths.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            serial: 0,
            epoch: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the width of `text` in `font`, measuring it with `measurer` on a miss.
    pub fn measure<M: TextMeasurer + ?Sized>(
        &mut self,
        measurer: &M,
        font: &FontDescriptor,
        text: &str,
    ) -> f32 {
        self.serial += 1;
        let serial = self.serial;
        if let Some(entry) = self.entries.get_mut(&MeasureLookupKey { font, text }) {
            entry.serial = serial;
            self.hits += 1;
            return entry.width;
        }
        self.misses += 1;
        let width = measurer.measure(font, text);
        self.entries.insert(
            MeasureKey {
                font: *font,
                text: text.into(),
            },
            MeasureEntry { width, serial },
        );
        if self.entries.len() > self.capacity {
            self.prune();
        }
        width
    }

    fn prune(&mut self) {
        let keep = (self.capacity * 3 / 4).max(1);
        let remove = self.entries.len().saturating_sub(keep);
        if remove == 0 {
            return;
        }
        let mut serials: Vec<u64> = self.entries.values().map(|entry| entry.serial).collect();
        let (_, threshold, _) = serials.select_nth_unstable(remove - 1);
        let threshold = *threshold;
        self.entries.retain(|_, entry| entry.serial > threshold);
        log::trace!("pruned {remove} text measurements");
    }

    /// Drops every width if `epoch` differs from the font epoch the widths were taken in.
    pub fn sync_epoch(&mut self, epoch: u64) {
        if self.epoch != epoch {
            self.clear();
            self.epoch = epoch;
        }
    }

    /// Removes every width.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.serial = 0;
    }

    /// Number of cached widths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no widths are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cache hits so far.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of cache misses so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

/// A measurer paired with the cache that memoizes it, for the duration of one render pass.
pub struct MeasureSession<'a, M: ?Sized> {
    cache: &'a mut MeasureCache,
    measurer: &'a M,
}

impl<M: ?Sized> Debug for MeasureSession<'_, M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MeasureSession")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<'a, M: TextMeasurer + ?Sized> MeasureSession<'a, M> {
    /// Creates a session measuring with `measurer` through `cache`.
    pub fn new(cache: &'a mut MeasureCache, measurer: &'a M) -> Self {
        Self { cache, measurer }
    }

    /// The width of `text` in `font`.
    pub fn width(&mut self, font: &FontDescriptor, text: &str) -> f32 {
        self.cache.measure(self.measurer, font, text)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::style::FontFamily;

    struct CountingMeasurer {
        calls: Cell<usize>,
    }

    impl TextMeasurer for CountingMeasurer {
        fn measure(&self, _font: &FontDescriptor, text: &str) -> f32 {
            self.calls.set(self.calls.get() + 1);
            text.chars().count() as f32
        }
    }

    const SANS: FontDescriptor = FontDescriptor::new(FontFamily::Sans, 18.0);

    #[test]
    fn repeated_measurements_hit() {
        let measurer = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut cache = MeasureCache::new(16);
        assert_eq!(cache.measure(&measurer, &SANS, "word"), 4.0);
        assert_eq!(cache.measure(&measurer, &SANS, "word"), 4.0);
        assert_eq!(measurer.calls.get(), 1);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        let bold = FontDescriptor {
            bold: true,
            ..SANS
        };
        cache.measure(&measurer, &bold, "word");
        assert_eq!(measurer.calls.get(), 2, "font is part of the key");
    }

    #[test]
    fn prune_evicts_in_access_order() {
        let measurer = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut cache = MeasureCache::new(4);
        for text in ["a", "b", "c", "d"] {
            cache.measure(&measurer, &SANS, text);
        }
        // Touch "a" so that "b" and "c" are the oldest.
        cache.measure(&measurer, &SANS, "a");
        cache.measure(&measurer, &SANS, "e");
        assert_eq!(cache.len(), 3);

        let calls = measurer.calls.get();
        for text in ["a", "d", "e"] {
            cache.measure(&measurer, &SANS, text);
        }
        assert_eq!(measurer.calls.get(), calls, "recent entries survive");
        cache.measure(&measurer, &SANS, "b");
        assert_eq!(measurer.calls.get(), calls + 1, "oldest entry was evicted");
    }

    #[test]
    fn epoch_change_clears() {
        let measurer = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut cache = MeasureCache::new(8);
        cache.measure(&measurer, &SANS, "x");
        cache.sync_epoch(0);
        assert_eq!(cache.len(), 1);
        cache.sync_epoch(1);
        assert!(cache.is_empty(), "new font epoch drops stale widths");
    }
}
