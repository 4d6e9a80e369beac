// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A monotonically increasing counter of font-set changes.
///
/// Every cache key embeds the epoch it was computed in, so bumping the epoch makes every
/// earlier bitmap and measurement unreachable.
#[derive(Debug, Default)]
pub struct FontEpoch(AtomicU64);

impl FontEpoch {
    /// Creates an epoch counter starting at zero.
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// The current epoch.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Advances the epoch and returns the new value.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Tracks when the font set has settled or changed.
///
/// Text measured before the platform fonts have loaded is laid out with fallback metrics.
/// The host reports the first "fonts ready" signal with [`mark_stable`](Self::mark_stable)
/// and every later face registration with [`font_loaded`](Self::font_loaded).
#[derive(Debug, Default)]
pub struct FontReadiness {
    epoch: FontEpoch,
    stable: AtomicBool,
}

impl FontReadiness {
    /// Creates a tracker at epoch zero that has not seen the fonts settle yet.
    pub const fn new() -> Self {
        Self {
            epoch: FontEpoch::new(),
            stable: AtomicBool::new(false),
        }
    }

    /// The current font epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.current()
    }

    /// Whether [`mark_stable`](Self::mark_stable) has been called.
    pub fn is_stable(&self) -> bool {
        self.stable.load(Ordering::Acquire)
    }

    /// Records that the initial font set has loaded.
    ///
    /// Only the first call bumps the epoch. Returns whether it did.
    pub fn mark_stable(&self) -> bool {
        if self.stable.swap(true, Ordering::AcqRel) {
            return false;
        }
        let epoch = self.epoch.bump();
        log::debug!("fonts stable, epoch {epoch}");
        true
    }

    /// Records that a face was added to the font set, and returns the new epoch.
    pub fn font_loaded(&self) -> u64 {
        let epoch = self.epoch.bump();
        log::debug!("font loaded, epoch {epoch}");
        epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_bumps_once() {
        let readiness = FontReadiness::new();
        assert_eq!(readiness.epoch(), 0);
        assert!(readiness.mark_stable(), "first signal bumps");
        assert!(!readiness.mark_stable(), "later signals do not");
        assert_eq!(readiness.epoch(), 1);
        assert!(readiness.is_stable());
    }

    #[test]
    fn every_font_load_bumps() {
        let readiness = FontReadiness::new();
        assert_eq!(readiness.font_loaded(), 1);
        assert_eq!(readiness.font_loaded(), 2);
        readiness.mark_stable();
        assert_eq!(readiness.epoch(), 3);
    }
}
