// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt::{Display, Formatter, Write as _};
use core::hash::BuildHasher;
use std::sync::Arc;

use foldhash::fast::FixedState;

use crate::style::RenderOptions;

/// Seed of the text hash. Fixed, so that keys are stable across runs.
const TEXT_HASH_SEED: u64 = 0x7465_7874_7374_616d;

/// A fingerprint of everything that affects the pixels of a rendered fragment.
///
/// Two renders with equal keys produce identical bitmaps. The key is a pure function of the
/// [`RenderOptions`] and the font epoch. The text enters it through its length and a fast,
/// non-cryptographic hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(Arc<str>);

impl CacheKey {
    /// Computes the key of `options` rendered during font epoch `epoch`.
    pub fn new(options: &RenderOptions, epoch: u64) -> Self {
        let color = options.color.to_rgba8();
        let mut key = String::with_capacity(96);
        // Writing to a String cannot fail.
        let _ = write!(
            key,
            "e{epoch}|{:.2}x{:.2}|r{}|d{}|{}|{}|{}|{}|#{:02x}{:02x}{:02x}{:02x}|{}:{:016x}",
            options.width,
            options.height,
            options.render_scale,
            options.pixel_density,
            options.align.as_str(),
            options.font_family.as_str(),
            options.font_size.as_str(),
            options.text_style.as_str(),
            color.r,
            color.g,
            color.b,
            color.a,
            options.text.len(),
            text_hash(&options.text),
        );
        Self(key.into())
    }

    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

fn text_hash(text: &str) -> u64 {
    FixedState::with_seed(TEXT_HASH_SEED).hash_one(text)
}
