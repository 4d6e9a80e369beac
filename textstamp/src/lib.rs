// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Textstamp rasterizes small rich-text fragments into bitmaps and caches them, so that a
//! pan-and-zoom canvas can repaint many fragments per frame without drawing any text.
//!
//! A fragment is tokenized (a small inline markdown subset plus fenced code blocks and
//! horizontal rules), wrapped into lines, rasterized onto a [`Surface`] and encoded into a
//! [`BitmapHandle`]. Handles are stored in an LRU [`BitmapCache`] keyed by a [`CacheKey`]
//! fingerprint of everything that affects the pixels. Missing bitmaps are produced off the
//! interaction path by a single-worker [`RenderQueue`] that coalesces identical requests.
//!
//! Everything that is shared between fragments lives in a [`RenderContext`]:
//!
//! ```ignore
//! use textstamp::{RenderContext, ContextOptions, TextFragment, FragmentInput};
//!
//! let cx = RenderContext::new(provider, ContextOptions::default());
//! let mut fragment = TextFragment::new();
//! let image = fragment.update(&cx, &input, || request_repaint());
//! ```
//!
//! ## Features
//!
//! - `tiny_skia` (enabled by default): A [`SurfaceProvider`] backed by Tiny-Skia, with glyph
//!   outlines and metrics from Skrifa. See [`renderers::tiny_skia`].

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;
mod context;
mod epoch;
mod error;
mod fingerprint;
mod fragment;
mod pipeline;
mod queue;
mod surface;

pub mod layout;
pub mod quality;
pub mod raster;
pub mod renderers;
pub mod style;
pub mod token;

#[cfg(test)]
mod tests;

pub use peniko;
pub use peniko::Color;
pub use peniko::kurbo;

pub use cache::{BitmapCache, CacheEntry};
pub use context::{ContextOptions, RenderContext};
pub use epoch::{FontEpoch, FontReadiness};
pub use error::{ErrorKind, RenderError};
pub use fingerprint::CacheKey;
pub use fragment::{FragmentImage, FragmentInput, TextFragment};
pub use pipeline::{RasterLimits, effective_pixel_scale, render};
pub use queue::{Listener, QueueTask, RenderQueue};
pub use style::{Alignment, FontDescriptor, FontFamily, FontSize, RenderOptions, TextStyle};
pub use surface::{
    BitmapHandle, EncodedBitmap, ImageFormat, Surface, SurfaceProvider, TextMeasurer,
    WeakBitmapHandle,
};
