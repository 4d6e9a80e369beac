// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rasterization capability supplied by the host platform.

use core::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use peniko::kurbo::{Line, Point, Rect};
use peniko::{Blob, Color};

use crate::RenderError;
use crate::style::FontDescriptor;

/// Measures the advance width of strings.
pub trait TextMeasurer {
    /// The advance width of `text` drawn with `font`, in logical pixels.
    fn measure(&self, font: &FontDescriptor, text: &str) -> f32;
}

/// An off-screen surface that the rasterizer draws onto.
///
/// All coordinates are logical pixels. The surface applies the pixel scale it was
/// allocated with.
pub trait Surface {
    /// Fills an axis-aligned rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Strokes a straight line segment with the given width.
    fn stroke_line(&mut self, line: Line, width: f64, color: Color);

    /// Fills `text` with its left end of the baseline at `origin`.
    fn fill_text(&mut self, font: &FontDescriptor, text: &str, origin: Point, color: Color);
}

/// Allocates surfaces and encodes them into bitmap resources.
pub trait SurfaceProvider: TextMeasurer {
    /// The surface type this provider allocates.
    type Surface: Surface;

    /// Allocates a transparent surface of `width` by `height` device pixels, drawing at
    /// `scale` device pixels per logical pixel.
    fn allocate(&self, width: u32, height: u32, scale: f32) -> Result<Self::Surface, RenderError>;

    /// Encodes a finished surface.
    fn encode(&self, surface: Self::Surface) -> Result<EncodedBitmap, RenderError>;
}

/// The encoding of an [`EncodedBitmap`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImageFormat {
    /// A PNG file.
    Png,
    /// An encoding private to the surface provider.
    Native,
}

/// An encoded raster produced by a [`SurfaceProvider`].
#[derive(Clone, Debug)]
pub struct EncodedBitmap {
    /// The encoding of `data`.
    pub format: ImageFormat,
    /// Width in device pixels.
    pub width: u32,
    /// Height in device pixels.
    pub height: u32,
    /// Device pixels per logical pixel.
    pub scale: f32,
    /// The encoded bytes.
    pub data: Blob<u8>,
}

/// A reference to an encoded bitmap.
///
/// Every clone is an independent reference. The [`BitmapCache`](crate::BitmapCache) releases
/// its own reference when it evicts or replaces an entry, while a display binding that was
/// handed a clone keeps the bitmap alive for as long as it needs it. The underlying resource
/// is freed when the last reference is released.
#[derive(Clone)]
pub struct BitmapHandle {
    bitmap: Arc<EncodedBitmap>,
}

impl BitmapHandle {
    /// Wraps an encoded bitmap in a new handle.
    pub fn new(bitmap: EncodedBitmap) -> Self {
        Self {
            bitmap: Arc::new(bitmap),
        }
    }

    /// The encoded bitmap.
    pub fn bitmap(&self) -> &EncodedBitmap {
        &self.bitmap
    }

    /// Whether two handles refer to the same bitmap.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bitmap, &other.bitmap)
    }

    /// The number of live references to this bitmap.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.bitmap)
    }

    /// Creates a weak reference that does not keep the bitmap alive.
    pub fn downgrade(&self) -> WeakBitmapHandle {
        WeakBitmapHandle {
            bitmap: Arc::downgrade(&self.bitmap),
        }
    }

    /// Releases this reference.
    pub fn release(self) {
        log::trace!(
            "releasing {}x{} bitmap, {} references left",
            self.bitmap.width,
            self.bitmap.height,
            self.reference_count() - 1
        );
    }
}

impl Debug for BitmapHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BitmapHandle")
            .field("format", &self.bitmap.format)
            .field("width", &self.bitmap.width)
            .field("height", &self.bitmap.height)
            .field("references", &self.reference_count())
            .finish()
    }
}

/// A weak reference to an encoded bitmap.
#[derive(Clone, Debug)]
pub struct WeakBitmapHandle {
    bitmap: Weak<EncodedBitmap>,
}

impl WeakBitmapHandle {
    /// Returns a handle if the bitmap has not been freed yet.
    pub fn upgrade(&self) -> Option<BitmapHandle> {
        self.bitmap.upgrade().map(|bitmap| BitmapHandle { bitmap })
    }

    /// Whether every strong reference has been released.
    pub fn is_released(&self) -> bool {
        self.bitmap.strong_count() == 0
    }
}
