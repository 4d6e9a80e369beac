// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::error::RenderError;
use crate::layout::{self, MeasureCache, MeasureSession};
use crate::raster::rasterize;
use crate::style::RenderOptions;
use crate::surface::{BitmapHandle, SurfaceProvider};
use crate::token::tokenize;

/// Bounds on the size of the rasters the pipeline allocates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RasterLimits {
    /// Upper bound on device pixels per logical pixel.
    ///
    /// This defaults to 3.0.
    pub max_pixel_scale: f32,
    /// Upper bound on either side of a raster, in device pixels.
    ///
    /// This defaults to 4096.
    pub max_raster_dimension: u32,
}

impl Default for RasterLimits {
    fn default() -> Self {
        Self {
            max_pixel_scale: 3.0,
            max_raster_dimension: 4096,
        }
    }
}

/// Device pixels per logical pixel for a render.
///
/// This is `pixel_density * render_scale`, capped at [`RasterLimits::max_pixel_scale`] and
/// shrunk until neither side of the box exceeds [`RasterLimits::max_raster_dimension`].
pub fn effective_pixel_scale(options: &RenderOptions, limits: &RasterLimits) -> f32 {
    let mut scale = options.pixel_density * options.render_scale;
    if !scale.is_finite() || scale <= 0.0 {
        scale = 1.0;
    }
    scale = scale.min(limits.max_pixel_scale);
    let longest = options.width.max(options.height);
    let max_dimension = limits.max_raster_dimension as f32;
    if longest > 0.0 && longest * scale > max_dimension {
        scale = max_dimension / longest;
    }
    scale
}

/// Renders one fragment to an encoded bitmap.
///
/// Measurements are memoized in `measure_cache`, which the caller keeps in sync with the
/// font epoch.
pub fn render<P: SurfaceProvider + ?Sized>(
    provider: &P,
    measure_cache: &mut MeasureCache,
    options: &RenderOptions,
    limits: &RasterLimits,
) -> Result<BitmapHandle, RenderError> {
    if !(options.width > 0.0 && options.height > 0.0) {
        return Err(RenderError::empty_box());
    }
    let scale = effective_pixel_scale(options, limits);
    let (width, height) = device_size(options, scale, limits);
    let mut surface = provider.allocate(width, height, scale)?;

    let tokens = tokenize(&options.text);
    let mut measure = MeasureSession::new(measure_cache, provider);
    let lines = layout::layout(&tokens, options, &mut measure);
    rasterize(&mut surface, &lines, options, &mut measure);

    let bitmap = provider.encode(surface)?;
    Ok(BitmapHandle::new(bitmap))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the values are positive, finite, and clamped to the raster limit"
)]
fn device_size(options: &RenderOptions, scale: f32, limits: &RasterLimits) -> (u32, u32) {
    let side = |logical: f32| {
        ((logical * scale).ceil() as u32).clamp(1, limits.max_raster_dimension.max(1))
    };
    (side(options.width), side(options.height))
}
