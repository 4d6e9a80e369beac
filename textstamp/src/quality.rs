// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quantization of viewport state into a small set of render qualities.
//!
//! Zoom and pixel density feed the cache key, so they are snapped to coarse steps. Otherwise
//! every frame of a zoom gesture would miss the cache.

/// Snaps a zoom factor to the nearest tenth, never below 0.1.
///
/// Non-finite zooms are treated as 1.
pub fn quantize_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return 1.0;
    }
    ((zoom * 10.0).round() / 10.0).max(0.1)
}

/// Clamps a device pixel density to `[1, 3]` and snaps it to quarter steps.
///
/// Non-finite densities are treated as 1.
pub fn quantize_pixel_density(density: f32) -> f32 {
    if !density.is_finite() {
        return 1.0;
    }
    ((density.clamp(1.0, 3.0) * 4.0).round() / 4.0).clamp(1.0, 3.0)
}

/// The fraction of full resolution to render at.
///
/// While the viewport is moving, fragments render at a coarse scale that is cheap to produce.
/// At rest, the scale follows the zoom so that zoomed-in text stays sharp.
pub fn render_scale(zoom: f32, is_moving: bool) -> f32 {
    if is_moving {
        return if zoom < 0.5 { 0.25 } else { 0.5 };
    }
    if zoom < 0.35 {
        0.5
    } else if zoom < 0.75 {
        0.75
    } else if zoom <= 1.25 {
        1.0
    } else if zoom <= 2.0 {
        1.5
    } else {
        2.0
    }
}

/// The state of the viewport a fragment is displayed in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Canvas zoom factor.
    pub zoom: f32,
    /// Device pixels per CSS pixel.
    pub pixel_density: f32,
    /// Whether the user is panning or zooming.
    pub is_moving: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pixel_density: 1.0,
            is_moving: false,
        }
    }
}

impl Viewport {
    /// The quantized `(render_scale, pixel_density)` to render at.
    pub fn quality(&self) -> (f32, f32) {
        let zoom = quantize_zoom(self.zoom);
        (
            render_scale(zoom, self.is_moving),
            quantize_pixel_density(self.pixel_density),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_snaps_to_tenths() {
        assert_eq!(quantize_zoom(1.04), 1.0);
        assert_eq!(quantize_zoom(0.26), 0.3);
        assert_eq!(quantize_zoom(0.01), 0.1);
        assert_eq!(quantize_zoom(f32::INFINITY), 1.0);
    }

    #[test]
    fn density_snaps_to_quarters() {
        assert_eq!(quantize_pixel_density(1.3), 1.25);
        assert_eq!(quantize_pixel_density(0.5), 1.0);
        assert_eq!(quantize_pixel_density(5.0), 3.0);
        assert_eq!(quantize_pixel_density(f32::NAN), 1.0);
    }

    #[test]
    fn scale_buckets() {
        assert_eq!(render_scale(0.3, false), 0.5);
        assert_eq!(render_scale(0.5, false), 0.75);
        assert_eq!(render_scale(1.0, false), 1.0);
        assert_eq!(render_scale(1.25, false), 1.0);
        assert_eq!(render_scale(2.0, false), 1.5);
        assert_eq!(render_scale(3.0, false), 2.0);
        assert_eq!(render_scale(0.4, true), 0.25);
        assert_eq!(render_scale(4.0, true), 0.5);
    }

    #[test]
    fn viewport_quality() {
        let viewport = Viewport {
            zoom: 1.9,
            pixel_density: 2.1,
            is_moving: false,
        };
        assert_eq!(viewport.quality(), (1.5, 2.0));
    }
}
