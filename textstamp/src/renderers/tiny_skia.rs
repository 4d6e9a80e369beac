// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface provider implementation using Tiny-Skia, with glyph outlines and metrics from
//! Skrifa.
//!
//! No fonts are bundled. Faces are registered into the provider's [`FontBook`] by the host.
//! Until a face is registered, text is measured with a fixed fallback advance and drawn as
//! nothing, while backgrounds, decorations and rules are still drawn.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;
use peniko::kurbo::{Line, Point, Rect};
use peniko::{Blob, Color, FontData};
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, GlyphId, MetadataProvider};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::error::RenderError;
use crate::style::{FontDescriptor, FontFamily};
use crate::surface::{EncodedBitmap, ImageFormat, Surface, SurfaceProvider, TextMeasurer};

/// Advance of one character, relative to the font size, when no face is registered.
const FALLBACK_ADVANCE: f32 = 0.5;

/// A font family and style.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FaceKey {
    /// Font family.
    pub family: FontFamily,
    /// Whether the face is bold.
    pub bold: bool,
    /// Whether the face is italic.
    pub italic: bool,
}

impl FaceKey {
    /// The regular face of `family`.
    pub const fn regular(family: FontFamily) -> Self {
        Self {
            family,
            bold: false,
            italic: false,
        }
    }

    fn of(font: &FontDescriptor) -> Self {
        Self {
            family: font.family,
            bold: font.bold,
            italic: font.italic,
        }
    }
}

/// The faces available to a [`TinySkiaProvider`].
#[derive(Debug, Default)]
pub struct FontBook {
    faces: Mutex<HashMap<FaceKey, FontData>>,
}

impl FontBook {
    /// Creates an empty font book.
    pub fn new() -> Self {
        Self::default()
    }

    fn faces(&self) -> MutexGuard<'_, HashMap<FaceKey, FontData>> {
        self.faces.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers the first font in `data` as `face`, replacing any face registered before.
    ///
    /// Returns `false` if `data` is not a font. When this returns `true`, the font set has
    /// changed and the host should call [`RenderContext::font_loaded`].
    ///
    /// [`RenderContext::font_loaded`]: crate::RenderContext::font_loaded
    pub fn register(&self, face: FaceKey, data: Vec<u8>) -> bool {
        if let Err(err) = FontRef::from_index(&data, 0) {
            log::warn!("rejected {face:?}: {err}");
            return false;
        }
        let font = FontData::new(Blob::new(Arc::new(data)), 0);
        self.faces().insert(face, font);
        log::debug!("registered {face:?}");
        true
    }

    /// Number of registered faces.
    pub fn len(&self) -> usize {
        self.faces().len()
    }

    /// Whether no face is registered.
    pub fn is_empty(&self) -> bool {
        self.faces().is_empty()
    }

    /// The face to use for `font`.
    ///
    /// Falls back to the regular face of the family, then to any face of the family, then
    /// to the sans-serif family, then to any face at all.
    pub fn resolve(&self, font: &FontDescriptor) -> Option<FontData> {
        let faces = self.faces();
        let exact = FaceKey::of(font);
        faces
            .get(&exact)
            .or_else(|| faces.get(&FaceKey::regular(font.family)))
            .or_else(|| {
                faces
                    .iter()
                    .find(|(key, _)| key.family == font.family)
                    .map(|(_, data)| data)
            })
            .or_else(|| faces.get(&FaceKey::regular(FontFamily::Sans)))
            .or_else(|| faces.values().next())
            .cloned()
    }

    fn advance(&self, font: &FontDescriptor, text: &str) -> f32 {
        let Some(data) = self.resolve(font) else {
            return text.chars().count() as f32 * font.size * FALLBACK_ADVANCE;
        };
        let Ok(font_ref) = FontRef::from_index(data.data.as_ref(), data.index) else {
            return 0.0;
        };
        let charmap = font_ref.charmap();
        let metrics = font_ref.glyph_metrics(Size::new(font.size), LocationRef::default());
        text.chars()
            .map(|ch| {
                let glyph = charmap.map(ch).unwrap_or(GlyphId::NOTDEF);
                metrics.advance_width(glyph).unwrap_or_default()
            })
            .sum()
    }
}

/// A [`SurfaceProvider`] drawing into Tiny-Skia pixmaps and encoding them as PNG.
#[derive(Clone, Debug, Default)]
pub struct TinySkiaProvider {
    fonts: Arc<FontBook>,
}

impl TinySkiaProvider {
    /// Creates a provider with an empty font book.
    pub fn new() -> Self {
        Self::default()
    }

    /// The faces this provider draws with.
    pub fn fonts(&self) -> &Arc<FontBook> {
        &self.fonts
    }
}

impl TextMeasurer for TinySkiaProvider {
    fn measure(&self, font: &FontDescriptor, text: &str) -> f32 {
        self.fonts.advance(font, text)
    }
}

impl SurfaceProvider for TinySkiaProvider {
    type Surface = TinySkiaSurface;

    fn allocate(
        &self,
        width: u32,
        height: u32,
        scale: f32,
    ) -> Result<TinySkiaSurface, RenderError> {
        let pixmap =
            Pixmap::new(width, height).ok_or(RenderError::surface_unavailable(width, height))?;
        Ok(TinySkiaSurface {
            pixmap,
            transform: Transform::from_scale(scale, scale),
            scale,
            fonts: Arc::clone(&self.fonts),
        })
    }

    fn encode(&self, surface: TinySkiaSurface) -> Result<EncodedBitmap, RenderError> {
        let width = surface.pixmap.width();
        let height = surface.pixmap.height();
        let png = surface.pixmap.encode_png().map_err(|err| {
            log::warn!("png encoding failed: {err}");
            RenderError::encode_failed(width, height)
        })?;
        Ok(EncodedBitmap {
            format: ImageFormat::Png,
            width,
            height,
            scale: surface.scale,
            data: Blob::new(Arc::new(png)),
        })
    }
}

/// A surface allocated by a [`TinySkiaProvider`].
#[derive(Debug)]
pub struct TinySkiaSurface {
    pixmap: Pixmap,
    transform: Transform,
    scale: f32,
    fonts: Arc<FontBook>,
}

impl TinySkiaSurface {
    /// The pixels drawn so far.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

fn paint(color: Color) -> Paint<'static> {
    let rgba = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, rgba.a);
    paint
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "surface coordinates fit comfortably in f32"
)]
fn point(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

impl Surface for TinySkiaSurface {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (x0, y0) = point(Point::new(rect.x0, rect.y0));
        let (x1, y1) = point(Point::new(rect.x1, rect.y1));
        if let Some(rect) = tiny_skia::Rect::from_ltrb(x0, y0, x1, y1) {
            self.pixmap
                .fill_rect(rect, &paint(color), self.transform, None);
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "stroke widths are a few pixels"
    )]
    fn stroke_line(&mut self, line: Line, width: f64, color: Color) {
        let (x0, y0) = point(line.p0);
        let (x1, y1) = point(line.p1);
        let mut builder = PathBuilder::new();
        builder.move_to(x0, y0);
        builder.line_to(x1, y1);
        let Some(path) = builder.finish() else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color), &stroke, self.transform, None);
    }

    fn fill_text(&mut self, font: &FontDescriptor, text: &str, origin: Point, color: Color) {
        let Some(data) = self.fonts.resolve(font) else {
            log::warn!("no face registered for {:?}, text not drawn", font.family);
            return;
        };
        let Ok(font_ref) = FontRef::from_index(data.data.as_ref(), data.index) else {
            return;
        };
        let charmap = font_ref.charmap();
        let outlines = font_ref.outline_glyphs();
        let size = Size::new(font.size);
        let metrics = font_ref.glyph_metrics(size, LocationRef::default());

        let (x, y) = point(origin);
        let mut pen = OutlineBuilder::new(x, y);
        for ch in text.chars() {
            let glyph_id = charmap.map(ch).unwrap_or(GlyphId::NOTDEF);
            if let Some(glyph) = outlines.get(glyph_id) {
                let settings = DrawSettings::unhinted(size, LocationRef::default());
                if let Err(err) = glyph.draw(settings, &mut pen) {
                    log::trace!("skipping glyph {glyph_id:?}: {err}");
                }
            }
            pen.x += metrics.advance_width(glyph_id).unwrap_or_default();
        }
        if let Some(path) = pen.path.finish() {
            self.pixmap.fill_path(
                &path,
                &paint(color),
                FillRule::Winding,
                self.transform,
                None,
            );
        }
    }
}

/// Accumulates glyph outlines into one path, flipping them into y-down coordinates around a
/// moving origin.
struct OutlineBuilder {
    x: f32,
    y: f32,
    path: PathBuilder,
}

impl OutlineBuilder {
    fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            path: PathBuilder::new(),
        }
    }
}

impl OutlinePen for OutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to(self.x + x, self.y - y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to(self.x + x, self.y - y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.path
            .quad_to(self.x + cx0, self.y - cy0, self.x + x, self.y - y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path.cubic_to(
            self.x + cx0,
            self.y - cy0,
            self.x + cx1,
            self.y - cy1,
            self.x + x,
            self.y - y,
        );
    }

    fn close(&mut self) {
        self.path.close();
    }
}
