// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use peniko::Color;
use peniko::color::palette::css;

use crate::context::RenderContext;
use crate::fingerprint::CacheKey;
use crate::quality::Viewport;
use crate::style::{Alignment, FontFamily, FontSize, RenderOptions, TextStyle};
use crate::surface::{BitmapHandle, SurfaceProvider};
use crate::token::plain_text;

/// What the host knows about a text fragment on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentInput {
    /// The raw fragment text.
    pub text: Arc<str>,
    /// Box width in logical pixels.
    pub width: f32,
    /// Box height in logical pixels.
    pub height: f32,
    /// Horizontal alignment.
    pub align: Alignment,
    /// Font family.
    pub font_family: FontFamily,
    /// Font size bucket.
    pub font_size: FontSize,
    /// Fragment text style.
    pub text_style: TextStyle,
    /// Text color.
    pub color: Color,
    /// The viewport the fragment is shown in.
    pub viewport: Viewport,
}

impl FragmentInput {
    /// Creates an input with default style in a viewport at rest at zoom 1.
    pub fn new(text: impl Into<Arc<str>>, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            width,
            height,
            align: Alignment::default(),
            font_family: FontFamily::default(),
            font_size: FontSize::default(),
            text_style: TextStyle::default(),
            color: css::BLACK,
            viewport: Viewport::default(),
        }
    }

    /// The render options for this input, at the quality its viewport calls for.
    pub fn render_options(&self) -> RenderOptions {
        let (render_scale, pixel_density) = self.viewport.quality();
        RenderOptions {
            text: Arc::clone(&self.text),
            width: self.width,
            height: self.height,
            render_scale,
            pixel_density,
            align: self.align,
            font_family: self.font_family,
            font_size: self.font_size,
            text_style: self.text_style,
            color: self.color,
        }
    }
}

/// What a fragment should display.
#[derive(Clone, Debug)]
pub enum FragmentImage {
    /// A rendered bitmap, to be drawn at the box size.
    Bitmap(BitmapHandle),
    /// Unstyled text, shown while no bitmap is available.
    PlainText(String),
}

#[derive(Debug, Default)]
struct BindingState {
    generation: u64,
    bitmap: Option<BitmapHandle>,
}

impl BindingState {
    fn show(&mut self, bitmap: Option<BitmapHandle>) {
        if let Some(old) = core::mem::replace(&mut self.bitmap, bitmap) {
            old.release();
        }
    }
}

/// The display binding of one text fragment.
///
/// The binding owns its own reference to the bitmap it shows, so that the bitmap stays valid
/// when the cache evicts it. While a new bitmap is being rendered, the previous one stays
/// on screen. Results of superseded requests are discarded.
#[derive(Debug, Default)]
pub struct TextFragment {
    state: Arc<Mutex<BindingState>>,
    key: Option<CacheKey>,
    text: Arc<str>,
}

impl TextFragment {
    /// Creates a binding that shows nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BindingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Brings the binding up to date with `input` and returns what to display now.
    ///
    /// If the fragment needs a bitmap that is not cached, a render is requested and
    /// `notify` is called once the binding has changed, usually from the render thread. The
    /// host should then call [`image`](Self::image) again.
    pub fn update<P: SurfaceProvider + Send + Sync + 'static>(
        &mut self,
        cx: &RenderContext<P>,
        input: &FragmentInput,
        notify: impl FnOnce() + Send + 'static,
    ) -> FragmentImage {
        let options = input.render_options();
        let key = cx.key_for(&options);
        if self.key.as_ref() == Some(&key) {
            return self.image();
        }
        self.key = Some(key.clone());
        self.text = Arc::clone(&options.text);

        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.generation
        };
        let state = Arc::clone(&self.state);
        let cached = cx.cached_or_request(key, options, move |result| {
            {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.generation != generation {
                    log::trace!("discarding superseded fragment render");
                    return;
                }
                state.show(result);
            }
            notify();
        });
        if let Some(bitmap) = cached {
            self.lock().show(Some(bitmap));
        }
        self.image()
    }

    /// What to display now: the current bitmap, or the plain text of the fragment.
    pub fn image(&self) -> FragmentImage {
        match self.bitmap() {
            Some(bitmap) => FragmentImage::Bitmap(bitmap),
            None => FragmentImage::PlainText(plain_text(&self.text)),
        }
    }

    /// A new reference to the bitmap currently shown, if any.
    pub fn bitmap(&self) -> Option<BitmapHandle> {
        self.lock().bitmap.clone()
    }

    /// Releases the shown bitmap and forgets the last request.
    ///
    /// Renders still in flight for this binding are discarded when they complete.
    pub fn clear(&mut self) {
        let mut state = self.lock();
        state.generation += 1;
        state.show(None);
        drop(state);
        self.key = None;
    }
}
