// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style attributes supplied by the host and the options that drive a render.

use core::hash::{Hash, Hasher};
use std::sync::Arc;

use peniko::Color;
use peniko::color::palette::css;

use crate::token::RunKind;

/// Horizontal alignment of lines within the fragment box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Lines start at the left padding.
    #[default]
    Start,
    /// Lines are centered in the box.
    Middle,
    /// Lines end at the right padding.
    End,
}

impl Alignment {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// The font family of a fragment.
///
/// Code spans and code blocks always use [`FontFamily::Mono`], whatever the fragment family.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontFamily {
    /// A handwritten-looking family.
    Draw,
    /// A sans-serif family.
    #[default]
    Sans,
    /// A serif family.
    Serif,
    /// A monospace family.
    Mono,
}

impl FontFamily {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Sans => "sans",
            Self::Serif => "serif",
            Self::Mono => "mono",
        }
    }
}

/// The font size bucket of a fragment.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontSize {
    /// 14px.
    Small,
    /// 18px.
    #[default]
    Medium,
    /// 24px.
    Large,
    /// 32px.
    ExtraLarge,
}

impl FontSize {
    /// The size in logical pixels.
    pub const fn px(self) -> f32 {
        match self {
            Self::Small => 14.0,
            Self::Medium => 18.0,
            Self::Large => 24.0,
            Self::ExtraLarge => 32.0,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "s",
            Self::Medium => "m",
            Self::Large => "l",
            Self::ExtraLarge => "xl",
        }
    }
}

/// The text style applied to the whole fragment.
///
/// Inline markers combine with it: a bold run inside an italic fragment is bold italic.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextStyle {
    /// Regular upright text.
    #[default]
    Normal,
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Bold italic text.
    BoldItalic,
}

impl TextStyle {
    /// Whether the style is bold.
    pub const fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    /// Whether the style is italic.
    pub const fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "n",
            Self::Bold => "b",
            Self::Italic => "i",
            Self::BoldItalic => "bi",
        }
    }
}

/// The exact font used to measure or draw a string.
///
/// This is the key of the measurement cache, so two descriptors compare equal only when
/// their sizes are bit-identical.
#[derive(Copy, Clone, Debug)]
pub struct FontDescriptor {
    /// Font family.
    pub family: FontFamily,
    /// Font size in logical pixels.
    pub size: f32,
    /// Whether a bold face is requested.
    pub bold: bool,
    /// Whether an italic face is requested.
    pub italic: bool,
}

impl FontDescriptor {
    /// Creates a regular, upright descriptor.
    pub const fn new(family: FontFamily, size: f32) -> Self {
        Self {
            family,
            size,
            bold: false,
            italic: false,
        }
    }
}

impl PartialEq for FontDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.size.to_bits() == other.size.to_bits()
            && self.bold == other.bold
            && self.italic == other.italic
    }
}

impl Eq for FontDescriptor {}

impl Hash for FontDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.size.to_bits().hash(state);
        self.bold.hash(state);
        self.italic.hash(state);
    }
}

/// Ratio between the code font size and the fragment font size.
pub(crate) const CODE_FONT_SCALE: f32 = 0.9;

/// Everything that affects the pixels of one rendered fragment.
///
/// Both the rasterizer and the [`CacheKey`](crate::CacheKey) fingerprint are derived from
/// these options, so any field that changes the output must live here.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    /// The raw fragment text.
    pub text: Arc<str>,
    /// Box width in logical pixels.
    pub width: f32,
    /// Box height in logical pixels.
    pub height: f32,
    /// Quality scale from [`quality::render_scale`](crate::quality::render_scale).
    pub render_scale: f32,
    /// Quantized device pixel density.
    pub pixel_density: f32,
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
}

impl RenderOptions {
    /// Creates options with default style, full render scale and a pixel density of 1.
    pub fn new(text: impl Into<Arc<str>>, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            width,
            height,
            render_scale: 1.0,
            pixel_density: 1.0,
            align: Alignment::default(),
            font_family: FontFamily::default(),
            font_size: FontSize::default(),
            text_style: TextStyle::default(),
            color: css::BLACK,
        }
    }

    /// The fragment font size in logical pixels.
    pub fn font_px(&self) -> f32 {
        self.font_size.px()
    }

    /// Resolves the font of a run from its kind and the fragment text style.
    pub fn font_for(&self, kind: RunKind) -> FontDescriptor {
        let size = self.font_px();
        match kind {
            RunKind::Code | RunKind::CodeBlock => {
                FontDescriptor::new(FontFamily::Mono, size * CODE_FONT_SCALE)
            }
            _ => FontDescriptor {
                family: self.font_family,
                size,
                bold: self.text_style.is_bold() || kind == RunKind::Bold,
                italic: self.text_style.is_italic() || kind == RunKind::Italic,
            },
        }
    }
}
