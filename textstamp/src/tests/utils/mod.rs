// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod provider;

pub(crate) use provider::{ADVANCE, DrawOp, RecordingProvider};

use crate::layout::{self, LayoutLine, MeasureCache, MeasureSession};
use crate::style::RenderOptions;
use crate::token::tokenize;
use crate::{ContextOptions, RenderContext};

/// A context over a fresh recording provider with room for `capacity` bitmaps.
pub(crate) fn context(capacity: usize) -> RenderContext<RecordingProvider> {
    RenderContext::new(
        RecordingProvider::new(),
        ContextOptions {
            bitmap_capacity: capacity,
            ..ContextOptions::default()
        },
    )
}

/// Lays out `text` in a box of the given width, measuring with the fixed test advance.
pub(crate) fn layout_text(text: &str, width: f32) -> Vec<LayoutLine> {
    let provider = RecordingProvider::new();
    let options = RenderOptions::new(text, width, 200.0);
    let mut cache = MeasureCache::new(256);
    let mut measure = MeasureSession::new(&mut cache, &provider);
    layout::layout(&tokenize(text), &options, &mut measure)
}

/// The concatenated text of every run on each line.
pub(crate) fn line_texts(lines: &[LayoutLine]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.runs().iter().map(|run| run.text.as_str()).collect())
        .collect()
}
