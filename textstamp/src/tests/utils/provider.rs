// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A surface provider that records draw calls instead of producing pixels.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use peniko::kurbo::{Line, Point, Rect};
use peniko::{Blob, Color};

use crate::error::RenderError;
use crate::style::FontDescriptor;
use crate::surface::{EncodedBitmap, ImageFormat, Surface, SurfaceProvider, TextMeasurer};

/// Advance of every character, whatever the font.
pub(crate) const ADVANCE: f32 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DrawOp {
    Rect(Rect, Color),
    Line(Line, f64, Color),
    Text(FontDescriptor, String, Point, Color),
}

/// Blocks allocations while closed.
#[derive(Debug, Default)]
struct Gate {
    closed: Mutex<bool>,
    changed: Condvar,
}

impl Gate {
    fn set(&self, closed: bool) {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = closed;
        self.changed.notify_all();
    }

    fn wait(&self) {
        let mut closed = self.closed.lock().unwrap_or_else(PoisonError::into_inner);
        while *closed {
            closed = self
                .changed
                .wait(closed)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingProvider {
    allocations: AtomicUsize,
    fail_allocate: AtomicBool,
    fail_encode: AtomicBool,
    panic_on: Mutex<Option<String>>,
    gate: Gate,
    last_ops: Mutex<Vec<DrawOp>>,
}

impl RecordingProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_allocate(&self, fail: bool) {
        self.fail_allocate.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_encode(&self, fail: bool) {
        self.fail_encode.store(fail, Ordering::SeqCst);
    }

    /// Makes drawing `text` panic.
    pub(crate) fn panic_on(&self, text: &str) {
        *self.panic_on.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_owned());
    }

    /// Holds every render at allocation until [`open`](Self::open).
    pub(crate) fn close(&self) {
        self.gate.set(true);
    }

    pub(crate) fn open(&self) {
        self.gate.set(false);
    }

    /// The draw calls of the last encoded surface.
    pub(crate) fn last_ops(&self) -> Vec<DrawOp> {
        self.last_ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TextMeasurer for RecordingProvider {
    fn measure(&self, _font: &FontDescriptor, text: &str) -> f32 {
        text.chars().count() as f32 * ADVANCE
    }
}

#[derive(Debug)]
pub(crate) struct RecordingSurface {
    width: u32,
    height: u32,
    scale: f32,
    panic_on: Option<String>,
    ops: Vec<DrawOp>,
}

impl Surface for RecordingSurface {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::Rect(rect, color));
    }

    fn stroke_line(&mut self, line: Line, width: f64, color: Color) {
        self.ops.push(DrawOp::Line(line, width, color));
    }

    fn fill_text(&mut self, font: &FontDescriptor, text: &str, origin: Point, color: Color) {
        if self.panic_on.as_deref() == Some(text) {
            panic!("injected panic drawing {text:?}");
        }
        self.ops
            .push(DrawOp::Text(*font, text.to_owned(), origin, color));
    }
}

impl SurfaceProvider for RecordingProvider {
    type Surface = RecordingSurface;

    fn allocate(
        &self,
        width: u32,
        height: u32,
        scale: f32,
    ) -> Result<RecordingSurface, RenderError> {
        self.gate.wait();
        self.allocations.fetch_add(1, Ordering::SeqCst);
        if self.fail_allocate.load(Ordering::SeqCst) {
            return Err(RenderError::surface_unavailable(width, height));
        }
        Ok(RecordingSurface {
            width,
            height,
            scale,
            panic_on: self
                .panic_on
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            ops: Vec::new(),
        })
    }

    fn encode(&self, surface: RecordingSurface) -> Result<EncodedBitmap, RenderError> {
        if self.fail_encode.load(Ordering::SeqCst) {
            return Err(RenderError::encode_failed(surface.width, surface.height));
        }
        let data = format!("{:?}", surface.ops).into_bytes();
        *self.last_ops.lock().unwrap_or_else(PoisonError::into_inner) = surface.ops;
        Ok(EncodedBitmap {
            format: ImageFormat::Native,
            width: surface.width,
            height: surface.height,
            scale: surface.scale,
            data: Blob::new(Arc::new(data)),
        })
    }
}
