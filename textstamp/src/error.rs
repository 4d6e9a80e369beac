// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Error produced by the render pipeline.
///
/// Render errors never reach listeners: the render queue logs them and delivers an empty
/// result, and the host falls back to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    /// The non-exhaustive category describing this error.
    kind: ErrorKind,

    /// Requested surface width in device pixels.
    width: u32,

    /// Requested surface height in device pixels.
    height: u32,
}

impl RenderError {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The requested surface width in device pixels. Zero for [`ErrorKind::EmptyBox`].
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The requested surface height in device pixels. Zero for [`ErrorKind::EmptyBox`].
    pub fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn empty_box() -> Self {
        Self {
            kind: ErrorKind::EmptyBox,
            width: 0,
            height: 0,
        }
    }

    /// Creates an error for a surface that could not be allocated.
    pub fn surface_unavailable(width: u32, height: u32) -> Self {
        Self {
            kind: ErrorKind::SurfaceUnavailable,
            width,
            height,
        }
    }

    /// Creates an error for a surface that could not be encoded.
    pub fn encode_failed(width: u32, height: u32) -> Self {
        Self {
            kind: ErrorKind::EncodeFailed,
            width,
            height,
        }
    }
}

impl core::fmt::Display for RenderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::EmptyBox => write!(f, "fragment box has no area"),
            ErrorKind::SurfaceUnavailable => write!(
                f,
                "no {}x{} surface could be allocated",
                self.width, self.height
            ),
            ErrorKind::EncodeFailed => {
                write!(f, "failed to encode {}x{} surface", self.width, self.height)
            }
        }
    }
}

impl core::error::Error for RenderError {}

/// The non-exhaustive category of a [`RenderError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The fragment box has a zero, negative or non-finite width or height.
    EmptyBox,

    /// The platform could not provide a surface, for example in a headless context.
    SurfaceUnavailable,

    /// The finished surface could not be encoded.
    EncodeFailed,
}
