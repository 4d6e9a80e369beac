// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface provider implementations.

#[cfg(feature = "tiny_skia")]
pub mod tiny_skia;
