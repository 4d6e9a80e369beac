// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renders a rich-text fragment to a PNG file with the Tiny-Skia surface provider.
//!
//! Usage: `tiny_skia_stamp <font file> [text]`. The font is used for every family and style.
//! The image is written to `demos/_output/tiny_skia_stamp.png`.

use std::sync::{Arc, Mutex};

use textstamp::renderers::tiny_skia::{FaceKey, TinySkiaProvider};
use textstamp::style::{FontFamily, FontSize, RenderOptions};
use textstamp::{BitmapHandle, ContextOptions, RenderContext};

const SAMPLE: &str = "**Textstamp** renders *rich* text with ==highlights==, `code` and \
[links](https://example.com) -> right into a bitmap.\n---\n```rust\nfn main() {\n    \
println!(\"hello\");\n}\n```\n[x] wraps long lines\n[ ] handles Antidisestablishmentarianism";

fn main() {
    let mut args = std::env::args().skip(1);
    let font_path = args
        .next()
        .expect("usage: tiny_skia_stamp <font file> [text]");
    let text = args.next().unwrap_or_else(|| SAMPLE.to_owned());
    let font = std::fs::read(&font_path).expect("font file is readable");

    let provider = TinySkiaProvider::new();
    for family in [
        FontFamily::Draw,
        FontFamily::Sans,
        FontFamily::Serif,
        FontFamily::Mono,
    ] {
        assert!(
            provider
                .fonts()
                .register(FaceKey::regular(family), font.clone()),
            "{font_path} is not a font"
        );
    }

    let cx = RenderContext::new(provider, ContextOptions::default());
    cx.mark_fonts_stable();

    let mut options = RenderOptions::new(text, 360.0, 320.0);
    options.font_size = FontSize::Medium;
    options.pixel_density = 2.0;

    let result: Arc<Mutex<Option<BitmapHandle>>> = Arc::default();
    let slot = Arc::clone(&result);
    cx.request_options(options, move |bitmap| {
        *slot.lock().unwrap() = bitmap;
    });
    cx.wait_idle();

    let bitmap = result
        .lock()
        .unwrap()
        .take()
        .expect("fragment renders");

    let output_path = {
        let path = std::path::PathBuf::from(file!());
        let mut path = std::fs::canonicalize(path).unwrap();
        path.pop();
        path.pop();
        path.pop();
        path.push("_output");
        let _ = std::fs::create_dir(path.clone());
        path.push("tiny_skia_stamp.png");
        path
    };
    std::fs::write(&output_path, bitmap.bitmap().data.data()).unwrap();
}
