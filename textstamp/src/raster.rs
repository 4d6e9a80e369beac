// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing laid out lines onto a [`Surface`].

use peniko::Color;
use peniko::kurbo::{Line, Point, Rect};

use crate::layout::{
    CODE_BLOCK_INSET, LayoutLine, LineMetrics, MeasureSession, StyledRun, TEXT_PADDING,
    content_height,
};
use crate::style::{Alignment, RenderOptions};
use crate::surface::{Surface, TextMeasurer};
use crate::token::RunKind;

/// Background of highlighted runs.
const HIGHLIGHT_COLOR: Color = Color::from_rgba8(255, 230, 0, 102);

/// Color of link text and its underline.
const LINK_COLOR: Color = Color::from_rgba8(37, 99, 235, 255);

const CODE_CHIP_ALPHA: f32 = 0.1;
const CODE_BAND_ALPHA: f32 = 0.06;
const RULE_ALPHA: f32 = 0.25;

/// Distance between the two strokes of a double rule.
const DOUBLE_RULE_GAP: f64 = 3.0;

/// Draws `lines` onto `surface` in logical coordinates.
///
/// Content is vertically centered in the box, with at least [`TEXT_PADDING`] above it. Lines
/// that start below the bottom of the box are not drawn.
pub fn rasterize<S, M>(
    surface: &mut S,
    lines: &[LayoutLine],
    options: &RenderOptions,
    measure: &mut MeasureSession<'_, M>,
) where
    S: Surface + ?Sized,
    M: TextMeasurer + ?Sized,
{
    let metrics = LineMetrics::new(options.font_px());
    let total = content_height(lines, &metrics);
    let mut y = TEXT_PADDING.max((options.height - total) / 2.0);
    for line in lines {
        if y >= options.height {
            break;
        }
        let advance = line.advance(&metrics);
        match line {
            LayoutLine::Text(runs) => {
                draw_text_line(surface, runs, y, &metrics, options, measure);
            }
            LayoutLine::CodeBlock {
                runs,
                is_first,
                is_last: _,
            } => {
                let band = Rect::new(
                    0.0,
                    f64::from(y),
                    f64::from(options.width),
                    f64::from(y + advance),
                );
                surface.fill_rect(band, options.color.multiply_alpha(CODE_BAND_ALPHA));
                let top = if *is_first {
                    y + metrics.block_margin
                } else {
                    y
                };
                let font = options.font_for(RunKind::CodeBlock);
                let baseline = baseline(top, metrics.code_line_height, font.size);
                for run in runs {
                    if run.text.is_empty() {
                        continue;
                    }
                    surface.fill_text(
                        &font,
                        &run.text,
                        Point::new(
                            f64::from(TEXT_PADDING + CODE_BLOCK_INSET),
                            f64::from(baseline),
                        ),
                        options.color,
                    );
                }
            }
            LayoutLine::Rule { double } => {
                let mid = f64::from(y + advance / 2.0);
                let color = options.color.multiply_alpha(RULE_ALPHA);
                let x0 = f64::from(TEXT_PADDING);
                let x1 = f64::from(options.width - TEXT_PADDING).max(x0);
                if *double {
                    let half = DOUBLE_RULE_GAP / 2.0;
                    surface.stroke_line(Line::new((x0, mid - half), (x1, mid - half)), 1.0, color);
                    surface.stroke_line(Line::new((x0, mid + half), (x1, mid + half)), 1.0, color);
                } else {
                    surface.stroke_line(Line::new((x0, mid), (x1, mid)), 1.0, color);
                }
            }
        }
        y += advance;
    }
}

fn baseline(top: f32, line_height: f32, font_size: f32) -> f32 {
    top + (line_height - font_size) / 2.0 + font_size * 0.8
}

fn draw_text_line<S, M>(
    surface: &mut S,
    runs: &[StyledRun],
    y: f32,
    metrics: &LineMetrics,
    options: &RenderOptions,
    measure: &mut MeasureSession<'_, M>,
) where
    S: Surface + ?Sized,
    M: TextMeasurer + ?Sized,
{
    let widths: Vec<f32> = runs
        .iter()
        .map(|run| measure.width(&options.font_for(run.kind), &run.text))
        .collect();
    // Trailing whitespace does not count when aligning.
    let hanging = match (runs.last(), widths.last()) {
        (Some(run), Some(&width)) if run.text.ends_with(char::is_whitespace) => {
            width - measure.width(&options.font_for(run.kind), run.text.trim_end())
        }
        _ => 0.0,
    };
    let line_width = widths.iter().sum::<f32>() - hanging;
    let mut x = match options.align {
        Alignment::Start => TEXT_PADDING,
        Alignment::Middle => (options.width - line_width) / 2.0,
        Alignment::End => options.width - TEXT_PADDING - line_width,
    };
    let base = baseline(y, metrics.line_height, metrics.font_size);
    for (run, width) in runs.iter().zip(widths) {
        if run.text.is_empty() {
            continue;
        }
        let font = options.font_for(run.kind);
        let x0 = f64::from(x);
        let x1 = f64::from(x + width);
        let color = match run.kind {
            RunKind::Link => LINK_COLOR,
            _ => options.color,
        };
        match run.kind {
            RunKind::Highlight => {
                surface.fill_rect(chip(x0, x1, y, metrics.line_height), HIGHLIGHT_COLOR);
            }
            RunKind::Code => {
                surface.fill_rect(
                    chip(x0, x1, y, metrics.line_height),
                    options.color.multiply_alpha(CODE_CHIP_ALPHA),
                );
            }
            _ => {}
        }
        surface.fill_text(&font, &run.text, Point::new(x0, f64::from(base)), color);

        let thickness = f64::from((font.size / 16.0).max(1.0));
        let decoration = match run.kind {
            RunKind::Underline | RunKind::Link => Some(base + font.size * 0.12),
            RunKind::Strike => Some(base - font.size * 0.3),
            _ => None,
        };
        if let Some(dy) = decoration {
            let dy = f64::from(dy);
            surface.stroke_line(Line::new((x0, dy), (x1, dy)), thickness, color);
        }
        x += width;
    }
}

fn chip(x0: f64, x1: f64, y: f32, line_height: f32) -> Rect {
    let inset = f64::from(line_height) * 0.1;
    Rect::new(
        x0 - 1.0,
        f64::from(y) + inset,
        x1 + 1.0,
        f64::from(y + line_height) - inset,
    )
}
