// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line layout.
//!
//! Prose is wrapped on whitespace, falling back to character breaks for words that do not
//! fit on a line of their own. Code blocks are wrapped character by character using the
//! monospace advance and keep all of their whitespace.

mod measure;

pub use measure::{MeasureCache, MeasureSession};

use crate::style::RenderOptions;
use crate::surface::TextMeasurer;
use crate::token::{RunKind, Token};

/// Horizontal padding on each side of the fragment box, and minimum top padding.
pub const TEXT_PADDING: f32 = 8.0;

/// Horizontal inset of code block text inside its band.
pub const CODE_BLOCK_INSET: f32 = 8.0;

/// Extra vertical space above the first and below the last line of a code block.
pub const CODE_BLOCK_MARGIN: f32 = 6.0;

/// A piece of text drawn in a single style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyledRun {
    /// The text of the run.
    pub text: String,
    /// The token kind the text came from.
    pub kind: RunKind,
}

impl StyledRun {
    /// Creates a run.
    pub fn new(text: impl Into<String>, kind: RunKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// A visual line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutLine {
    /// A line of prose.
    Text(Vec<StyledRun>),
    /// A visual line of a code block.
    CodeBlock {
        /// The runs of the line.
        runs: Vec<StyledRun>,
        /// Whether this is the first visual line of the block.
        is_first: bool,
        /// Whether this is the last visual line of the block.
        is_last: bool,
    },
    /// A horizontal rule.
    Rule {
        /// Whether the rule is drawn with two strokes.
        double: bool,
    },
}

/// Vertical metrics derived from the fragment font size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineMetrics {
    /// Fragment font size.
    pub font_size: f32,
    /// Advance of a prose line.
    pub line_height: f32,
    /// Font size of inline code and code blocks.
    pub code_font_size: f32,
    /// Advance of a code block line, margins excluded.
    pub code_line_height: f32,
    /// Advance of a rule line.
    pub rule_advance: f32,
    /// Extra advance of the first and last code block lines.
    pub block_margin: f32,
}

impl LineMetrics {
    /// Metrics for a fragment font size.
    pub fn new(font_size: f32) -> Self {
        let code_font_size = font_size * crate::style::CODE_FONT_SCALE;
        Self {
            font_size,
            line_height: font_size * 1.35,
            code_font_size,
            code_line_height: code_font_size * 1.4,
            rule_advance: font_size * 0.8,
            block_margin: CODE_BLOCK_MARGIN,
        }
    }
}

impl LayoutLine {
    /// The vertical space this line occupies.
    pub fn advance(&self, metrics: &LineMetrics) -> f32 {
        match self {
            Self::Text(_) => metrics.line_height,
            Self::CodeBlock {
                is_first, is_last, ..
            } => {
                let mut advance = metrics.code_line_height;
                if *is_first {
                    advance += metrics.block_margin;
                }
                if *is_last {
                    advance += metrics.block_margin;
                }
                advance
            }
            Self::Rule { .. } => metrics.rule_advance,
        }
    }

    /// The runs of a text or code block line.
    pub fn runs(&self) -> &[StyledRun] {
        match self {
            Self::Text(runs) | Self::CodeBlock { runs, .. } => runs,
            Self::Rule { .. } => &[],
        }
    }
}

/// The total height of a sequence of lines.
pub fn content_height(lines: &[LayoutLine], metrics: &LineMetrics) -> f32 {
    lines.iter().map(|line| line.advance(metrics)).sum()
}

/// The width available to prose lines.
pub fn available_width(options: &RenderOptions) -> f32 {
    (options.width - 2.0 * TEXT_PADDING).max(1.0)
}

/// Breaks tokens into visual lines that fit the fragment box.
pub fn layout<M: TextMeasurer + ?Sized>(
    tokens: &[Token],
    options: &RenderOptions,
    measure: &mut MeasureSession<'_, M>,
) -> Vec<LayoutLine> {
    let mut builder = LineBuilder::new(available_width(options));
    for token in tokens {
        match token {
            Token::LineBreak => builder.line_break(),
            Token::Rule => builder.rule(false),
            Token::DoubleRule => builder.rule(true),
            Token::CodeBlock(body) => builder.code_block(body, options, measure),
            _ => {
                if let Some((kind, content)) = token.content() {
                    builder.prose(kind, content, options, measure);
                }
            }
        }
    }
    builder.finish()
}

struct LineBuilder {
    lines: Vec<LayoutLine>,
    runs: Vec<StyledRun>,
    width: f32,
    available: f32,
    after_block: bool,
}

impl LineBuilder {
    fn new(available: f32) -> Self {
        Self {
            lines: Vec::new(),
            runs: Vec::new(),
            width: 0.0,
            available,
            after_block: false,
        }
    }

    fn push(&mut self, kind: RunKind, text: &str, width: f32) {
        match self.runs.last_mut() {
            Some(run) if run.kind == kind => run.text.push_str(text),
            _ => self.runs.push(StyledRun::new(text, kind)),
        }
        self.width += width;
        self.after_block = false;
    }

    fn end_line(&mut self) {
        self.lines
            .push(LayoutLine::Text(core::mem::take(&mut self.runs)));
        self.width = 0.0;
    }

    fn end_nonempty_line(&mut self) {
        if !self.runs.is_empty() {
            self.end_line();
        }
    }

    fn line_break(&mut self) {
        if self.after_block && self.runs.is_empty() {
            // The block already ended the line.
            self.after_block = false;
        } else {
            self.end_line();
        }
    }

    fn rule(&mut self, double: bool) {
        self.end_nonempty_line();
        self.lines.push(LayoutLine::Rule { double });
        self.after_block = true;
    }

    fn prose<M: TextMeasurer + ?Sized>(
        &mut self,
        kind: RunKind,
        content: &str,
        options: &RenderOptions,
        measure: &mut MeasureSession<'_, M>,
    ) {
        let font = options.font_for(kind);
        for chunk in content.split_inclusive(char::is_whitespace) {
            let width = measure.width(&font, chunk);
            if self.width + width <= self.available {
                self.push(kind, chunk, width);
                continue;
            }
            let word = chunk.trim_end();
            let word_width = measure.width(&font, word);
            if !word.is_empty() && self.width + word_width <= self.available {
                // Trailing whitespace hangs past the edge.
                self.push(kind, chunk, width);
                continue;
            }
            if !self.runs.is_empty() {
                self.end_line();
                if word.is_empty() {
                    continue;
                }
            }
            if word_width <= self.available {
                self.push(kind, chunk, width);
            } else {
                self.break_chunk(kind, chunk, &font, measure);
            }
        }
    }

    /// Places a chunk that is wider than a whole line, as many characters per line as fit.
    ///
    /// Every line takes at least one character, so this always terminates. Whitespace never
    /// starts a line: it hangs past the edge of the line it follows.
    fn break_chunk<M: TextMeasurer + ?Sized>(
        &mut self,
        kind: RunKind,
        chunk: &str,
        font: &crate::style::FontDescriptor,
        measure: &mut MeasureSession<'_, M>,
    ) {
        let mut piece = String::new();
        let mut piece_width = 0.0;
        for ch in chunk.chars() {
            let mut candidate = piece.clone();
            candidate.push(ch);
            let candidate_width = measure.width(font, &candidate);
            let line_is_empty = piece.is_empty() && self.runs.is_empty();
            let overflows = self.width + candidate_width > self.available;
            if overflows && !line_is_empty && !ch.is_whitespace() {
                if !piece.is_empty() {
                    self.push(kind, &piece, piece_width);
                }
                self.end_line();
                piece.clear();
                piece.push(ch);
                piece_width = measure.width(font, &piece);
            } else {
                piece = candidate;
                piece_width = candidate_width;
            }
        }
        if !piece.is_empty() {
            self.push(kind, &piece, piece_width);
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "the column count is a small positive integer"
    )]
    fn code_block<M: TextMeasurer + ?Sized>(
        &mut self,
        body: &str,
        options: &RenderOptions,
        measure: &mut MeasureSession<'_, M>,
    ) {
        self.end_nonempty_line();
        let font = options.font_for(RunKind::CodeBlock);
        let advance = measure.width(&font, "M").max(f32::EPSILON);
        let available = self.available - 2.0 * CODE_BLOCK_INSET;
        let columns = ((available / advance).floor() as usize).max(1);

        let first = self.lines.len();
        for source_line in body.split('\n') {
            let chars: Vec<char> = source_line.chars().collect();
            if chars.is_empty() {
                self.lines.push(code_line(String::new()));
            }
            for row in chars.chunks(columns) {
                self.lines.push(code_line(row.iter().collect()));
            }
        }
        let last = self.lines.len() - 1;
        if let Some(LayoutLine::CodeBlock { is_first, .. }) = self.lines.get_mut(first) {
            *is_first = true;
        }
        if let Some(LayoutLine::CodeBlock { is_last, .. }) = self.lines.get_mut(last) {
            *is_last = true;
        }
        self.after_block = true;
    }

    fn finish(mut self) -> Vec<LayoutLine> {
        self.end_nonempty_line();
        self.lines
    }
}

fn code_line(text: String) -> LayoutLine {
    LayoutLine::CodeBlock {
        runs: vec![StyledRun::new(text, RunKind::CodeBlock)],
        is_first: false,
        is_last: false,
    }
}
