// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tokenization of the supported rich text subset.
//!
//! The grammar is deliberately small: fenced code blocks, horizontal rules, and a handful of
//! inline markers. Tokenization is total. Anything that does not parse as markup, including
//! unterminated fences and unmatched markers, is kept as literal text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Fenced code block. Group 1 is the fence line tail (a language tag when followed by a
/// newline), group 2 that newline, group 3 the body.
static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([^`\n]*)(\n?)(.*?)```").expect("valid fence pattern"));

static RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:-{3,}|\*{3,}|_{3,})\s*$").expect("valid rule pattern")
});

static DOUBLE_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*={3,}\s*$").expect("valid double rule pattern"));

/// Inline markers, in priority order. Leftmost match wins, then the first alternative.
static INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\*\*(.+?)\*\*",            // 1: bold
        r"|==(.+?)==",               // 2: highlight
        r"|`([^`]+)`",               // 3: inline code
        r"|\*(.+?)\*",               // 4: italic
        r"|__(.+?)__",               // 5: underline
        r"|_(.+?)_",                 // 6: italic
        r"|~~(.+?)~~",               // 7: strikethrough
        r"|\[([^\]]+)\]\(([^)\s]+)\)", // 8, 9: link text and url
    ))
    .expect("valid inline pattern")
});

/// ASCII shorthands and the glyph they stand for. Longer sequences come first.
const SHORTHANDS: &[(&str, &str)] = &[
    ("<->", "\u{2194}"),
    ("->", "\u{2192}"),
    ("<-", "\u{2190}"),
    ("=>", "\u{21D2}"),
    ("[ ]", "\u{2610}"),
    ("[x]", "\u{2611}"),
    ("[X]", "\u{2611}"),
];

/// A token of fragment text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Plain text.
    Text(String),
    /// `**bold**`
    Bold(String),
    /// `*italic*` or `_italic_`
    Italic(String),
    /// `__underline__`
    Underline(String),
    /// `~~strikethrough~~`
    Strike(String),
    /// `==highlight==`
    Highlight(String),
    /// `` `inline code` ``
    Code(String),
    /// `[text](url)`
    Link {
        /// The visible link text.
        text: String,
        /// The link target. It is not drawn.
        url: String,
    },
    /// The verbatim body of a fenced code block.
    CodeBlock(String),
    /// End of a source line.
    LineBreak,
    /// A horizontal rule (`---`, `***` or `___`).
    Rule,
    /// A heavier, double horizontal rule (`===`).
    DoubleRule,
}

/// The kind of content a drawable run was produced from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RunKind {
    /// Plain text.
    Text,
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
    /// Struck-through text.
    Strike,
    /// Highlighted text.
    Highlight,
    /// Inline code.
    Code,
    /// Link text.
    Link,
    /// Code block text.
    CodeBlock,
}

impl RunKind {
    /// Whether runs of this kind are drawn with the monospace font.
    pub const fn is_code(self) -> bool {
        matches!(self, Self::Code | Self::CodeBlock)
    }
}

impl Token {
    /// The run kind and drawable content of this token, if it carries any.
    pub fn content(&self) -> Option<(RunKind, &str)> {
        let content = match self {
            Self::Text(s) => (RunKind::Text, s),
            Self::Bold(s) => (RunKind::Bold, s),
            Self::Italic(s) => (RunKind::Italic, s),
            Self::Underline(s) => (RunKind::Underline, s),
            Self::Strike(s) => (RunKind::Strike, s),
            Self::Highlight(s) => (RunKind::Highlight, s),
            Self::Code(s) => (RunKind::Code, s),
            Self::Link { text, .. } => (RunKind::Link, text),
            Self::CodeBlock(s) => (RunKind::CodeBlock, s),
            Self::LineBreak | Self::Rule | Self::DoubleRule => return None,
        };
        Some((content.0, content.1.as_str()))
    }
}

/// Splits fragment text into tokens.
///
/// This never fails: malformed markup degrades to [`Token::Text`].
pub fn tokenize(text: &str) -> Vec<Token> {
    let text = text.replace("\r\n", "\n");
    let mut tokens = Vec::new();
    let mut cursor = 0;
    for fence in FENCE.captures_iter(&text) {
        let Some(whole) = fence.get(0) else {
            continue;
        };
        tokenize_prose(&text[cursor..whole.start()], &mut tokens);
        tokens.push(Token::CodeBlock(fence_body(&fence)));
        cursor = whole.end();
    }
    tokenize_prose(&text[cursor..], &mut tokens);
    tokens
}

/// Flattens fragment text into unstyled text, used when no bitmap can be produced.
pub fn plain_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut needs_newline = false;
    for token in tokenize(text) {
        match token {
            Token::LineBreak => {
                out.push('\n');
                needs_newline = false;
            }
            Token::Rule | Token::DoubleRule | Token::CodeBlock(_) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                if let Token::CodeBlock(body) = &token {
                    out.push_str(body);
                }
                needs_newline = true;
            }
            other => {
                if needs_newline {
                    out.push('\n');
                    needs_newline = false;
                }
                if let Some((_, content)) = other.content() {
                    out.push_str(content);
                }
            }
        }
    }
    out
}

fn fence_body(fence: &Captures<'_>) -> String {
    let tail = fence.get(1).map_or("", |m| m.as_str());
    let has_newline = fence.get(2).is_some_and(|m| !m.as_str().is_empty());
    let body = fence.get(3).map_or("", |m| m.as_str());
    let body = body.strip_suffix('\n').unwrap_or(body);
    if has_newline {
        body.to_owned()
    } else {
        // ```like this``` has no language tag.
        [tail, body].concat()
    }
}

fn tokenize_prose(text: &str, tokens: &mut Vec<Token>) {
    if text.is_empty() {
        return;
    }
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            tokens.push(Token::LineBreak);
        }
        if DOUBLE_RULE.is_match(line) {
            tokens.push(Token::DoubleRule);
        } else if RULE.is_match(line) {
            tokens.push(Token::Rule);
        } else {
            tokenize_line(line, tokens);
        }
    }
}

fn tokenize_line(line: &str, tokens: &mut Vec<Token>) {
    let mut cursor = 0;
    for caps in INLINE.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            tokens.push(Token::Text(shorthand(&line[cursor..whole.start()])));
        }
        tokens.push(inline_token(&caps));
        cursor = whole.end();
    }
    if cursor < line.len() {
        tokens.push(Token::Text(shorthand(&line[cursor..])));
    }
}

fn inline_token(caps: &Captures<'_>) -> Token {
    let group = |i: usize| caps.get(i).map(|m| m.as_str());
    if let Some(s) = group(1) {
        Token::Bold(shorthand(s))
    } else if let Some(s) = group(2) {
        Token::Highlight(shorthand(s))
    } else if let Some(s) = group(3) {
        Token::Code(s.to_owned())
    } else if let Some(s) = group(4).or_else(|| group(6)) {
        Token::Italic(shorthand(s))
    } else if let Some(s) = group(5) {
        Token::Underline(shorthand(s))
    } else if let Some(s) = group(7) {
        Token::Strike(shorthand(s))
    } else {
        Token::Link {
            text: shorthand(group(8).unwrap_or_default()),
            url: group(9).unwrap_or_default().to_owned(),
        }
    }
}

fn shorthand(s: &str) -> String {
    let mut out = s.to_owned();
    for (ascii, glyph) in SHORTHANDS {
        if out.contains(ascii) {
            out = out.replace(ascii, glyph);
        }
    }
    out
}
