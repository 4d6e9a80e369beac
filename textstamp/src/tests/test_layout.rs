// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::layout::{LayoutLine, LineMetrics, StyledRun, content_height};
use crate::token::RunKind;

use super::utils::{layout_text, line_texts};

#[test]
fn inline_styles_share_one_line() {
    let lines = layout_text("**bold** and *italic*", 1000.0);
    assert_eq!(
        lines,
        [LayoutLine::Text(vec![
            StyledRun::new("bold", RunKind::Bold),
            StyledRun::new(" and ", RunKind::Text),
            StyledRun::new("italic", RunKind::Italic),
        ])]
    );
}

#[test]
fn adjacent_chunks_of_one_kind_merge() {
    let lines = layout_text("a few words", 1000.0);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].runs().len(), 1, "one run per style");
}

#[test]
fn prose_wraps_on_whitespace() {
    // 50 pixels available: five characters per line.
    assert_eq!(line_texts(&layout_text("aa b cc", 66.0)), ["aa b ", "cc"]);
    assert_eq!(line_texts(&layout_text("aa bbb c", 66.0)), ["aa ", "bbb c"]);
}

#[test]
fn trailing_whitespace_hangs_past_the_edge() {
    assert_eq!(
        line_texts(&layout_text("xx abcde fgh", 66.0)),
        ["xx ", "abcde ", "fgh"]
    );
    assert_eq!(
        line_texts(&layout_text("aa bb cc", 66.0)),
        ["aa bb ", "cc"]
    );
}

#[test]
fn broken_words_keep_whitespace_off_the_next_line() {
    assert_eq!(
        line_texts(&layout_text("abcdefghij fg", 66.0)),
        ["abcde", "fghij ", "fg"]
    );
}

#[test]
fn whitespace_is_dropped_at_wrap() {
    assert_eq!(
        line_texts(&layout_text("abcd  efg", 66.0)),
        ["abcd ", "efg"]
    );
}

#[test]
fn long_words_break_by_character() {
    assert_eq!(
        line_texts(&layout_text("abcdefghijkl", 66.0)),
        ["abcde", "fghij", "kl"]
    );
}

#[test]
fn narrow_boxes_still_terminate() {
    assert_eq!(line_texts(&layout_text("abc", 10.0)), ["a", "b", "c"]);
    assert!(layout_text("", 10.0).is_empty(), "no text, no lines");
}

#[test]
fn no_line_exceeds_the_available_width() {
    let text = "Most words are short. But Antidisestablishmentarianism is long and needs to wrap.";
    for width in [40.0, 66.0, 100.0, 250.0] {
        let available = width - 16.0;
        for line in line_texts(&layout_text(text, width)) {
            let chars = line.trim_end().chars().count();
            assert!(
                chars == 1 || chars as f32 * 10.0 <= available,
                "{line:?} overflows {available}"
            );
            assert!(!line.starts_with(' '), "{line:?} starts with whitespace");
        }
    }
}

#[test]
fn empty_lines_are_kept() {
    assert_eq!(line_texts(&layout_text("a\n\nb", 1000.0)), ["a", "", "b"]);
}

#[test]
fn rules_break_lines() {
    let lines = layout_text("a\n---\nb\n===", 1000.0);
    assert_eq!(
        lines,
        [
            LayoutLine::Text(vec![StyledRun::new("a", RunKind::Text)]),
            LayoutLine::Rule { double: false },
            LayoutLine::Text(vec![StyledRun::new("b", RunKind::Text)]),
            LayoutLine::Rule { double: true },
        ]
    );
}

#[test]
fn overflowing_code_line_continues() {
    // 132 - 2 * 8 padding - 2 * 8 inset leaves room for 10 monospace columns.
    let lines = layout_text("```\nshort\n0123456789abc\nend\n```", 132.0);
    assert_eq!(
        line_texts(&lines),
        ["short", "0123456789", "abc", "end"],
        "three source lines and one continuation"
    );
    let flags: Vec<(bool, bool)> = lines
        .iter()
        .map(|line| match line {
            LayoutLine::CodeBlock {
                is_first, is_last, ..
            } => (*is_first, *is_last),
            other => panic!("expected a code line, got {other:?}"),
        })
        .collect();
    assert_eq!(
        flags,
        [(true, false), (false, false), (false, false), (false, true)]
    );
}

#[test]
fn code_keeps_whitespace_and_empty_lines() {
    let lines = layout_text("```\n  a\n\nb \n```", 1000.0);
    assert_eq!(line_texts(&lines), ["  a", "", "b "]);
}

#[test]
fn code_block_ends_its_line() {
    let lines = layout_text("before\n```\nx\n```\nafter", 1000.0);
    assert_eq!(line_texts(&lines), ["before", "x", "after"]);
    assert!(
        matches!(
            lines[1],
            LayoutLine::CodeBlock {
                is_first: true,
                is_last: true,
                ..
            }
        ),
        "a single code line is both first and last"
    );
}

#[test]
fn blank_lines_next_to_blocks_are_kept() {
    assert_eq!(
        line_texts(&layout_text("a\n\n```\nx\n```\n\nb", 1000.0)),
        ["a", "", "x", "", "b"]
    );
    assert_eq!(
        line_texts(&layout_text("\n```\nx\n```", 1000.0)),
        ["", "x"]
    );
    // Code blocks and rules own the same newlines.
    let code = layout_text("```\nx\n```\n\nb", 1000.0);
    let rule = layout_text("---\n\nb", 1000.0);
    assert_eq!(code.len(), 3);
    assert_eq!(rule.len(), 3);
    assert_eq!(code[1..], rule[1..]);
}

#[test]
fn advances_sum_to_content_height() {
    let metrics = LineMetrics::new(18.0);
    let lines = layout_text("a\n```\nx\n```\n---", 1000.0);
    let expected = metrics.line_height
        + metrics.code_line_height
        + 2.0 * metrics.block_margin
        + metrics.rule_advance;
    let height = content_height(&lines, &metrics);
    assert!(
        (height - expected).abs() < 1e-3,
        "{height} differs from {expected}"
    );
}
