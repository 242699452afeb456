//! Line segmentation and numbered-list detection.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::spans::{InlineSpan, build_spans_with, plain_text_of};
use super::terms::TermHighlighter;

/// Line separator used by the transport: a backslash followed by `n`.
pub const ESCAPED_NEWLINE: &str = "\\n";

/// Reveal delay per paragraph position, in milliseconds.
pub const REVEAL_DELAY_STEP_MS: u64 = 50;

/// One line of formatted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// A numbered-list item such as `1. Presentar la propuesta`.
    ListItem {
        /// The leading `N.` token.
        ordinal: String,
        /// Spans of the text after the ordinal.
        spans: Vec<InlineSpan>,
    },
    /// Any other line.
    Paragraph {
        /// Spans of the line.
        spans: Vec<InlineSpan>,
        /// Staggered reveal hint: the line index times [`REVEAL_DELAY_STEP_MS`].
        reveal_delay_ms: u64,
    },
}

impl Segment {
    /// Builds the segment for the line at `index`.
    pub fn from_line(index: usize, line: &str, highlighter: &TermHighlighter) -> Self {
        match split_list_item(line) {
            Some((ordinal, content)) => Segment::ListItem {
                ordinal: ordinal.to_string(),
                spans: build_spans_with(content, highlighter),
            },
            None => Segment::Paragraph {
                spans: build_spans_with(line, highlighter),
                reveal_delay_ms: index as u64 * REVEAL_DELAY_STEP_MS,
            },
        }
    }

    /// The inline spans of this segment.
    pub fn spans(&self) -> &[InlineSpan] {
        match self {
            Segment::ListItem { spans, .. } | Segment::Paragraph { spans, .. } => spans,
        }
    }

    /// Returns true for list items.
    pub fn is_list_item(&self) -> bool {
        matches!(self, Segment::ListItem { .. })
    }

    /// The visible text of the segment, with the ordinal and one space for list items.
    pub fn plain_text(&self) -> String {
        match self {
            Segment::ListItem { ordinal, spans } => format!("{ordinal} {}", plain_text_of(spans)),
            Segment::Paragraph { spans, .. } => plain_text_of(spans),
        }
    }
}

fn list_item_regex() -> &'static Regex {
    static LIST_ITEM_RE: OnceLock<Regex> = OnceLock::new();
    LIST_ITEM_RE.get_or_init(|| Regex::new(r"^([0-9]+\.)\s").unwrap())
}

/// Returns true if `line` starts with a numbered-list token (`N.` and whitespace).
pub fn is_list_item(line: &str) -> bool {
    list_item_regex().is_match(line)
}

/// Splits a numbered-list line into its ordinal and the content after the first
/// whitespace character.
pub fn split_list_item(line: &str) -> Option<(&str, &str)> {
    let captures = list_item_regex().captures(line)?;
    let ordinal = captures.get(1)?;
    let whole = captures.get(0)?;
    Some((ordinal.as_str(), &line[whole.end()..]))
}

/// Splits cleaned content into lines on the escaped newline sequence.
pub fn segment_lines(content: &str) -> impl Iterator<Item = &str> {
    content.split(ESCAPED_NEWLINE)
}
