//! Inline span construction: bold markers and term highlighting.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::terms::TermHighlighter;

/// Marker delimiting bold text.
pub const BOLD_MARKER: &str = "**";

/// A piece of inline formatted text.
///
/// Spans partition the text they were built from; [`InlineSpan::source_text`] puts the
/// original back together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InlineSpan {
    /// Unformatted text.
    Plain {
        /// The text.
        text: String,
    },
    /// Bold text wrapping nested spans.  The `**` delimiters are not stored.
    Bold {
        /// Spans inside the delimiters.
        children: Vec<InlineSpan>,
    },
    /// A highlighted domain term with its tooltip.
    Term {
        /// The matched text, in its original casing.
        text: String,
        /// Tooltip label shown for the term.
        tooltip: String,
    },
}

impl InlineSpan {
    /// Creates a plain span.
    pub fn plain(text: impl Into<String>) -> Self {
        InlineSpan::Plain { text: text.into() }
    }

    /// Creates a bold span.
    pub fn bold(children: Vec<InlineSpan>) -> Self {
        InlineSpan::Bold { children }
    }

    /// Creates a term span.
    pub fn term(text: impl Into<String>, tooltip: impl Into<String>) -> Self {
        InlineSpan::Term {
            text: text.into(),
            tooltip: tooltip.into(),
        }
    }

    /// Appends the visible characters of this span to `out`.
    pub fn write_plain_text(&self, out: &mut String) {
        match self {
            InlineSpan::Plain { text } | InlineSpan::Term { text, .. } => out.push_str(text),
            InlineSpan::Bold { children } => {
                for child in children {
                    child.write_plain_text(out);
                }
            }
        }
    }

    /// The visible characters of this span, without markup.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain_text(&mut out);
        out
    }

    /// The text this span was built from, with bold delimiters restored.
    pub fn source_text(&self) -> String {
        match self {
            InlineSpan::Plain { text } | InlineSpan::Term { text, .. } => text.clone(),
            InlineSpan::Bold { children } => {
                format!("{BOLD_MARKER}{}{BOLD_MARKER}", source_text_of(children))
            }
        }
    }
}

/// Concatenates the visible characters of `spans`.
pub fn plain_text_of(spans: &[InlineSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        span.write_plain_text(&mut out);
    }
    out
}

/// Concatenates the source text of `spans`.
pub fn source_text_of(spans: &[InlineSpan]) -> String {
    spans.iter().map(InlineSpan::source_text).collect()
}

fn bold_regex() -> &'static Regex {
    static BOLD_RE: OnceLock<Regex> = OnceLock::new();
    BOLD_RE.get_or_init(|| Regex::new(r"\*\*.*?\*\*").unwrap())
}

/// Builds inline spans for `text` with the shared legal-term highlighter.
pub fn build_spans(text: &str) -> Vec<InlineSpan> {
    build_spans_with(text, TermHighlighter::legal())
}

/// Builds inline spans for `text`.
///
/// Each non-greedy `**…**` pair becomes a bold span whose inside is term-highlighted;
/// the text around the pairs (stray markers included) is term-highlighted as is.
pub fn build_spans_with(text: &str, highlighter: &TermHighlighter) -> Vec<InlineSpan> {
    if !text.contains(BOLD_MARKER) {
        return highlighter.highlight(text);
    }
    let mut spans = Vec::new();
    let mut last = 0;
    for found in bold_regex().find_iter(text) {
        if found.start() > last {
            spans.extend(highlighter.highlight(&text[last..found.start()]));
        }
        let inner = &found.as_str()[BOLD_MARKER.len()..found.len() - BOLD_MARKER.len()];
        spans.push(InlineSpan::bold(highlighter.highlight(inner)));
        last = found.end();
    }
    if last < text.len() {
        spans.extend(highlighter.highlight(&text[last..]));
    }
    spans
}
