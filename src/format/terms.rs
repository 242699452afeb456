//! Legal-term highlighting.

use std::sync::OnceLock;

use regex::Regex;

use super::spans::InlineSpan;
use crate::error::{Error, Result};

/// Domain terms highlighted in assistant replies.
pub const LEGAL_TERMS: &[&str] = &[
    "contratación pública",
    "licitación",
    "adjudicación",
    "OSCE",
    "contratista",
    "entidad",
    "obra",
    "servicio",
    "bien",
    "consultoría",
    "ampliación de plazo",
    "adicional",
    "penalidad",
    "garantía",
    "bases",
    "términos de referencia",
    "expediente técnico",
];

/// Tooltip attached to every highlighted legal term.
pub const LEGAL_TERM_TOOLTIP: &str = "Término legal relevante";

/// Finds occurrences of a fixed vocabulary in text.
///
/// Matching is case-insensitive and bounded by Unicode word boundaries.  The text is
/// scanned once from left to right: the earliest match wins, and among terms matching
/// at the same position the longest one wins.
#[derive(Debug, Clone)]
pub struct TermHighlighter {
    pattern: Option<Regex>,
    tooltip: String,
}

impl TermHighlighter {
    /// Builds a highlighter over `terms` using the default legal tooltip.
    ///
    /// Empty terms are ignored.  An empty vocabulary never matches.
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Ok(Self {
                pattern: None,
                tooltip: LEGAL_TERM_TOOLTIP.to_string(),
            });
        }
        // The regex engine prefers earlier alternatives, so longer terms go first.
        terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        let alternation = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).map_err(|err| {
            Error::validation(
                format!("invalid term list: {err}"),
                Some("terms".to_string()),
            )
        })?;
        Ok(Self {
            pattern: Some(pattern),
            tooltip: LEGAL_TERM_TOOLTIP.to_string(),
        })
    }

    /// The shared highlighter over [`LEGAL_TERMS`].
    pub fn legal() -> &'static TermHighlighter {
        static LEGAL: OnceLock<TermHighlighter> = OnceLock::new();
        LEGAL.get_or_init(|| {
            TermHighlighter::new(LEGAL_TERMS).expect("built-in legal terms form a valid pattern")
        })
    }

    /// Replaces the tooltip attached to highlighted terms.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    /// The tooltip attached to highlighted terms.
    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    /// Splits `text` into plain and term spans.
    ///
    /// Never returns an empty list: text without matches, including empty text, comes
    /// back as a single plain span.
    pub fn highlight(&self, text: &str) -> Vec<InlineSpan> {
        let Some(pattern) = &self.pattern else {
            return vec![InlineSpan::plain(text)];
        };
        let mut spans = Vec::new();
        let mut last = 0;
        for found in pattern.find_iter(text) {
            if found.start() > last {
                spans.push(InlineSpan::plain(&text[last..found.start()]));
            }
            spans.push(InlineSpan::term(found.as_str(), &self.tooltip));
            last = found.end();
        }
        if last < text.len() {
            spans.push(InlineSpan::plain(&text[last..]));
        }
        if spans.is_empty() {
            spans.push(InlineSpan::plain(text));
        }
        spans
    }
}

/// Highlights legal terms in `text` with the shared legal highlighter.
pub fn highlight(text: &str) -> Vec<InlineSpan> {
    TermHighlighter::legal().highlight(text)
}
