//! Semantic formatting of assistant replies.
//!
//! [`format`] turns the decoded reply text into a [`FormattedMessage`]: a content
//! category for the header, and one [`Segment`] per line with bold spans, numbered-list
//! structure and highlighted legal terms.  The output is plain data; rendering is the
//! job of a [`Renderer`](crate::Renderer).
//!
//! The pipeline is:
//!
//! 1. strip citation markers (`【22:0†source】`) from the content;
//! 2. classify the *original* content;
//! 3. split the cleaned content on the escaped newline `\n`;
//! 4. detect numbered-list items;
//! 5. split each line into bold spans and highlight legal terms.
//!
//! Formatting is total: every input, including the empty string, produces a message.

mod category;
mod references;
mod segment;
mod spans;
mod terms;

use serde::Serialize;

pub use category::{ContentCategory, Icon, classify};
pub use references::{has_references, strip_references};
pub use segment::{
    ESCAPED_NEWLINE, REVEAL_DELAY_STEP_MS, Segment, is_list_item, segment_lines,
    split_list_item,
};
pub use spans::{
    BOLD_MARKER, InlineSpan, build_spans, build_spans_with, plain_text_of, source_text_of,
};
pub use terms::{LEGAL_TERM_TOOLTIP, LEGAL_TERMS, TermHighlighter, highlight};

/// A formatted assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedMessage {
    /// Category of the reply.
    pub category: ContentCategory,
    /// One segment per line of the cleaned text.
    pub segments: Vec<Segment>,
    /// The reply with citation markers removed; this is what "copy" puts on the
    /// clipboard.
    pub cleaned_text: String,
}

impl FormattedMessage {
    /// Header label for the reply's category.
    pub fn label(&self) -> &'static str {
        self.category.label()
    }

    /// Header icon for the reply's category.
    pub fn icon(&self) -> Icon {
        self.category.icon()
    }

    /// Visible text of every segment joined with the escaped newline.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(Segment::plain_text)
            .collect::<Vec<_>>()
            .join(ESCAPED_NEWLINE)
    }
}

/// Formats `content` with the shared legal-term highlighter.
pub fn format(content: &str) -> FormattedMessage {
    format_with(content, TermHighlighter::legal())
}

/// Formats `content` highlighting the vocabulary of `highlighter`.
pub fn format_with(content: &str, highlighter: &TermHighlighter) -> FormattedMessage {
    let cleaned_text = strip_references(content);
    let category = classify(content);
    let segments = segment_lines(&cleaned_text)
        .enumerate()
        .map(|(index, line)| Segment::from_line(index, line, highlighter))
        .collect();
    FormattedMessage {
        category,
        segments,
        cleaned_text,
    }
}

/// Returns true if `content` benefits from formatting.
///
/// Replies with escaped newlines, bold markers, citation markers, or a leading
/// numbered-list item are formatted; anything else is shown verbatim.
pub fn needs_formatting(content: &str) -> bool {
    content.contains(ESCAPED_NEWLINE)
        || content.contains(BOLD_MARKER)
        || content.contains('【')
        || segment_lines(content).next().is_some_and(is_list_item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_full_reply() {
        let content = "Según el **Reglamento**【3:1†ley.pdf】:\\n1. Revise las bases\\n2. Presente la garantía";
        let formatted = format(content);
        assert_eq!(formatted.category, ContentCategory::LegalNorm);
        assert_eq!(formatted.label(), "Normativa Legal");
        assert_eq!(formatted.icon(), Icon::Book);
        assert_eq!(
            formatted.cleaned_text,
            "Según el **Reglamento**:\\n1. Revise las bases\\n2. Presente la garantía"
        );
        assert_eq!(formatted.segments.len(), 3);
        assert_eq!(
            formatted.segments[0],
            Segment::Paragraph {
                spans: vec![
                    InlineSpan::plain("Según el "),
                    InlineSpan::bold(vec![InlineSpan::plain("Reglamento")]),
                    InlineSpan::plain(":"),
                ],
                reveal_delay_ms: 0,
            }
        );
        assert_eq!(
            formatted.segments[1],
            Segment::ListItem {
                ordinal: "1.".to_string(),
                spans: vec![
                    InlineSpan::plain("Revise las "),
                    InlineSpan::term("bases", LEGAL_TERM_TOOLTIP),
                ],
            }
        );
        assert!(formatted.segments[2].is_list_item());
    }

    #[test]
    fn classification_sees_stripped_markers() {
        let formatted = format("Texto【1:2†Ley de contrataciones】");
        assert_eq!(formatted.category, ContentCategory::LegalNorm);
        assert_eq!(formatted.cleaned_text, "Texto");
    }

    #[test]
    fn paragraph_delays_follow_line_index() {
        let formatted = format("a\\n1. b\\nc");
        let delays: Vec<Option<u64>> = formatted
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Paragraph {
                    reveal_delay_ms, ..
                } => Some(*reveal_delay_ms),
                Segment::ListItem { .. } => None,
            })
            .collect();
        assert_eq!(delays, vec![Some(0), None, Some(100)]);
    }

    #[test]
    fn plain_text_matches_cleaned_text_without_markup() {
        let content = "La **entidad** debe【1:1†x】 publicar\\n1. Las bases\\n\\nFin";
        let formatted = format(content);
        assert_eq!(
            formatted.plain_text(),
            "La entidad debe publicar\\n1. Las bases\\n\\nFin"
        );
    }

    #[test]
    fn empty_content() {
        let formatted = format("");
        assert_eq!(formatted.category, ContentCategory::Informational);
        assert_eq!(
            formatted.segments,
            vec![Segment::Paragraph {
                spans: vec![InlineSpan::plain("")],
                reveal_delay_ms: 0,
            }]
        );
        assert_eq!(formatted.cleaned_text, "");
    }

    #[test]
    fn custom_highlighter() {
        let highlighter = TermHighlighter::new(["impugnación"]).unwrap();
        let formatted = format_with("Plazo de impugnación de la obra", &highlighter);
        assert_eq!(
            formatted.segments[0].spans(),
            &[
                InlineSpan::plain("Plazo de "),
                InlineSpan::term("impugnación", LEGAL_TERM_TOOLTIP),
                InlineSpan::plain(" de la obra"),
            ]
        );
    }

    #[test]
    fn needs_formatting_rules() {
        assert!(needs_formatting("uno\\ndos"));
        assert!(needs_formatting("con **negrita**"));
        assert!(needs_formatting("ver【1:1†a】"));
        assert!(needs_formatting("1. Primer paso"));
        assert!(!needs_formatting("Hola, ¿en qué puedo ayudarte?"));
        assert!(!needs_formatting("Paso 1. Revisar"));
        assert!(!needs_formatting(""));
    }
}
