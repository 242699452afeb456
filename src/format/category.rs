//! Whole-message content classification.

use serde::Serialize;

/// Broad category of an assistant reply, chosen from keywords in the reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentCategory {
    /// The reply cites legal norms.
    LegalNorm,
    /// The reply contains a warning.
    Warning,
    /// The reply gives advice.
    Advice,
    /// Anything else.
    Informational,
}

/// Icon shown next to the category header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    /// An open book.
    Book,
    /// A warning triangle.
    Triangle,
    /// An information mark.
    Info,
    /// A check mark.
    Check,
}

const LEGAL_NORM_KEYWORDS: &[&str] = &["Reglamento", "Ley", "Directiva"];
const WARNING_KEYWORDS: &[&str] = &["advertencia", "precaución", "atención"];
const ADVICE_KEYWORDS: &[&str] = &["recomendación", "sugerencia", "consejo"];

impl ContentCategory {
    /// Header label displayed above the formatted reply.
    pub fn label(self) -> &'static str {
        match self {
            ContentCategory::LegalNorm => "Normativa Legal",
            ContentCategory::Warning => "Advertencia Importante",
            ContentCategory::Advice => "Recomendación",
            ContentCategory::Informational => "Información",
        }
    }

    /// Icon displayed next to the label.
    pub fn icon(self) -> Icon {
        match self {
            ContentCategory::LegalNorm => Icon::Book,
            ContentCategory::Warning => Icon::Triangle,
            ContentCategory::Advice => Icon::Info,
            ContentCategory::Informational => Icon::Check,
        }
    }

    /// Stable identifier, also used as a style class.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::LegalNorm => "legal-norm",
            ContentCategory::Warning => "warning",
            ContentCategory::Advice => "advice",
            ContentCategory::Informational => "informational",
        }
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `content` by case-sensitive keyword containment.
///
/// Categories are tested in order (legal norm, warning, advice) and the first one with
/// a matching keyword wins; otherwise the content is informational.
pub fn classify(content: &str) -> ContentCategory {
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| content.contains(k));
    if contains_any(LEGAL_NORM_KEYWORDS) {
        ContentCategory::LegalNorm
    } else if contains_any(WARNING_KEYWORDS) {
        ContentCategory::Warning
    } else if contains_any(ADVICE_KEYWORDS) {
        ContentCategory::Advice
    } else {
        ContentCategory::Informational
    }
}
