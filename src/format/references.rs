//! Removal of source citation markers such as `【22:0†source】`.

use std::sync::OnceLock;

use regex::Regex;

fn reference_regex() -> &'static Regex {
    static REFERENCE_RE: OnceLock<Regex> = OnceLock::new();
    REFERENCE_RE.get_or_init(|| Regex::new(r"【[0-9]+:[0-9]+†[^】]+】").unwrap())
}

/// Returns true if `text` contains at least one citation marker.
pub fn has_references(text: &str) -> bool {
    reference_regex().is_match(text)
}

/// Removes every citation marker from `text`.
///
/// Removal repeats until no marker is left, so a marker assembled by joining the text
/// around an inner marker is removed as well and the function is idempotent.
pub fn strip_references(text: &str) -> String {
    let re = reference_regex();
    let mut cleaned = re.replace_all(text, "").into_owned();
    while re.is_match(&cleaned) {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    cleaned
}
