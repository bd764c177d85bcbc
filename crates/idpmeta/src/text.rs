//! Language-tagged text elements and value selection.

use serde::Deserialize;

/// One language-tagged text element from a metadata record.
///
/// Both the language tag and the text content are optional in published
/// metadata; elements carrying neither are skipped during selection.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct LocalizedText {
    /// The language tag of this element, e.g. `"en"`.
    #[serde(default)]
    pub lang: Option<String>,

    /// The text content of this element.
    #[serde(default)]
    pub text: Option<String>,
}

/// Select one text value out of a set of language-tagged candidates.
///
/// Scans twice, in element order: first for an element tagged with `lang`
/// that carries text, then for any element that carries text. Many IdPs
/// omit full language coverage, so the second pass guarantees a
/// best-effort value rather than leaving the fact unset. Returns the
/// empty string when no element carries text.
pub fn select_text<'a>(elements: &'a [LocalizedText], lang: &str) -> &'a str {
    for element in elements {
        if element.lang.as_deref() == Some(lang) {
            if let Some(text) = &element.text {
                return text;
            }
        }
    }

    for element in elements {
        if let Some(text) = &element.text {
            return text;
        }
    }

    ""
}
