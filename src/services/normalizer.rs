//! Prompt text normalization
//!
//! Brings free-text prompts (and dataset headers) to a canonical form so
//! keyword matching is insensitive to case, accents and punctuation.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize text to canonical form.
///
/// Transformations:
/// - Lower-case: "TOP" → "top"
/// - Strip accents: "variación" → "variacion"
/// - Punctuation to space: "top-5!" → "top 5"
/// - Collapse whitespace and trim
///
/// # Examples
/// ```
/// use telcoask::services::normalizer::normalize;
///
/// assert_eq!(normalize("Variación"), "variacion");
/// assert_eq!(normalize("  Top   5!!"), "top 5");
/// ```
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
