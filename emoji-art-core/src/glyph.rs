//! Grapheme-aware emoji classification.
//!
//! Multi-code-point sequences (ZWJ families, flags, keycaps, skin tones) are
//! common, so every check works on extended grapheme clusters rather than on
//! single `char`s.

use unicode_segmentation::UnicodeSegmentation;

const VARIATION_SELECTOR_16: char = '\u{FE0F}';
const COMBINING_KEYCAP: char = '\u{20E3}';

/// Code points that render as emoji on their own.
fn is_pictographic(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF
            | 0x2300..=0x23FF
            | 0x2600..=0x27BF
            | 0x2900..=0x297F
            | 0x2B00..=0x2BFF
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
    )
}

/// Code points that only become emoji with a presentation selector or keycap.
fn is_text_default_base(c: char) -> bool {
    matches!(c, '#' | '*' | '0'..='9')
        || matches!(
            c as u32,
            0x00A9
                | 0x00AE
                | 0x203C
                | 0x2049
                | 0x2122
                | 0x2139
                | 0x2194..=0x21AA
                | 0x24C2
                | 0x25AA..=0x25FE
        )
}

/// Whether a single grapheme cluster is an emoji.
#[must_use]
pub fn is_emoji_grapheme(grapheme: &str) -> bool {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if is_pictographic(first) {
        return true;
    }
    is_text_default_base(first) && chars.any(|c| c == VARIATION_SELECTOR_16 || c == COMBINING_KEYCAP)
}

/// Whether `text` is exactly one emoji grapheme.
#[must_use]
pub fn is_emoji(text: &str) -> bool {
    let mut graphemes = text.graphemes(true);
    match (graphemes.next(), graphemes.next()) {
        (Some(grapheme), None) => is_emoji_grapheme(grapheme),
        _ => false,
    }
}

/// The first grapheme of `text`, if it is an emoji.
#[must_use]
pub fn first_emoji(text: &str) -> Option<&str> {
    text.graphemes(true).next().filter(|g| is_emoji_grapheme(g))
}

/// Iterate over the emoji graphemes of `text`, dropping everything else.
pub fn emoji_graphemes(text: &str) -> impl Iterator<Item = &str> {
    text.graphemes(true).filter(|g| is_emoji_grapheme(g))
}

/// Keep only the emoji graphemes of `text`.
#[must_use]
pub fn filter_emojis(text: &str) -> String {
    emoji_graphemes(text).collect()
}

/// Graphemes of `text` with repeats removed, keeping first occurrences.
#[must_use]
pub fn unique_graphemes(text: &str) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    text.graphemes(true).filter(|g| seen.insert(*g)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_code_point_emoji() {
        assert!(is_emoji("😀"));
        assert!(is_emoji("🚲"));
        assert!(is_emoji("❤"));
        assert!(is_emoji("⚽"));
    }

    #[test]
    fn test_multi_code_point_sequences() {
        assert!(is_emoji("👨\u{200D}👩\u{200D}👧"));
        assert!(is_emoji("🇺🇸"));
        assert!(is_emoji("👍🏽"));
        assert!(is_emoji("1\u{FE0F}\u{20E3}"));
        assert!(is_emoji("❤\u{FE0F}"));
    }

    #[test]
    fn test_rejects_text() {
        assert!(!is_emoji(""));
        assert!(!is_emoji("a"));
        assert!(!is_emoji("1"));
        assert!(!is_emoji("#"));
        assert!(!is_emoji("©"));
        assert!(!is_emoji("😀😀"));
        assert!(!is_emoji("😀a"));
    }

    #[test]
    fn test_first_emoji() {
        assert_eq!(first_emoji("🐶 dog"), Some("🐶"));
        assert_eq!(first_emoji("dog 🐶"), None);
        assert_eq!(first_emoji(""), None);
    }

    #[test]
    fn test_filter_and_unique() {
        assert_eq!(filter_emojis("a😀b🐶c😀"), "😀🐶😀");
        assert_eq!(unique_graphemes("😀🐶😀🇺🇸🐶"), vec!["😀", "🐶", "🇺🇸"]);
    }
}
