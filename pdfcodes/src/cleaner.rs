//! Code normalization.
//!
//! A raw match such as `"mia-000 123"` becomes the canonical code
//! `"MIA000123"`: upper-cased, with every whitespace, hyphen and underscore
//! removed wherever it occurs. Map keys and equality use this form only.

use regex::Regex;
use std::sync::LazyLock;

/// Characters stripped from a raw match.
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_-]").unwrap());

/// Canonicalizes a raw matched substring into a code.
///
/// # Arguments
///
/// * `raw` - The matched substring, as found in a file name or page text.
///
/// # Returns
///
/// The canonical code. The function is total and idempotent.
pub fn normalize_code(raw: &str) -> String {
    let upper = raw.to_uppercase();
    SEPARATORS.replace_all(&upper, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_separators_anywhere() {
        assert_eq!(normalize_code("MIA-000123"), "MIA000123");
        assert_eq!(normalize_code("mia_000_123"), "MIA000123");
        assert_eq!(normalize_code(" ab 12-3_x "), "AB123X");
        assert_eq!(normalize_code("ab\t12\n3"), "AB123");
    }

    #[test]
    fn test_normalize_is_total() {
        assert_eq!(normalize_code(""), "");
        assert_eq!(normalize_code("- _"), "");
        assert_eq!(normalize_code("código-7"), "CÓDIGO7");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["MIA-000123", "ab 12-3_x", "straße_9", "", "ǅ-1", "x\u{00a0}1"] {
            let once = normalize_code(raw);
            assert_eq!(normalize_code(&once), once, "not idempotent for {:?}", raw);
        }
    }
}
