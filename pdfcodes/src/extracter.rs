use crate::cleaner::normalize_code;
use indexmap::IndexSet;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Content pattern used when the caller supplies none, or one that does not compile:
/// two or more letters, an optional single separator, one or more digits, then any
/// run of letters and digits.
pub const DEFAULT_CODE_PATTERN: &str = r"\b[A-Za-z]{2,}[-_ ]?\d{1,}[A-Za-z0-9]*\b";

/// Structural pattern applied to file names. Not caller-configurable.
const FILENAME_CODE_PATTERN: &str = r"[A-Za-z]{2,}[-_ ]?\d{1,}[A-Za-z0-9]*";

static FILENAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(FILENAME_CODE_PATTERN).case_insensitive(true).build().unwrap()
});

static DEFAULT_CONTENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(DEFAULT_CODE_PATTERN).case_insensitive(true).build().unwrap()
});

/// A content pattern ready for matching.
///
/// # Fields
///
/// * `regex` - The compiled, case-insensitive pattern.
/// * `fallback` - The compilation error message when the caller's pattern was
///   replaced by [`DEFAULT_CODE_PATTERN`].
#[derive(Debug, Clone)]
pub struct ContentPattern {
    pub regex: Regex,
    pub fallback: Option<String>,
}

impl ContentPattern {
    /// Compiles a caller-supplied content pattern.
    ///
    /// Doubled backslashes (as sent by JSON front-ends that escape twice) are
    /// collapsed first. An empty pattern selects the default. A pattern that
    /// fails to compile is replaced by the default and the failure is kept in
    /// `fallback`; this never returns an error.
    ///
    /// # Arguments
    ///
    /// * `pattern` - The pattern as received from the caller.
    pub fn compile(pattern: &str) -> ContentPattern {
        let cleaned = pattern.replace(r"\\", r"\");
        if cleaned.trim().is_empty() {
            return ContentPattern {
                regex: DEFAULT_CONTENT_REGEX.clone(),
                fallback: None,
            };
        }

        match RegexBuilder::new(&cleaned).case_insensitive(true).build() {
            Ok(regex) => ContentPattern {
                regex,
                fallback: None,
            },
            Err(e) => {
                tracing::warn!("Invalid content pattern {:?}: {}. Using default pattern.", pattern, e);
                ContentPattern {
                    regex: DEFAULT_CONTENT_REGEX.clone(),
                    fallback: Some(e.to_string()),
                }
            }
        }
    }
}

impl Default for ContentPattern {
    fn default() -> Self {
        ContentPattern {
            regex: DEFAULT_CONTENT_REGEX.clone(),
            fallback: None,
        }
    }
}

/// Extracts the codes matched by `regex` in `text`.
///
/// Every match is normalized; duplicates collapse onto their first occurrence.
///
/// # Arguments
///
/// * `text` - Text to scan (a file name or the extracted text of one page).
/// * `regex` - The pattern to apply.
///
/// # Returns
///
/// The distinct codes in first-occurrence order.
pub fn extract_codes(text: &str, regex: &Regex) -> Vec<String> {
    let codes: IndexSet<String> =
        regex.find_iter(text).map(|m| normalize_code(m.as_str())).collect();
    codes.into_iter().collect()
}

/// Extracts codes from a file name with the fixed structural pattern.
pub fn extract_filename_codes(filename: &str) -> Vec<String> {
    extract_codes(filename, &FILENAME_REGEX)
}

/// Extracts codes from the text of one page.
pub fn extract_content_codes(page_text: &str, pattern: &ContentPattern) -> Vec<String> {
    extract_codes(page_text, &pattern.regex)
}
