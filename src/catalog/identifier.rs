//! ISBN input normalization.

use std::sync::LazyLock;

use regex::Regex;

use super::LookupError;

/// A bare ISBN-10 (last character may be `X`) or ISBN-13.
#[allow(clippy::expect_used)]
static ISBN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{9}[\dX]|\d{13})$").expect("ISBN regex is valid") // Static pattern, safe to panic
});

/// Normalizes user input into a bare ISBN query string.
///
/// Surrounding whitespace, inner spaces, and hyphens are removed and a
/// trailing `x` is upper-cased, so `978-0-14-312774-1` becomes `9780143127741`.
///
/// # Errors
///
/// Returns [`LookupError::InvalidIdentifier`] when nothing is left after
/// normalization or the result is not a 10/13 character ISBN.
pub fn normalize_isbn(input: &str) -> Result<String, LookupError> {
    let normalized: String = input
        .trim()
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(LookupError::invalid_identifier(input, "identifier is empty"));
    }

    if !ISBN_PATTERN.is_match(&normalized) {
        return Err(LookupError::invalid_identifier(
            input,
            "expected 10 or 13 digits (ISBN-10 may end in X)",
        ));
    }

    Ok(normalized)
}
