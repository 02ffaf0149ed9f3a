//! Error types for catalog lookups.
//!
//! Messages follow the What/Suggestion pattern used across the project.

use thiserror::Error;

/// Errors that can occur while looking up a book in the external catalog.
///
/// "No result" is not an error; see [`super::LookupOutcome::NotFound`].
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The identifier is not usable as an ISBN query.
    #[error("invalid identifier '{input}': {reason}\n  Suggestion: Enter a 10 or 13 digit ISBN")]
    InvalidIdentifier {
        /// The raw input as typed by the user
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Transport, HTTP status, or response parsing failure.
    #[error("lookup failed for '{isbn}': {reason}\n  Suggestion: {suggestion}")]
    Failed {
        /// The identifier that was queried
        isbn: String,
        /// Why the lookup failed
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// The provider returned a result that cannot be turned into a record.
    #[error(
        "malformed catalog record for '{isbn}': {reason}\n  Suggestion: The provider entry is incomplete; try another edition's ISBN"
    )]
    MalformedRecord {
        /// The identifier that was queried
        isbn: String,
        /// What was missing
        reason: String,
    },
}

impl LookupError {
    /// Creates an `InvalidIdentifier` error.
    #[must_use]
    pub fn invalid_identifier(input: &str, reason: &str) -> Self {
        Self::InvalidIdentifier {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `Failed` error with the default network suggestion.
    #[must_use]
    pub fn failed(isbn: &str, reason: &str) -> Self {
        Self::Failed {
            isbn: isbn.to_string(),
            reason: reason.to_string(),
            suggestion: "Check your network connection and try again".to_string(),
        }
    }

    /// Creates a `Failed` error with a custom suggestion.
    #[must_use]
    pub fn failed_with_suggestion(isbn: &str, reason: &str, suggestion: &str) -> Self {
        Self::Failed {
            isbn: isbn.to_string(),
            reason: reason.to_string(),
            suggestion: suggestion.to_string(),
        }
    }

    /// Creates a `MalformedRecord` error.
    #[must_use]
    pub fn malformed(isbn: &str, reason: &str) -> Self {
        Self::MalformedRecord {
            isbn: isbn.to_string(),
            reason: reason.to_string(),
        }
    }
}
