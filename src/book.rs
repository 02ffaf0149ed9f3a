//! The book record shared by the lookup client, the saved-books store, and the exporter.

use serde::{Deserialize, Serialize};

/// Separator used when a record's authors are flattened into one text field.
pub const AUTHOR_SEPARATOR: &str = ", ";

/// One catalog entry.
///
/// `isbn` is the ISBN-13 of the provider record and identifies the entry
/// inside the saved-books store. `copy_count` is at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub title: String,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    pub isbn: String,
    /// Older snapshots call this field `nbre_exemplaire`.
    #[serde(default = "default_copy_count", alias = "nbre_exemplaire")]
    pub copy_count: u32,
}

fn default_copy_count() -> u32 {
    1
}

impl BookRecord {
    /// Creates a record with a single copy and no optional metadata.
    #[must_use]
    pub fn new(title: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            page_count: 0,
            published_date: None,
            language: None,
            authors: Vec::new(),
            publisher: None,
            isbn: isbn.into(),
            copy_count: 1,
        }
    }

    /// Authors flattened in stored order, joined with [`AUTHOR_SEPARATOR`].
    #[must_use]
    pub fn authors_joined(&self) -> String {
        self.authors.join(AUTHOR_SEPARATOR)
    }
}
