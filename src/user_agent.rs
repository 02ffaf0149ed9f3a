//! User-Agent string for outbound catalog requests.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/bookshelf";

/// Default User-Agent for catalog requests.
#[must_use]
pub(crate) fn default_catalog_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bookshelf/{version} (book-catalog; +{PROJECT_UA_URL})")
}
