//! External book lookup.
//!
//! A [`CatalogSource`] turns an identifier typed by the user into a
//! normalized [`BookRecord`]. The production source is
//! [`GoogleBooksClient`]; the trait seam lets the session and the
//! persistence service run against a fake catalog in tests.
//!
//! # Example
//!
//! ```no_run
//! use bookshelf_core::catalog::{CatalogSource, GoogleBooksClient, HttpTimeouts, LookupOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GoogleBooksClient::new(HttpTimeouts::default())?;
//! match client.lookup("9780143127741").await? {
//!     LookupOutcome::Found(book) => println!("{}", book.title),
//!     LookupOutcome::NotFound => println!("no book for this ISBN"),
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod google_books;
mod http_client;
mod identifier;

pub use error::LookupError;
pub use google_books::{DEFAULT_BASE_URL, GoogleBooksClient};
pub use http_client::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts};
pub use identifier::normalize_isbn;

use async_trait::async_trait;

use crate::book::BookRecord;

/// Result of a lookup that reached the catalog and got a well-formed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// First result, normalized, with a single copy.
    Found(BookRecord),
    /// The catalog has no entry for this identifier.
    NotFound,
}

/// A source of book metadata keyed by ISBN.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Looks up one identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidIdentifier`] for unusable input,
    /// [`LookupError::Failed`] for transport/status/parse failures, and
    /// [`LookupError::MalformedRecord`] when the first result lacks an
    /// ISBN-13 or a title.
    async fn lookup(&self, identifier: &str) -> Result<LookupOutcome, LookupError>;
}
