//! Bookshelf Core Library
//!
//! Looks books up by ISBN in an external catalog, keeps a personal list of
//! saved books with copy counting, exports that list to a spreadsheet, and
//! serves a small HTTP API that persists books to `SQLite`.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`book`] - The book record shared by every component
//! - [`catalog`] - External book lookup client
//! - [`store`] - Saved-books store with write-through snapshot persistence
//! - [`export`] - XLSX export of the saved books
//! - [`session`] - Front-end session: preview, confirmations, action state
//! - [`db`] - Database connection and schema management
//! - [`repository`] - Database-backed book persistence
//! - [`server`] - HTTP persistence service

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod book;
pub mod catalog;
pub mod db;
pub mod export;
pub mod repository;
pub mod server;
pub mod session;
pub mod store;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use book::BookRecord;
pub use catalog::{CatalogSource, GoogleBooksClient, HttpTimeouts, LookupError, LookupOutcome};
pub use db::{Database, DatabaseOptions, DbError};
pub use export::{DEFAULT_EXPORT_FILE_NAME, ExportError, ExportSummary, XLSX_MIME_TYPE};
pub use repository::{BookRepository, RepositoryError, SqliteBookRepository, StoredBook};
pub use server::{ServerState, router, serve};
pub use session::{ActionKind, ActionState, Notice, Session, SessionError};
pub use store::{
    JsonFileSnapshot, MemorySnapshot, PendingAction, SnapshotError, SnapshotStore, Store,
    StoreError, StoreOutcome,
};
