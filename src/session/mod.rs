//! Front-end session: the current preview, the saved-books store, and the
//! action state table.
//!
//! Every action returns a typed result; [`SessionError::notice`] turns a
//! failure into the message shown to the user. Nothing here panics or
//! aborts the session.

mod action;

pub use action::{ActionGuard, ActionKind, ActionState, ActionTracker};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, instrument};

use crate::book::BookRecord;
use crate::catalog::{CatalogSource, LookupError, LookupOutcome};
use crate::export::{self, ExportError, ExportSummary};
use crate::store::{Store, StoreError, StoreOutcome};

/// Errors surfaced by session actions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The same action is still in flight.
    #[error("a {0} is already in progress")]
    Busy(ActionKind),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl SessionError {
    /// The notification shown to the user for this failure.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Busy(kind) => Notice::Info(format!("A {kind} is already in progress.")),
            Self::Lookup(LookupError::InvalidIdentifier { .. }) => {
                Notice::Info(format!("{self}"))
            }
            Self::Lookup(LookupError::MalformedRecord { .. }) => Notice::Error(
                "The catalog entry for this ISBN is incomplete.".to_string(),
            ),
            Self::Lookup(_) => Notice::Error(
                "An error occurred while retrieving the book information.".to_string(),
            ),
            Self::Store(StoreError::NothingToSave) => {
                Notice::Info("No book data to save.".to_string())
            }
            Self::Store(StoreError::Snapshot(_)) => {
                Notice::Error("An error occurred while saving the book information.".to_string())
            }
            Self::Store(other) => Notice::Info(other.to_string()),
            Self::Export(_) => Notice::Error(
                "An error occurred while exporting the saved books.".to_string(),
            ),
        }
    }
}

/// A message for the user, informational or an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    /// Message shown when the catalog has no entry for the searched ISBN.
    #[must_use]
    pub fn not_found() -> Self {
        Self::Info("No book found for this ISBN.".to_string())
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info(message) | Self::Error(message) => write!(f, "{message}"),
        }
    }
}

/// One user's session over the catalog and their saved books.
pub struct Session {
    catalog: Arc<dyn CatalogSource>,
    store: Store,
    preview: Option<BookRecord>,
    actions: ActionTracker,
}

impl Session {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogSource>, store: Store) -> Self {
        Self {
            catalog,
            store,
            preview: None,
            actions: ActionTracker::new(),
        }
    }

    /// The last book found by [`Session::search`].
    #[must_use]
    pub fn preview(&self) -> Option<&BookRecord> {
        self.preview.as_ref()
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn actions(&self) -> &ActionTracker {
        &self.actions
    }

    /// Looks up `identifier` and replaces the preview.
    ///
    /// `NotFound` clears the preview; a failed lookup keeps the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] while a lookup is in flight and
    /// [`SessionError::Lookup`] when the lookup fails.
    #[instrument(skip(self), fields(catalog = self.catalog.name()))]
    pub async fn search(&mut self, identifier: &str) -> Result<LookupOutcome, SessionError> {
        let guard = self.actions.begin(ActionKind::Lookup)?;
        let result = self.catalog.lookup(identifier).await;
        guard.finish(&result);

        match result {
            Ok(LookupOutcome::Found(book)) => {
                info!(isbn = %book.isbn, title = %book.title, "Book found");
                self.preview = Some(book.clone());
                Ok(LookupOutcome::Found(book))
            }
            Ok(LookupOutcome::NotFound) => {
                info!(identifier, "No book found");
                self.preview = None;
                Ok(LookupOutcome::NotFound)
            }
            Err(e) => {
                error!(error = %e, "Error fetching book info");
                Err(e.into())
            }
        }
    }

    /// Saves the preview into the store.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] with [`StoreError::NothingToSave`]
    /// when there is no preview, or any other store error.
    pub fn save(&mut self) -> Result<StoreOutcome, SessionError> {
        self.store
            .reconcile(self.preview.clone())
            .map_err(|e| log_store_error("save", e))
    }

    /// Requests removal of a saved book.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] for unknown isbns or a pending confirmation.
    pub fn remove(&mut self, isbn: &str) -> Result<StoreOutcome, SessionError> {
        self.store
            .remove(isbn)
            .map_err(|e| log_store_error("remove", e))
    }

    /// Requests clearing the saved books.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] while another confirmation is pending.
    pub fn clear(&mut self) -> Result<StoreOutcome, SessionError> {
        self.store.clear().map_err(|e| log_store_error("clear", e))
    }

    /// Answers the pending confirmation with yes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] when nothing is pending or the write fails.
    pub fn confirm(&mut self) -> Result<StoreOutcome, SessionError> {
        self.store
            .confirm()
            .map_err(|e| log_store_error("confirm", e))
    }

    /// Answers the pending confirmation with no.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] when nothing is pending.
    pub fn cancel(&mut self) -> Result<StoreOutcome, SessionError> {
        self.store.cancel().map_err(|e| log_store_error("cancel", e))
    }

    /// Writes the saved books to an XLSX file at `path`.
    ///
    /// Serialization runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] while an export is in flight and
    /// [`SessionError::Export`] when the workbook cannot be built or written.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn export(&mut self, path: PathBuf) -> Result<ExportSummary, SessionError> {
        let guard = self.actions.begin(ActionKind::Export)?;
        let books = self.store.books().to_vec();

        let result = tokio::task::spawn_blocking(move || export::write_workbook(&path, &books))
            .await
            .unwrap_or_else(|join_error| {
                Err(ExportError::Aborted {
                    message: join_error.to_string(),
                })
            });
        guard.finish(&result);

        match result {
            Ok(summary) => {
                info!(books = summary.books, bytes = summary.bytes, "Saved books exported");
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Error exporting data to spreadsheet");
                Err(e.into())
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("catalog", &self.catalog.name())
            .field("store", &self.store)
            .field("preview", &self.preview.as_ref().map(|b| b.isbn.as_str()))
            .finish_non_exhaustive()
    }
}

fn log_store_error(action: &str, e: StoreError) -> SessionError {
    if matches!(e, StoreError::Snapshot(_)) {
        error!(action, error = %e, "Error saving book info");
    }
    e.into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemorySnapshot;
    use async_trait::async_trait;

    struct FixedCatalog(Result<LookupOutcome, LookupError>);

    #[async_trait]
    impl CatalogSource for FixedCatalog {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn lookup(&self, _identifier: &str) -> Result<LookupOutcome, LookupError> {
            self.0.clone()
        }
    }

    fn session_with(outcome: Result<LookupOutcome, LookupError>) -> Session {
        let store = Store::open(Box::new(MemorySnapshot::new())).unwrap();
        Session::new(Arc::new(FixedCatalog(outcome)), store)
    }

    fn sapiens() -> BookRecord {
        let mut book = BookRecord::new("Sapiens", "9780143127741");
        book.page_count = 443;
        book
    }

    #[tokio::test]
    async fn test_search_found_sets_preview() {
        let mut session = session_with(Ok(LookupOutcome::Found(sapiens())));
        let outcome = session.search("9780143127741").await.unwrap();

        assert!(matches!(outcome, LookupOutcome::Found(_)));
        assert_eq!(session.preview().unwrap().title, "Sapiens");
        assert_eq!(session.actions().state(ActionKind::Lookup), ActionState::Done);
    }

    #[tokio::test]
    async fn test_search_not_found_clears_preview_and_store_untouched() {
        let mut session = session_with(Ok(LookupOutcome::NotFound));
        session.preview = Some(sapiens());

        let outcome = session.search("9780000000002").await.unwrap();

        assert_eq!(outcome, LookupOutcome::NotFound);
        assert!(session.preview().is_none());
        assert!(session.store().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_keeps_preview_and_marks_failed() {
        let mut session = session_with(Err(LookupError::failed("9780143127741", "offline")));
        session.preview = Some(sapiens());

        let err = session.search("9780143127741").await.unwrap_err();

        assert!(err.notice().is_error());
        assert!(session.preview().is_some());
        assert_eq!(session.actions().state(ActionKind::Lookup), ActionState::Failed);
    }

    #[tokio::test]
    async fn test_search_rejected_while_lookup_in_flight() {
        let mut session = session_with(Ok(LookupOutcome::Found(sapiens())));
        let _guard = session.actions().begin(ActionKind::Lookup).unwrap();

        let err = session.search("9780143127741").await.unwrap_err();
        assert!(matches!(err, SessionError::Busy(ActionKind::Lookup)));
        assert!(session.preview().is_none());
    }

    #[tokio::test]
    async fn test_search_malformed_record_has_own_notice() {
        let mut session = session_with(Err(LookupError::malformed(
            "9780143127741",
            "missing title",
        )));

        let err = session.search("9780143127741").await.unwrap_err();

        assert_eq!(
            err.notice(),
            Notice::Error("The catalog entry for this ISBN is incomplete.".to_string())
        );
    }

    #[tokio::test]
    async fn test_export_rejected_while_export_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let mut session = session_with(Ok(LookupOutcome::NotFound));
        let _guard = session.actions().begin(ActionKind::Export).unwrap();

        let err = session.export(path.clone()).await.unwrap_err();

        assert!(matches!(err, SessionError::Busy(ActionKind::Export)));
        assert!(!err.notice().is_error());
        assert!(!path.exists());
        assert_eq!(session.actions().state(ActionKind::Export), ActionState::InFlight);
    }

    #[test]
    fn test_save_without_preview_is_informational() {
        let mut session = session_with(Ok(LookupOutcome::NotFound));
        let err = session.save().unwrap_err();
        assert_eq!(err.notice(), Notice::Info("No book data to save.".to_string()));
    }

    #[tokio::test]
    async fn test_save_twice_with_confirmation_counts_two_copies() {
        let mut session = session_with(Ok(LookupOutcome::Found(sapiens())));
        session.search("9780143127741").await.unwrap();

        session.save().unwrap();
        let second = session.save().unwrap();
        assert!(matches!(second, StoreOutcome::ConfirmationRequired(_)));
        session.confirm().unwrap();

        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().books()[0].copy_count, 2);
    }

    #[tokio::test]
    async fn test_export_writes_file_and_marks_done() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let mut session = session_with(Ok(LookupOutcome::Found(sapiens())));
        session.search("9780143127741").await.unwrap();
        session.save().unwrap();

        let summary = session.export(path.clone()).await.unwrap();

        assert_eq!(summary.books, 1);
        assert!(path.exists());
        assert_eq!(session.actions().state(ActionKind::Export), ActionState::Done);
    }

    #[tokio::test]
    async fn test_export_failure_is_error_notice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.xlsx");
        let mut session = session_with(Ok(LookupOutcome::NotFound));

        let err = session.export(path).await.unwrap_err();

        assert!(matches!(err, SessionError::Export(ExportError::Write { .. })));
        assert!(err.notice().is_error());
        assert_eq!(session.actions().state(ActionKind::Export), ActionState::Failed);
    }

    #[test]
    fn test_notice_display() {
        assert_eq!(Notice::not_found().to_string(), "No book found for this ISBN.");
    }
}
