//! Saved-books store: an ordered, isbn-keyed list with write-through persistence.
//!
//! # Overview
//!
//! - [`Store`] - the list, its reconciliation rule, and the confirmation protocol
//! - [`PendingAction`] - a mutation waiting for the user's answer
//! - [`StoreOutcome`] - what an operation did (or what it is waiting for)
//! - [`SnapshotStore`] - the durable slot the list is written through to
//!
//! Confirmation-gated operations ([`Store::reconcile`] on a duplicate,
//! [`Store::remove`], [`Store::clear`]) do not mutate anything; they return
//! [`StoreOutcome::ConfirmationRequired`] and the caller completes them with
//! [`Store::confirm`] or drops them with [`Store::cancel`].
//!
//! # Example
//!
//! ```
//! use bookshelf_core::book::BookRecord;
//! use bookshelf_core::store::{MemorySnapshot, Store, StoreOutcome};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = Store::open(Box::new(MemorySnapshot::new()))?;
//! let book = BookRecord::new("Sapiens", "9780143127741");
//!
//! store.reconcile(Some(book.clone()))?;
//! let outcome = store.reconcile(Some(book))?;
//! assert!(matches!(outcome, StoreOutcome::ConfirmationRequired(_)));
//! store.confirm()?;
//! assert_eq!(store.books()[0].copy_count, 2);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod error;
mod snapshot;

pub use error::{SnapshotError, StoreError};
pub use snapshot::{DEFAULT_SNAPSHOT_FILE, JsonFileSnapshot, MemorySnapshot, SnapshotStore};

use std::fmt;

use tracing::{debug, info, instrument};

use crate::book::BookRecord;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A mutation that needs the user's confirmation before it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Count a duplicate save as one more copy.
    IncrementCopies { isbn: String, title: String },
    /// Delete one saved book.
    Remove { isbn: String, title: String },
    /// Delete every saved book.
    Clear { count: usize },
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncrementCopies { title, .. } => write!(
                f,
                "'{title}' is already saved. Count it as an additional copy?"
            ),
            Self::Remove { title, .. } => write!(f, "Remove '{title}' from saved books?"),
            Self::Clear { count } => write!(f, "Clear all {count} saved books?"),
        }
    }
}

/// What a store operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// A new book was appended at `position`.
    Inserted { isbn: String, position: usize },
    /// Nothing changed yet; answer with [`Store::confirm`] or [`Store::cancel`].
    ConfirmationRequired(PendingAction),
    /// A duplicate save was confirmed.
    CopiesIncremented { isbn: String, copy_count: u32 },
    /// A book was removed.
    Removed(BookRecord),
    /// The store was emptied.
    Cleared { removed: usize },
    /// The pending action was dropped; the store is unchanged.
    Cancelled(PendingAction),
}

/// Ordered saved-books list keyed by isbn.
///
/// Every committed mutation writes the full list through the snapshot slot
/// before the in-memory list is replaced, so a failed write leaves both
/// sides on the previous state.
pub struct Store {
    books: Vec<BookRecord>,
    snapshot: Box<dyn SnapshotStore>,
    pending: Option<PendingAction>,
}

impl Store {
    /// Opens the store, reading the snapshot slot once.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Snapshot`] when the slot cannot be read or is corrupt.
    #[instrument(skip(snapshot), fields(slot = %snapshot.slot()))]
    pub fn open(snapshot: Box<dyn SnapshotStore>) -> Result<Self> {
        let books = snapshot.load()?;
        info!(count = books.len(), "Saved books loaded");
        Ok(Self {
            books,
            snapshot,
            pending: None,
        })
    }

    /// Saved books in insertion order.
    #[must_use]
    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Looks up a saved book by isbn.
    #[must_use]
    pub fn get(&self, isbn: &str) -> Option<&BookRecord> {
        self.position(isbn).map(|index| &self.books[index])
    }

    /// The action waiting for confirmation, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    fn position(&self, isbn: &str) -> Option<usize> {
        self.books.iter().position(|book| book.isbn == isbn)
    }

    fn ensure_no_pending(&self) -> Result<()> {
        match &self.pending {
            Some(action) => Err(StoreError::ConfirmationPending(action.clone())),
            None => Ok(()),
        }
    }

    fn commit(&mut self, next: Vec<BookRecord>) -> Result<()> {
        self.snapshot.save(&next)?;
        self.books = next;
        Ok(())
    }

    /// Saves a looked-up book.
    ///
    /// A new isbn is appended with a copy count of 1. A known isbn returns
    /// [`StoreOutcome::ConfirmationRequired`] with
    /// [`PendingAction::IncrementCopies`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NothingToSave`] for `None`,
    /// [`StoreError::ConfirmationPending`] while another action waits, and
    /// [`StoreError::Snapshot`] when the write-through fails.
    #[instrument(skip(self, candidate), fields(isbn = candidate.as_ref().map(|b| b.isbn.as_str())))]
    pub fn reconcile(&mut self, candidate: Option<BookRecord>) -> Result<StoreOutcome> {
        let Some(mut candidate) = candidate else {
            return Err(StoreError::NothingToSave);
        };
        self.ensure_no_pending()?;

        if let Some(existing) = self.get(&candidate.isbn) {
            let action = PendingAction::IncrementCopies {
                isbn: existing.isbn.clone(),
                title: existing.title.clone(),
            };
            debug!("Duplicate isbn; confirmation required");
            self.pending = Some(action.clone());
            return Ok(StoreOutcome::ConfirmationRequired(action));
        }

        candidate.copy_count = 1;
        let isbn = candidate.isbn.clone();
        let mut next = self.books.clone();
        next.push(candidate);
        let position = next.len() - 1;
        self.commit(next)?;
        info!(isbn = %isbn, position, "Book saved");
        Ok(StoreOutcome::Inserted { isbn, position })
    }

    /// Requests removal of the book with `isbn`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownIsbn`] when no saved book matches and
    /// [`StoreError::ConfirmationPending`] while another action waits.
    #[instrument(skip(self))]
    pub fn remove(&mut self, isbn: &str) -> Result<StoreOutcome> {
        self.ensure_no_pending()?;
        let book = self
            .get(isbn)
            .ok_or_else(|| StoreError::UnknownIsbn(isbn.to_string()))?;
        let action = PendingAction::Remove {
            isbn: book.isbn.clone(),
            title: book.title.clone(),
        };
        self.pending = Some(action.clone());
        Ok(StoreOutcome::ConfirmationRequired(action))
    }

    /// Requests removal of every saved book.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConfirmationPending`] while another action waits.
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> Result<StoreOutcome> {
        self.ensure_no_pending()?;
        let action = PendingAction::Clear {
            count: self.books.len(),
        };
        self.pending = Some(action.clone());
        Ok(StoreOutcome::ConfirmationRequired(action))
    }

    /// Applies the pending action.
    ///
    /// The pending action is consumed even when the write-through fails; the
    /// caller may simply issue the request again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoPendingAction`] when nothing waits,
    /// [`StoreError::UnknownIsbn`] if the target disappeared,
    /// [`StoreError::CopyLimit`] when the copy count cannot grow, and
    /// [`StoreError::Snapshot`] when the write-through fails.
    #[instrument(skip(self))]
    pub fn confirm(&mut self) -> Result<StoreOutcome> {
        let action = self.pending.take().ok_or(StoreError::NoPendingAction)?;

        match action {
            PendingAction::IncrementCopies { isbn, .. } => {
                let index = self
                    .position(&isbn)
                    .ok_or_else(|| StoreError::UnknownIsbn(isbn.clone()))?;
                let mut next = self.books.clone();
                let book = &mut next[index];
                let copy_count = book
                    .copy_count
                    .checked_add(1)
                    .ok_or_else(|| StoreError::CopyLimit(isbn.clone()))?;
                book.copy_count = copy_count;
                self.commit(next)?;
                info!(isbn = %isbn, copy_count, "Copy count incremented");
                Ok(StoreOutcome::CopiesIncremented { isbn, copy_count })
            }
            PendingAction::Remove { isbn, .. } => {
                let index = self
                    .position(&isbn)
                    .ok_or_else(|| StoreError::UnknownIsbn(isbn.clone()))?;
                let mut next = self.books.clone();
                let removed = next.remove(index);
                self.commit(next)?;
                info!(isbn = %isbn, "Book removed");
                Ok(StoreOutcome::Removed(removed))
            }
            PendingAction::Clear { .. } => {
                let removed = self.books.len();
                self.commit(Vec::new())?;
                info!(removed, "Saved books cleared");
                Ok(StoreOutcome::Cleared { removed })
            }
        }
    }

    /// Drops the pending action without changing anything.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoPendingAction`] when nothing waits.
    pub fn cancel(&mut self) -> Result<StoreOutcome> {
        let action = self.pending.take().ok_or(StoreError::NoPendingAction)?;
        debug!(%action, "Pending action cancelled");
        Ok(StoreOutcome::Cancelled(action))
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("books", &self.books.len())
            .field("slot", &self.snapshot.slot())
            .field("pending", &self.pending)
            .finish()
    }
}
