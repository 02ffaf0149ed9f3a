//! Error types for the saved-books store and its snapshot slot.

use std::path::Path;

use thiserror::Error;

use super::PendingAction;

/// Errors raised while reading or writing the durable snapshot.
#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    /// The snapshot slot exists but could not be read.
    #[error("cannot read saved books from '{slot}': {message}")]
    Read {
        /// Slot name (file path for file snapshots)
        slot: String,
        /// Underlying IO error text
        message: String,
    },

    /// The snapshot could not be written.
    #[error(
        "cannot write saved books to '{slot}': {message}\n  Suggestion: Check free disk space and permissions on the data directory"
    )]
    Write {
        /// Slot name (file path for file snapshots)
        slot: String,
        /// Underlying IO or serialization error text
        message: String,
    },

    /// The snapshot content is not a valid saved-books list.
    #[error(
        "saved books in '{slot}' are corrupt: {reason}\n  Suggestion: Fix or move the file aside; it is never overwritten while unreadable"
    )]
    Corrupt {
        /// Slot name (file path for file snapshots)
        slot: String,
        /// What is wrong with the content
        reason: String,
    },
}

impl SnapshotError {
    pub(crate) fn read(path: &Path, error: &std::io::Error) -> Self {
        Self::Read {
            slot: path.display().to_string(),
            message: error.to_string(),
        }
    }

    pub(crate) fn write(slot: impl Into<String>, message: impl ToString) -> Self {
        Self::Write {
            slot: slot.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn corrupt(slot: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt {
            slot: slot.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors returned by store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Save was requested without a looked-up book.
    #[error("no book data to save\n  Suggestion: Search for an ISBN first")]
    NothingToSave,

    /// No saved book has this isbn.
    #[error("no saved book with ISBN {0}")]
    UnknownIsbn(String),

    /// Another confirmation must be answered first.
    #[error("a confirmation is already pending: {0}\n  Suggestion: Confirm or cancel it first")]
    ConfirmationPending(PendingAction),

    /// The saved book already holds the largest representable copy count.
    #[error("ISBN {0} cannot hold any more copies")]
    CopyLimit(String),

    /// `confirm`/`cancel` was called with nothing pending.
    #[error("there is no pending action to confirm or cancel")]
    NoPendingAction,

    /// Write-through to the snapshot failed; in-memory state is unchanged.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_error_write_message_has_suggestion() {
        let err = SnapshotError::write("/tmp/savedBooks.json", "disk full");
        let msg = err.to_string();
        assert!(msg.contains("/tmp/savedBooks.json"));
        assert!(msg.contains("disk full"));
        assert!(msg.contains("Suggestion"));
    }

    #[test]
    fn test_store_error_pending_message_names_action() {
        let err = StoreError::ConfirmationPending(PendingAction::Clear { count: 2 });
        assert!(err.to_string().contains("Clear all 2 saved books?"));
    }

    #[test]
    fn test_store_error_from_snapshot_error() {
        let err: StoreError = SnapshotError::corrupt("memory", "bad json").into();
        assert!(matches!(err, StoreError::Snapshot(SnapshotError::Corrupt { .. })));
        assert!(err.to_string().contains("bad json"));
    }
}
