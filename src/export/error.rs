//! Error types for spreadsheet export.

use thiserror::Error;

/// Errors that can occur while exporting saved books.
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    /// Building the workbook archive failed.
    #[error("export failed: could not build the workbook: {message}")]
    Serialize {
        /// Underlying zip/IO error text
        message: String,
    },

    /// The finished workbook could not be written to disk.
    #[error(
        "export failed: could not write '{path}': {message}\n  Suggestion: Choose another output path or check permissions"
    )]
    Write {
        /// Destination path
        path: String,
        /// Underlying IO error text
        message: String,
    },

    /// The background export task did not complete.
    #[error("export failed: export task aborted: {message}")]
    Aborted {
        /// Join error text
        message: String,
    },
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Serialize {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Serialize {
            message: err.to_string(),
        }
    }
}
