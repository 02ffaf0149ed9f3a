//! XLSX export of the saved-books list.
//!
//! Builds a minimal single-sheet workbook (a zip archive of SpreadsheetML
//! parts) with one header row and one row per saved book.

mod error;
pub(crate) mod sheet_writer;

pub use error::ExportError;

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::book::BookRecord;

/// MIME type of the exported artifact.
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Default file name of the exported artifact.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "saved_books.xlsx";

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Saved Books";

/// Header row, in column order.
pub const HEADERS: [&str; 8] = [
    "Title",
    "PageCount",
    "PublishedDate",
    "Language",
    "Authors",
    "Publisher",
    "ISBN",
    "CopyCount",
];

/// One worksheet cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Number(u32),
}

impl Cell {
    fn text(value: Option<&str>) -> Self {
        Self::Text(value.unwrap_or_default().to_string())
    }
}

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Data rows, header excluded.
    pub books: usize,
    pub bytes: usize,
}

/// The row written for one book, in [`HEADERS`] order.
#[must_use]
pub fn book_row(book: &BookRecord) -> Vec<Cell> {
    vec![
        Cell::Text(book.title.clone()),
        Cell::Number(book.page_count),
        Cell::text(book.published_date.as_deref()),
        Cell::text(book.language.as_deref()),
        Cell::Text(book.authors_joined()),
        Cell::text(book.publisher.as_deref()),
        Cell::Text(book.isbn.clone()),
        Cell::Number(book.copy_count),
    ]
}

/// Header row followed by one row per book, in store order.
#[must_use]
pub fn export_rows(books: &[BookRecord]) -> Vec<Vec<Cell>> {
    let header = HEADERS
        .iter()
        .map(|h| Cell::Text((*h).to_string()))
        .collect();
    std::iter::once(header)
        .chain(books.iter().map(book_row))
        .collect()
}

/// Serializes the books into XLSX bytes.
///
/// An empty slice yields a header-only workbook.
///
/// # Errors
///
/// Returns [`ExportError::Serialize`] if the archive cannot be built.
#[instrument(skip(books), fields(books = books.len()))]
pub fn build_workbook(books: &[BookRecord]) -> Result<Vec<u8>, ExportError> {
    let rows = export_rows(books);
    let parts = [
        (sheet_writer::CONTENT_TYPES_PART, sheet_writer::content_types()),
        (sheet_writer::ROOT_RELS_PART, sheet_writer::root_rels()),
        (sheet_writer::WORKBOOK_PART, sheet_writer::workbook(SHEET_NAME)),
        (sheet_writer::WORKBOOK_RELS_PART, sheet_writer::workbook_rels()),
        (sheet_writer::SHEET_PART, sheet_writer::worksheet(&rows)),
    ];

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        archive.start_file(name, options)?;
        archive.write_all(content.as_bytes())?;
    }
    let bytes = archive.finish()?.into_inner();

    debug!(bytes = bytes.len(), rows = rows.len(), "Workbook built");
    Ok(bytes)
}

/// Builds the workbook and writes it to `path`.
///
/// # Errors
///
/// Returns [`ExportError::Serialize`] if the archive cannot be built and
/// [`ExportError::Write`] if the file cannot be written.
#[instrument(skip(books, path), fields(path = %path.display(), books = books.len()))]
pub fn write_workbook(path: &Path, books: &[BookRecord]) -> Result<ExportSummary, ExportError> {
    let bytes = build_workbook(books)?;
    std::fs::write(path, &bytes).map_err(|e| ExportError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(ExportSummary {
        path: path.to_path_buf(),
        books: books.len(),
        bytes: bytes.len(),
    })
}
