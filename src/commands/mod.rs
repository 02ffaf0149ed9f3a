//! CLI command handlers.

mod books;
mod serve;
mod shell;

pub use books::{
    run_clear_command, run_export_command, run_list_command, run_remove_command,
    run_save_command, run_search_command,
};
pub use serve::run_serve_command;
pub use shell::run_shell_command;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bookshelf_core::catalog::normalize_isbn;
use bookshelf_core::{
    BookRecord, GoogleBooksClient, JsonFileSnapshot, Notice, PendingAction, Session, SessionError,
    Store, StoreOutcome,
};
use tracing::debug;

use crate::app_config::Settings;

/// Builds the catalog client described by `settings`.
pub(crate) fn catalog_client(settings: &Settings) -> Result<GoogleBooksClient> {
    let client = GoogleBooksClient::with_base_url(&settings.api_base_url, settings.timeouts)
        .context("Failed to build the catalog client")?;
    Ok(match &settings.api_key {
        Some(key) => client.with_api_key(key.clone()),
        None => client,
    })
}

/// Opens a session over the snapshot file in `settings`.
pub(crate) fn open_session(settings: &Settings) -> Result<Session> {
    let store = Store::open(Box::new(JsonFileSnapshot::new(&settings.snapshot_path)))
        .with_context(|| {
            format!(
                "Failed to load saved books from '{}'",
                settings.snapshot_path.display()
            )
        })?;
    debug!(books = store.len(), path = %settings.snapshot_path.display(), "Saved books loaded");
    Ok(Session::new(Arc::new(catalog_client(settings)?), store))
}

/// Prints an informational notice and turns an error notice into a failure.
pub(crate) fn report(error: &SessionError) -> Result<()> {
    match error.notice() {
        Notice::Info(message) => {
            println!("{message}");
            Ok(())
        }
        Notice::Error(message) => {
            eprintln!("{message}");
            bail!("{error}")
        }
    }
}

/// Asks `action`'s question on `output` and reads a y/N answer from `input`.
///
/// End of input counts as no.
pub(crate) fn ask<R: BufRead, W: Write>(
    action: &PendingAction,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "{action} [y/N] ")?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// One-line message for a finished store operation.
pub(crate) fn describe(outcome: &StoreOutcome) -> String {
    match outcome {
        StoreOutcome::Inserted { isbn, position } => {
            format!("Saved {isbn} as book #{}.", position + 1)
        }
        StoreOutcome::ConfirmationRequired(action) => action.to_string(),
        StoreOutcome::CopiesIncremented { isbn, copy_count } => {
            format!("{isbn} now has {copy_count} copies.")
        }
        StoreOutcome::Removed(book) => format!("Removed '{}'.", book.title),
        StoreOutcome::Cleared { removed } => format!("Cleared {removed} saved books."),
        StoreOutcome::Cancelled(_) => "Cancelled; saved books unchanged.".to_string(),
    }
}

/// Isbn in its normalized form when it parses, otherwise as typed.
pub(crate) fn isbn_key(input: &str) -> String {
    normalize_isbn(input).unwrap_or_else(|_| input.trim().to_string())
}

/// Multi-line display of one book.
pub(crate) fn render_book(book: &BookRecord) -> String {
    let mut lines = vec![
        format!("Title:          {}", book.title),
        format!("Authors:        {}", book.authors_joined()),
        format!("Pages:          {}", book.page_count),
    ];
    if let Some(date) = &book.published_date {
        lines.push(format!("Published:      {date}"));
    }
    if let Some(publisher) = &book.publisher {
        lines.push(format!("Publisher:      {publisher}"));
    }
    if let Some(language) = &book.language {
        lines.push(format!("Language:       {language}"));
    }
    lines.push(format!("ISBN:           {}", book.isbn));
    lines.join("\n")
}

/// One table row per saved book.
pub(crate) fn render_saved_row(index: usize, book: &BookRecord) -> String {
    format!(
        "{:>3}. {}  {}  ({})  x{}",
        index + 1,
        book.isbn,
        book.title,
        book.authors_joined(),
        book.copy_count
    )
}
