//! One-shot saved-books commands.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bookshelf_core::{LookupOutcome, Notice, Session, SessionError, StoreOutcome};
use tracing::info;

use super::{ask, describe, isbn_key, open_session, render_book, render_saved_row, report};
use crate::app_config::Settings;
use crate::cli::{ConfirmArgs, IsbnArgs};

/// Runs a store action, answers its confirmation from `--yes` or a stdin
/// prompt, and prints what it did.
fn apply(
    session: &mut Session,
    result: Result<StoreOutcome, SessionError>,
    yes: bool,
) -> Result<()> {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return report(&e),
    };

    let settled = match outcome {
        StoreOutcome::ConfirmationRequired(action) => {
            let accepted = yes
                || ask(&action, &mut io::stdin().lock(), &mut io::stdout())
                    .context("Failed to read confirmation answer")?;
            if accepted {
                session.confirm()
            } else {
                session.cancel()
            }
        }
        other => Ok(other),
    };

    match settled {
        Ok(outcome) => {
            println!("{}", describe(&outcome));
            Ok(())
        }
        Err(e) => report(&e),
    }
}

/// Looks the isbn up and fills the session preview; `false` when nothing was found.
async fn search_into(session: &mut Session, isbn: &str) -> Result<bool> {
    match session.search(isbn).await {
        Ok(LookupOutcome::Found(book)) => {
            println!("{}", render_book(&book));
            Ok(true)
        }
        Ok(LookupOutcome::NotFound) => {
            println!("{}", Notice::not_found());
            Ok(false)
        }
        Err(e) => report(&e).map(|()| false),
    }
}

pub async fn run_search_command(settings: &Settings, isbn: &str) -> Result<()> {
    let mut session = open_session(settings)?;
    search_into(&mut session, isbn).await?;
    Ok(())
}

pub async fn run_save_command(settings: &Settings, args: &IsbnArgs) -> Result<()> {
    let mut session = open_session(settings)?;
    if !search_into(&mut session, &args.isbn).await? {
        return Ok(());
    }
    let result = session.save();
    apply(&mut session, result, args.yes)
}

pub fn run_list_command(settings: &Settings) -> Result<()> {
    let session = open_session(settings)?;
    let books = session.store().books();
    if books.is_empty() {
        println!("No saved books.");
        return Ok(());
    }

    for (index, book) in books.iter().enumerate() {
        println!("{}", render_saved_row(index, book));
    }
    let copies: u64 = books.iter().map(|b| u64::from(b.copy_count)).sum();
    println!("{} books, {copies} copies", books.len());
    Ok(())
}

pub fn run_remove_command(settings: &Settings, args: &IsbnArgs) -> Result<()> {
    let mut session = open_session(settings)?;
    let result = session.remove(&isbn_key(&args.isbn));
    apply(&mut session, result, args.yes)
}

pub fn run_clear_command(settings: &Settings, args: &ConfirmArgs) -> Result<()> {
    let mut session = open_session(settings)?;
    let result = session.clear();
    apply(&mut session, result, args.yes)
}

pub async fn run_export_command(settings: &Settings, output: Option<PathBuf>) -> Result<()> {
    let mut session = open_session(settings)?;
    let path = output.unwrap_or_else(|| settings.export_path.clone());

    match session.export(path).await {
        Ok(summary) => {
            info!(path = %summary.path.display(), "Export finished");
            println!(
                "Exported {} saved books to {}",
                summary.books,
                summary.path.display()
            );
            Ok(())
        }
        Err(e) => report(&e),
    }
}
