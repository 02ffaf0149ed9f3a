//! Interactive session: one line per action, confirmations asked inline.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use bookshelf_core::{LookupOutcome, Notice, Session, SessionError, StoreOutcome};

use super::{ask, describe, isbn_key, open_session, render_book, render_saved_row};
use crate::app_config::Settings;

const HELP: &str = "\
Commands:
  search <isbn>    look a book up and show it
  save             save the book shown by the last search
  list             show saved books
  remove <isbn>    remove a saved book
  clear            remove every saved book
  export [path]    write saved books to an XLSX file
  help             show this help
  quit             leave the shell";

const PROMPT: &str = "bookshelf> ";

pub async fn run_shell_command(settings: &Settings) -> Result<()> {
    let mut session = open_session(settings)?;
    let stdin = io::stdin();
    run_shell(
        &mut session,
        &settings.export_path,
        &mut stdin.lock(),
        &mut io::stdout(),
    )
    .await
}

fn print_notice<W: Write>(output: &mut W, notice: &Notice) -> io::Result<()> {
    match notice {
        Notice::Info(message) => writeln!(output, "{message}"),
        Notice::Error(message) => writeln!(output, "error: {message}"),
    }
}

fn print_error<W: Write>(output: &mut W, error: &SessionError) -> io::Result<()> {
    print_notice(output, &error.notice())
}

/// Reads commands from `input` until `quit` or end of input.
pub(crate) async fn run_shell<R: BufRead, W: Write>(
    session: &mut Session,
    default_export: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "Type 'help' for commands.")?;

    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let argument = words.collect::<Vec<_>>().join(" ");

        match command {
            "quit" | "exit" => return Ok(()),
            "help" => writeln!(output, "{HELP}")?,
            "search" if !argument.is_empty() => match session.search(&argument).await {
                Ok(LookupOutcome::Found(book)) => writeln!(output, "{}", render_book(&book))?,
                Ok(LookupOutcome::NotFound) => print_notice(output, &Notice::not_found())?,
                Err(e) => print_error(output, &e)?,
            },
            "save" => {
                let result = session.save();
                settle(session, result, input, output)?;
            }
            "list" => {
                let books = session.store().books();
                if books.is_empty() {
                    writeln!(output, "No saved books.")?;
                }
                for (index, book) in books.iter().enumerate() {
                    writeln!(output, "{}", render_saved_row(index, book))?;
                }
            }
            "remove" if !argument.is_empty() => {
                let result = session.remove(&isbn_key(&argument));
                settle(session, result, input, output)?;
            }
            "clear" => {
                let result = session.clear();
                settle(session, result, input, output)?;
            }
            "export" => {
                let path = if argument.is_empty() {
                    default_export.to_path_buf()
                } else {
                    PathBuf::from(&argument)
                };
                match session.export(path).await {
                    Ok(summary) => writeln!(
                        output,
                        "Exported {} saved books to {}",
                        summary.books,
                        summary.path.display()
                    )?,
                    Err(e) => print_error(output, &e)?,
                }
            }
            "search" | "remove" => writeln!(output, "usage: {command} <isbn>")?,
            other => writeln!(output, "Unknown command '{other}'. Type 'help' for commands.")?,
        }
    }
}

/// Prints the outcome, asking first when the store wants a confirmation.
fn settle<R: BufRead, W: Write>(
    session: &mut Session,
    result: Result<StoreOutcome, SessionError>,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let settled = match result {
        Ok(StoreOutcome::ConfirmationRequired(action)) => {
            if ask(&action, input, output)? {
                session.confirm()
            } else {
                session.cancel()
            }
        }
        other => other,
    };

    match settled {
        Ok(outcome) => writeln!(output, "{}", describe(&outcome))?,
        Err(e) => print_error(output, &e)?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use async_trait::async_trait;
    use bookshelf_core::catalog::{CatalogSource, LookupError};
    use bookshelf_core::{BookRecord, MemorySnapshot, Store};

    struct OneBook;

    #[async_trait]
    impl CatalogSource for OneBook {
        fn name(&self) -> &'static str {
            "one-book"
        }

        async fn lookup(&self, identifier: &str) -> Result<LookupOutcome, LookupError> {
            if identifier == "9780143127741" {
                let mut book = BookRecord::new("Sapiens", "9780143127741");
                book.authors = vec!["Yuval Noah Harari".to_string()];
                Ok(LookupOutcome::Found(book))
            } else {
                Ok(LookupOutcome::NotFound)
            }
        }
    }

    fn session(snapshot: &MemorySnapshot) -> Session {
        let store = Store::open(Box::new(snapshot.clone())).unwrap();
        Session::new(Arc::new(OneBook), store)
    }

    async fn run(session: &mut Session, script: &str) -> String {
        let mut output = Vec::new();
        run_shell(
            session,
            Path::new("unused.xlsx"),
            &mut Cursor::new(script.to_string()),
            &mut output,
        )
        .await
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_shell_save_twice_confirmed_counts_two_copies() {
        let snapshot = MemorySnapshot::new();
        let mut session = session(&snapshot);

        let out = run(&mut session, "search 9780143127741\nsave\nsave\ny\nquit\n").await;

        assert!(out.contains("Title:          Sapiens"));
        assert!(out.contains("'Sapiens' is already saved."));
        assert!(out.contains("9780143127741 now has 2 copies."));
        assert_eq!(session.store().books()[0].copy_count, 2);
    }

    #[tokio::test]
    async fn test_shell_save_without_search_is_informational() {
        let snapshot = MemorySnapshot::new();
        let mut session = session(&snapshot);

        let out = run(&mut session, "save\n").await;

        assert!(out.contains("No book data to save."));
        assert!(session.store().is_empty());
    }

    #[tokio::test]
    async fn test_shell_not_found_clears_preview() {
        let snapshot = MemorySnapshot::new();
        let mut session = session(&snapshot);

        let out = run(&mut session, "search 9780143127741\nsearch 9780000000002\nsave\n").await;

        assert!(out.contains("No book found for this ISBN."));
        assert!(out.contains("No book data to save."));
        assert!(session.store().is_empty());
    }

    #[tokio::test]
    async fn test_shell_clear_declined_keeps_books() {
        let snapshot = MemorySnapshot::new();
        let mut session = session(&snapshot);

        let out = run(&mut session, "search 9780143127741\nsave\nclear\nn\nlist\n").await;

        assert!(out.contains("Cancelled; saved books unchanged."));
        assert!(out.contains("  1. 9780143127741  Sapiens"));
        assert_eq!(session.store().len(), 1);
    }

    #[tokio::test]
    async fn test_shell_remove_with_dashes() {
        let snapshot = MemorySnapshot::new();
        let mut session = session(&snapshot);

        let out = run(
            &mut session,
            "search 9780143127741\nsave\nremove 978-0-14-312774-1\nyes\n",
        )
        .await;

        assert!(out.contains("Removed 'Sapiens'."));
        assert!(session.store().is_empty());
    }

    #[tokio::test]
    async fn test_shell_unknown_command_and_usage() {
        let snapshot = MemorySnapshot::new();
        let mut session = session(&snapshot);

        let out = run(&mut session, "frobnicate\nsearch\n").await;

        assert!(out.contains("Unknown command 'frobnicate'"));
        assert!(out.contains("usage: search <isbn>"));
    }

    #[tokio::test]
    async fn test_shell_export_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.xlsx");
        let snapshot = MemorySnapshot::new();
        let mut session = session(&snapshot);

        let script = format!("search 9780143127741\nsave\nexport {}\n", path.display());
        let out = run(&mut session, &script).await;

        assert!(out.contains("Exported 1 saved books to"));
        assert!(path.exists());
    }
}
