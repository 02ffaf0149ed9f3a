//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Look books up by ISBN, keep a saved-books list, and export it.
///
/// Bookshelf queries a book catalog by ISBN, keeps a personal list of saved
/// books (saving the same book again counts an extra copy), exports that
/// list to a spreadsheet, and can serve a small HTTP API that stores books
/// in `SQLite`.
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Look up a book by ISBN and show it
    Search {
        /// ISBN-10 or ISBN-13; dashes and spaces are ignored
        isbn: String,
    },

    /// Look up a book by ISBN and add it to the saved books
    Save(IsbnArgs),

    /// Show the saved books
    List,

    /// Remove a saved book
    Remove(IsbnArgs),

    /// Remove every saved book
    Clear(ConfirmArgs),

    /// Write the saved books to an XLSX spreadsheet
    Export {
        /// Destination file (default: saved_books.xlsx)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Interactive session: search, save, remove, clear, export
    Shell,

    /// Run the HTTP book service
    Serve {
        /// Address to listen on (default: 127.0.0.1:5000)
        #[arg(short, long, value_name = "ADDR")]
        listen: Option<String>,

        /// SQLite database file
        #[arg(long, value_name = "PATH")]
        database: Option<PathBuf>,
    },
}

/// An ISBN plus the `--yes` confirmation flag.
#[derive(ClapArgs, Debug, PartialEq, Eq)]
pub struct IsbnArgs {
    /// ISBN of the book
    pub isbn: String,

    /// Answer yes to the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(ClapArgs, Debug, PartialEq, Eq)]
pub struct ConfirmArgs {
    /// Answer yes to the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
