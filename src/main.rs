//! CLI entry point for the bookshelf tool.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod app_config;
mod cli;
mod commands;

use app_config::{Settings, load_file_config};
use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let settings = Settings::resolve(load_file_config(args.config.as_deref())?);
    debug!(
        snapshot = %settings.snapshot_path.display(),
        catalog = %settings.api_base_url,
        "Settings resolved"
    );

    match args.command {
        Command::Search { isbn } => commands::run_search_command(&settings, &isbn).await,
        Command::Save(save) => commands::run_save_command(&settings, &save).await,
        Command::List => commands::run_list_command(&settings),
        Command::Remove(remove) => commands::run_remove_command(&settings, &remove),
        Command::Clear(clear) => commands::run_clear_command(&settings, &clear),
        Command::Export { output } => commands::run_export_command(&settings, output).await,
        Command::Shell => commands::run_shell_command(&settings).await,
        Command::Serve { listen, database } => {
            commands::run_serve_command(&settings, listen, database).await
        }
    }
}
