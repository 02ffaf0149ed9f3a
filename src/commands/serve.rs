//! Serve command: run the HTTP book service until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bookshelf_core::{Database, ServerState, SqliteBookRepository, serve};
use tokio::net::TcpListener;
use tracing::info;

use super::catalog_client;
use crate::app_config::Settings;

pub async fn run_serve_command(
    settings: &Settings,
    listen: Option<String>,
    database: Option<PathBuf>,
) -> Result<()> {
    let listen = listen.unwrap_or_else(|| settings.listen_addr.clone());
    let database = database.unwrap_or_else(|| settings.database_path.clone());

    if let Some(parent) = database.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory '{}'", parent.display())
        })?;
    }
    let db = Database::open(&database, &settings.database)
        .await
        .with_context(|| format!("Failed to open database '{}'", database.display()))?;
    info!(
        path = %database.display(),
        max_connections = settings.database.max_connections,
        "Book database opened"
    );

    let state = ServerState::new(
        Arc::new(SqliteBookRepository::new(db.clone())),
        Arc::new(catalog_client(settings)?),
    );
    let listener = TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to listen on '{listen}'"))?;
    println!("Book service listening on http://{listen}");

    tokio::select! {
        result = serve(listener, state) => result.context("Book service stopped")?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
    }

    db.close().await;
    Ok(())
}
