//! Application configuration loading for CLI defaults.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use std::time::Duration;

use anyhow::{Context, Result, bail};
use bookshelf_core::catalog::{
    DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts,
};
use bookshelf_core::db::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_MAX_CONNECTIONS, DatabaseOptions};
use bookshelf_core::export::DEFAULT_EXPORT_FILE_NAME;
use bookshelf_core::server::DEFAULT_LISTEN_ADDR;
use bookshelf_core::store::DEFAULT_SNAPSHOT_FILE;

const APP_DIR: &str = "bookshelf";
const DEFAULT_DATABASE_FILE: &str = "books.db";

/// Key/value file configuration; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Base URL of the book catalog API.
    pub api_base_url: Option<String>,
    /// Optional catalog API key, sent as the `key` query parameter.
    pub api_key: Option<String>,
    /// Saved-books snapshot file.
    pub snapshot_path: Option<PathBuf>,
    /// `SQLite` file of the persistence service.
    pub database_path: Option<PathBuf>,
    /// Listen address of the persistence service.
    pub listen_addr: Option<String>,
    pub db_max_connections: Option<u64>,
    pub db_busy_timeout_ms: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    /// Default export destination.
    pub export_path: Option<PathBuf>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.api_base_url {
            url::Url::parse(url).with_context(|| {
                format!("Invalid config value for `api_base_url`: '{url}' is not a URL")
            })?;
        }
        if let Some(addr) = &self.listen_addr {
            addr.parse::<SocketAddr>().with_context(|| {
                format!("Invalid config value for `listen_addr`: '{addr}'. Expected host:port")
            })?;
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(value) = self.db_max_connections
            && !(1..=32).contains(&value)
        {
            bail!("Invalid config value for `db_max_connections`: {value}. Expected range: 1..=32");
        }
        if let Some(value) = self.db_busy_timeout_ms
            && value > 60_000
        {
            bail!("Invalid config value for `db_busy_timeout_ms`: {value}. Expected range: 0..=60000");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Effective settings after applying defaults to the file config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub snapshot_path: PathBuf,
    pub database_path: PathBuf,
    pub listen_addr: String,
    pub database: DatabaseOptions,
    pub timeouts: HttpTimeouts,
    pub export_path: PathBuf,
}

impl Settings {
    /// Fills every unset value from the built-in defaults.
    #[must_use]
    pub fn resolve(config: FileConfig) -> Self {
        let data_dir = resolve_data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            api_base_url: config
                .api_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key.filter(|key| !key.is_empty()),
            snapshot_path: config
                .snapshot_path
                .unwrap_or_else(|| data_dir.join(DEFAULT_SNAPSHOT_FILE)),
            database_path: config
                .database_path
                .unwrap_or_else(|| data_dir.join(DEFAULT_DATABASE_FILE)),
            listen_addr: config
                .listen_addr
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            database: DatabaseOptions {
                max_connections: config
                    .db_max_connections
                    .and_then(|value| u32::try_from(value).ok())
                    .unwrap_or(DEFAULT_MAX_CONNECTIONS),
                busy_timeout: Duration::from_millis(
                    config.db_busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
                ),
            },
            timeouts: HttpTimeouts {
                connect_secs: config
                    .connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
                read_secs: config.read_timeout_secs.unwrap_or(DEFAULT_READ_TIMEOUT_SECS),
            },
            export_path: config
                .export_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE_NAME)),
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/bookshelf/config.toml`
/// 2. `$HOME/.config/bookshelf/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

/// Resolves the data directory.
///
/// Priority:
/// 1. `$XDG_DATA_HOME/bookshelf`
/// 2. `$HOME/.local/share/bookshelf`
#[must_use]
pub fn resolve_data_dir() -> Option<PathBuf> {
    if let Some(xdg_data_home) = env_var_non_empty_os("XDG_DATA_HOME") {
        return Some(PathBuf::from(xdg_data_home).join(APP_DIR));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(PathBuf::from(home).join(".local").join("share").join(APP_DIR))
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file at `explicit`, or the default path if present.
///
/// An explicit path must exist; a missing default file yields an empty config.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return read_config_file(path);
    }

    match resolve_default_config_path() {
        Some(path) if path.exists() => read_config_file(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();

    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };
        let key = raw_key.trim();
        let value = raw_value.trim();
        let string_value = || {
            parse_string_literal(value)
                .with_context(|| format!("Invalid `{key}` value on line {}", line_index + 1))
        };
        let integer_value = || {
            parse_integer_u64(value)
                .with_context(|| format!("Invalid `{key}` value on line {}", line_index + 1))
        };

        match key {
            "api_base_url" => cfg.api_base_url = Some(string_value()?),
            "api_key" => cfg.api_key = Some(string_value()?),
            "snapshot_path" => cfg.snapshot_path = Some(PathBuf::from(string_value()?)),
            "database_path" => cfg.database_path = Some(PathBuf::from(string_value()?)),
            "listen_addr" => cfg.listen_addr = Some(string_value()?),
            "db_max_connections" => cfg.db_max_connections = Some(integer_value()?),
            "db_busy_timeout_ms" => cfg.db_busy_timeout_ms = Some(integer_value()?),
            "connect_timeout_secs" => cfg.connect_timeout_secs = Some(integer_value()?),
            "read_timeout_secs" => cfg.read_timeout_secs = Some(integer_value()?),
            "export_path" => cfg.export_path = Some(PathBuf::from(string_value()?)),
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }

    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
