use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI arguments subject to config resolution. Mirrors the flags that can be
/// overridden by the TOML config file.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub achievements_file: Option<PathBuf>,
    pub rating_debounce_ms: u64,
    pub dates_debounce_ms: u64,
    pub note_debounce_ms: u64,
}

/// Optional TOML config file. Every field falls back to the CLI value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub achievements_file: Option<String>,
    pub rating_debounce_ms: Option<u64>,
    pub dates_debounce_ms: Option<u64>,
    pub note_debounce_ms: Option<u64>,
}

impl FileConfig {
    pub fn load<T: AsRef<Path>>(path: T) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {:?}", path.as_ref()))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub achievements_file: Option<PathBuf>,
    pub rating_debounce_ms: u64,
    pub dates_debounce_ms: u64,
    pub note_debounce_ms: u64,
}

impl AppConfig {
    /// Resolves configuration from CLI arguments and the optional TOML file.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in the config file")
            })?;
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let achievements_file = file
            .achievements_file
            .map(PathBuf::from)
            .or_else(|| cli.achievements_file.clone());
        if let Some(path) = &achievements_file {
            if !path.exists() {
                bail!("Achievements file not found: {:?}", path);
            }
        }

        Ok(Self {
            db_dir,
            port,
            logging_level,
            achievements_file,
            rating_debounce_ms: file.rating_debounce_ms.unwrap_or(cli.rating_debounce_ms),
            dates_debounce_ms: file.dates_debounce_ms.unwrap_or(cli.dates_debounce_ms),
            note_debounce_ms: file.note_debounce_ms.unwrap_or(cli.note_debounce_ms),
        })
    }

    pub fn collection_db_path(&self) -> PathBuf {
        self.db_dir.join("collection.db")
    }

    pub fn documents_db_path(&self) -> PathBuf {
        self.db_dir.join("documents.db")
    }
}

/// Parses a logging level string via clap's ValueEnum trait.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
