use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tracklit_server::achievements::StaticDefinitionCatalog;
use tracklit_server::collection::{CollectionService, DebounceSettings, SqliteCollectionStore};
use tracklit_server::config::{AppConfig, CliConfig, FileConfig};
use tracklit_server::documents::SqliteDocumentStore;
use tracklit_server::server::{run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite database files.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to an optional TOML config file; its values override the CLI.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to a TOML file with achievement definitions. Built-in content is
    /// used when not set.
    #[clap(long, value_parser = parse_path)]
    pub achievements_file: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Quiet period in milliseconds before a rating edit is committed.
    #[clap(long, default_value_t = 500)]
    pub rating_debounce_ms: u64,

    /// Quiet period in milliseconds before a date edit is committed.
    #[clap(long, default_value_t = 500)]
    pub dates_debounce_ms: u64,

    /// Quiet period in milliseconds before a note edit is committed.
    #[clap(long, default_value_t = 1000)]
    pub note_debounce_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        achievements_file: cli_args.achievements_file,
        rating_debounce_ms: cli_args.rating_debounce_ms,
        dates_debounce_ms: cli_args.dates_debounce_ms,
        note_debounce_ms: cli_args.note_debounce_ms,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite collection database at {:?}...",
        config.collection_db_path()
    );
    let collection_store = Arc::new(SqliteCollectionStore::new(config.collection_db_path())?);

    info!(
        "Opening SQLite document database at {:?}...",
        config.documents_db_path()
    );
    let document_store = Arc::new(SqliteDocumentStore::new(config.documents_db_path())?);

    let catalog = match &config.achievements_file {
        Some(path) => {
            info!("Loading achievement definitions from {:?}", path);
            Arc::new(StaticDefinitionCatalog::from_toml_file(path)?)
        }
        None => Arc::new(StaticDefinitionCatalog::builtin()),
    };

    let service = Arc::new(CollectionService::new(
        collection_store,
        document_store,
        catalog,
        DebounceSettings {
            rating: Duration::from_millis(config.rating_debounce_ms),
            dates: Duration::from_millis(config.dates_debounce_ms),
            note: Duration::from_millis(config.note_debounce_ms),
        },
    ));

    info!("Ready to serve at port {}!", config.port);
    run_server(service, config.logging_level, config.port).await
}
