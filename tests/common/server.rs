//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases and a short
//! debounce window.

use super::constants::*;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tracklit_server::achievements::StaticDefinitionCatalog;
use tracklit_server::collection::{
    CollectionService, DebounceSettings, SqliteCollectionStore,
};
use tracklit_server::documents::SqliteDocumentStore;
use tracklit_server::server::{make_app, RequestsLoggingLevel, ServerConfig};

/// Achievement definitions served by test servers: every key levels up at
/// the thresholds in [`TEST_THRESHOLDS`]. Loaded through the TOML path so
/// the file catalog is exercised end to end.
const TEST_ACHIEVEMENTS_TOML: &str = r#"
[[achievement]]
id = "watchMovies"
title = "Movie Marathoner"
subtitle = "Finish movies"
icon = "film"
thresholds = [1, 3]

[[achievement]]
id = "finishTVShows"
title = "Binge Watcher"
subtitle = "Finish TV shows"
icon = "tv"
thresholds = [1, 3]

[[achievement]]
id = "readBooks"
title = "Bookworm"
subtitle = "Finish books"
icon = "book"
thresholds = [1, 3]

[[achievement]]
id = "giveRatings"
title = "Critic"
subtitle = "Rate items in your collection"
icon = "star"
thresholds = [1, 3]

[[achievement]]
id = "totalItems"
title = "Collector"
subtitle = "Grow your collection"
icon = "tray.full"
thresholds = [1, 3]
"#;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if database creation, port binding, or server startup fails,
    /// or if the server doesn't become ready within the timeout.
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp db dir");

        let collection_store = Arc::new(
            SqliteCollectionStore::new(temp_db_dir.path().join("collection.db"))
                .expect("Failed to open collection store"),
        );
        let document_store = Arc::new(
            SqliteDocumentStore::new(temp_db_dir.path().join("documents.db"))
                .expect("Failed to open document store"),
        );

        let achievements_path = temp_db_dir.path().join("achievements.toml");
        std::fs::write(&achievements_path, TEST_ACHIEVEMENTS_TOML)
            .expect("Failed to write achievements fixture");
        let catalog = Arc::new(
            StaticDefinitionCatalog::from_toml_file(&achievements_path)
                .expect("Failed to load achievements fixture"),
        );

        let debounce = Duration::from_millis(TEST_DEBOUNCE_MS);
        let service = Arc::new(CollectionService::new(
            collection_store,
            document_store,
            catalog,
            DebounceSettings {
                rating: debounce,
                dates: debounce,
                note: debounce,
            },
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
        };
        let app = make_app(config, service);

        // Spawn server in background task with graceful shutdown
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the info endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir cleans up automatically
    }
}
