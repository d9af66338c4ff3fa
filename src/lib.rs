//! Tracklit Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod achievements;
pub mod collection;
pub mod config;
pub mod documents;
pub mod server;
pub mod sqlite_persistence;
pub mod stats;

// Re-export commonly used types for convenience
pub use achievements::{AchievementTracker, DefinitionCatalog, StaticDefinitionCatalog};
pub use collection::{CollectionService, CollectionStore, DebounceSettings, SqliteCollectionStore};
pub use documents::{DocumentStore, InMemoryDocumentStore, SqliteDocumentStore};
pub use server::{run_server, RequestsLoggingLevel};
pub use stats::StatsAggregator;
