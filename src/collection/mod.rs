mod collection_store;
mod debounce;
mod models;
mod service;
mod sqlite_collection_store;

pub use collection_store::CollectionStore;
pub use debounce::{DebounceKey, Debouncer, EditField};
pub use models::{MediaType, TrackedItem};
pub use service::{CollectionService, DebounceSettings};
pub use sqlite_collection_store::SqliteCollectionStore;
