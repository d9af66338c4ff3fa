mod memory;
mod sqlite_document_store;
mod store;

pub use memory::InMemoryDocumentStore;
pub use sqlite_document_store::SqliteDocumentStore;
pub use store::{DocKey, DocumentStore, DocumentStoreError, MAX_COMMIT_ATTEMPTS};
