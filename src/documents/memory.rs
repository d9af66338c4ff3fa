use super::store::{DocKey, DocumentStore, DocumentStoreError, MAX_COMMIT_ATTEMPTS};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

type ConflictHook = Box<dyn FnMut(&DocKey) + Send>;

/// HashMap-backed document store with the same optimistic-commit semantics
/// as the SQLite store. Intended for tests: `set_conflict_hook` lets a test
/// interleave a write between an update's read and its commit, forcing the
/// conflict-retry path.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<HashMap<DocKey, (Value, u64)>>,
    conflict_hook: Mutex<Option<ConflictHook>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook invoked once per attempt between read and commit.
    /// The hook may call `put` to simulate a concurrent writer.
    pub fn set_conflict_hook<F: FnMut(&DocKey) + Send + 'static>(&self, hook: F) {
        *self.conflict_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Unconditionally overwrites a document, bumping its version.
    pub fn put(&self, key: &DocKey, value: Value) {
        let mut documents = self.documents.lock().unwrap();
        let version = documents.get(key).map(|(_, v)| *v).unwrap_or(0);
        documents.insert(key.clone(), (value, version + 1));
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn read(&self, key: &DocKey) -> Result<Option<Value>, DocumentStoreError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone()))
    }

    fn atomic_update(
        &self,
        key: &DocKey,
        apply: &dyn Fn(Option<Value>) -> anyhow::Result<Value>,
    ) -> Result<Value, DocumentStoreError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let snapshot = self
                .documents
                .lock()
                .unwrap()
                .get(key)
                .map(|(value, version)| (value.clone(), *version));
            let read_version = snapshot.as_ref().map(|(_, v)| *v);

            let next = apply(snapshot.map(|(value, _)| value)).map_err(DocumentStoreError::Apply)?;

            if let Some(hook) = self.conflict_hook.lock().unwrap().as_mut() {
                hook(key);
            }

            let mut documents = self.documents.lock().unwrap();
            let current_version = documents.get(key).map(|(_, v)| *v);
            if current_version == read_version {
                let version = current_version.unwrap_or(0) + 1;
                documents.insert(key.clone(), (next.clone(), version));
                return Ok(next);
            }
            // Conflicting write landed in between, retry with a fresh read
        }

        Err(DocumentStoreError::ConflictExhausted {
            key: key.to_string(),
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }
}
