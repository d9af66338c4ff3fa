use serde_json::Value;
use thiserror::Error;

/// Upper bound on read-apply-commit attempts before an update is abandoned.
pub const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Identifies one per-user singleton document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub user: String,
    pub doc: &'static str,
}

impl DocKey {
    pub fn stats<T: AsRef<str>>(user: T) -> Self {
        DocKey {
            user: user.as_ref().to_string(),
            doc: "stats/overview",
        }
    }

    pub fn achievements<T: AsRef<str>>(user: T) -> Self {
        DocKey {
            user: user.as_ref().to_string(),
            doc: "achievements/progress",
        }
    }
}

impl std::fmt::Display for DocKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user, self.doc)
    }
}

#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("write conflict on {key} not resolved after {attempts} attempts")]
    ConflictExhausted { key: String, attempts: u32 },

    #[error("stored document {key} is not valid JSON: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    #[error("update function failed: {0}")]
    Apply(#[source] anyhow::Error),

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Atomic read-modify-write access to per-user documents.
///
/// `atomic_update` reads the current document (None when it does not exist
/// yet), passes it to `apply`, and commits the returned replacement with a
/// conflict check against the snapshot it read. On conflict the whole cycle
/// is retried with a fresh read, so `apply` MUST be a pure function of its
/// snapshot argument: no captured mutable state, no side effects.
pub trait DocumentStore: Send + Sync {
    /// Returns the current document for the key.
    /// Returns Ok(None) if the document was never written.
    /// Returns Err if there is a storage error.
    fn read(&self, key: &DocKey) -> Result<Option<Value>, DocumentStoreError>;

    /// Runs `apply` against a fresh snapshot of the document and commits the
    /// result atomically. Returns the committed document.
    fn atomic_update(
        &self,
        key: &DocKey,
        apply: &dyn Fn(Option<Value>) -> anyhow::Result<Value>,
    ) -> Result<Value, DocumentStoreError>;
}
