use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// The item fields whose edits are debounced before being committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditField {
    Rating,
    Dates,
    Note,
}

/// One debounce slot: the latest pending edit of one field of one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DebounceKey {
    pub user: String,
    pub media_id: i64,
    pub field: EditField,
}

/// Delays writes until a quiet period follows the triggering edit.
///
/// Scheduling a task for a key cancels the not-yet-fired task previously
/// scheduled for the same key, so only the last value within a debounce
/// window is committed. Cancellation aborts the timer before the task body
/// runs; no partial state is written.
#[derive(Default)]
pub struct Debouncer {
    pending: Mutex<HashMap<DebounceKey, JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` to run after `delay`, replacing any pending task for
    /// the same key. Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: DebounceKey, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut pending = self.pending.lock().unwrap();
        if let Some(previous) = pending.insert(key, handle) {
            previous.abort();
        }
    }

    /// Cancels the pending task for the key, if any.
    pub fn cancel(&self, key: &DebounceKey) {
        if let Some(handle) = self.pending.lock().unwrap().remove(key) {
            handle.abort();
        }
    }
}
