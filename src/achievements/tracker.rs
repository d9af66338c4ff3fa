use super::catalog::DefinitionCatalog;
use super::models::UserAchievementProgress;
use crate::documents::{DocKey, DocumentStore, DocumentStoreError};
use anyhow::Context;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Maintains per-user achievement counters and their derived levels.
///
/// Levels are always recomputed from the definition's threshold list inside
/// the same atomic update that moved the counter, never incremented on their
/// own, so counter and level cannot drift apart even when deltas arrive out
/// of order or an update is re-run after a lost commit race.
pub struct AchievementTracker {
    documents: Arc<dyn DocumentStore>,
    catalog: Arc<dyn DefinitionCatalog>,
}

impl AchievementTracker {
    pub fn new(documents: Arc<dyn DocumentStore>, catalog: Arc<dyn DefinitionCatalog>) -> Self {
        Self { documents, catalog }
    }

    pub fn catalog(&self) -> &dyn DefinitionCatalog {
        self.catalog.as_ref()
    }

    /// Returns the user's progress document, empty when nothing was written yet.
    pub fn overview(&self, user: &str) -> Result<UserAchievementProgress, DocumentStoreError> {
        let key = DocKey::achievements(user);
        match self.documents.read(&key)? {
            Some(value) => parse_progress(&key, value),
            None => Ok(UserAchievementProgress::default()),
        }
    }

    /// Applies `delta` to every counter in `keys` and rederives the affected
    /// levels, all in one atomic update. Counters never go below zero. A key
    /// without a matching definition keeps a level of zero but does not fail
    /// the batch.
    pub fn apply_delta(
        &self,
        user: &str,
        keys: &[&str],
        delta: i64,
    ) -> Result<UserAchievementProgress, DocumentStoreError> {
        let keys: BTreeSet<&str> = keys.iter().copied().collect();
        let key = DocKey::achievements(user);

        let committed = self.documents.atomic_update(&key, &|prior| {
            let mut state = match prior {
                Some(value) => serde_json::from_value::<UserAchievementProgress>(value)
                    .context("Achievement document does not match the progress shape")?,
                None => UserAchievementProgress::default(),
            };

            for id in &keys {
                let counter = state.progress.entry(id.to_string()).or_insert(0);
                *counter = (*counter + delta).max(0);
            }

            for id in &keys {
                let value = state.progress.get(*id).copied().unwrap_or(0);
                let thresholds = self
                    .catalog
                    .get(id)
                    .map(|definition| definition.thresholds.as_slice())
                    .unwrap_or(&[]);
                let level = thresholds.iter().filter(|t| value >= **t).count() as i64;
                state.levels.insert(id.to_string(), level);
            }

            Ok(serde_json::to_value(state)?)
        })?;

        parse_progress(&key, committed)
    }
}

fn parse_progress(
    key: &DocKey,
    value: serde_json::Value,
) -> Result<UserAchievementProgress, DocumentStoreError> {
    serde_json::from_value(value).map_err(|source| DocumentStoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}
