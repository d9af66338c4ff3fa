use super::collection_store::CollectionStore;
use super::debounce::{DebounceKey, Debouncer, EditField};
use super::models::TrackedItem;
use crate::achievements::{
    project, Achievement, AchievementTracker, DefinitionCatalog, GIVE_RATINGS_KEY, TOTAL_ITEMS_KEY,
};
use crate::documents::DocumentStore;
use crate::stats::{StatsAggregator, StatsSummary};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Quiet periods applied to interactive field edits before the write and its
/// aggregate updates are committed.
#[derive(Debug, Clone)]
pub struct DebounceSettings {
    pub rating: Duration,
    pub dates: Duration,
    pub note: Duration,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            rating: Duration::from_millis(500),
            dates: Duration::from_millis(500),
            note: Duration::from_millis(1000),
        }
    }
}

/// Owns the item lifecycle and the event policy that feeds the aggregates:
/// which item changes update the stats summary and which achievement
/// counters they move.
///
/// The item write and the aggregate updates are separate operations with no
/// cross-document atomicity; a crash in between leaves the aggregates out of
/// sync with the items. That gap is inherited from the original design and
/// accepted here.
pub struct CollectionService {
    collection: Arc<dyn CollectionStore>,
    stats: StatsAggregator,
    achievements: AchievementTracker,
    debouncer: Debouncer,
    debounce: DebounceSettings,
}

impl CollectionService {
    pub fn new(
        collection: Arc<dyn CollectionStore>,
        documents: Arc<dyn DocumentStore>,
        catalog: Arc<dyn DefinitionCatalog>,
        debounce: DebounceSettings,
    ) -> Self {
        Self {
            collection,
            stats: StatsAggregator::new(Arc::clone(&documents)),
            achievements: AchievementTracker::new(documents, catalog),
            debouncer: Debouncer::new(),
            debounce,
        }
    }

    /// Adds a catalog item to the user's collection and folds any initial
    /// rating / completion date into the aggregates.
    pub fn add_item(&self, user: &str, item: TrackedItem) -> Result<TrackedItem> {
        if self.collection.get_item(user, item.media_id)?.is_some() {
            bail!("Item {} is already in the collection", item.media_id);
        }
        self.collection.upsert_item(user, &item)?;

        self.stats
            .on_item_added(user, item.media_type, item.user_rating, item.completion_date)?;

        let mut keys = Vec::new();
        if item.user_rating.is_some() {
            keys.push(GIVE_RATINGS_KEY);
        }
        if item.completion_date.is_some() {
            keys.push(item.media_type.completion_achievement_key());
        }
        if !keys.is_empty() {
            self.achievements.apply_delta(user, &keys, 1)?;
        }

        debug!("add_item({user}, {}) done", item.media_id);
        Ok(item)
    }

    pub fn get_item(&self, user: &str, media_id: i64) -> Result<Option<TrackedItem>> {
        self.collection.get_item(user, media_id)
    }

    pub fn get_user_items(&self, user: &str) -> Result<Vec<TrackedItem>> {
        self.collection.get_user_items(user)
    }

    /// Commits a rating edit immediately.
    pub fn set_rating_now(&self, user: &str, media_id: i64, rating: u8) -> Result<()> {
        let item = self
            .collection
            .get_item(user, media_id)?
            .with_context(|| format!("Item {} not found for user {}", media_id, user))?;

        self.collection.set_rating(user, media_id, rating)?;
        self.stats
            .on_rating_changed(user, item.user_rating, rating)?;

        // The achievement counter moves only on the first rating ever given
        // to this item; replacing a rating is not another "give a rating"
        if item.user_rating.is_none() {
            self.achievements
                .apply_delta(user, &[GIVE_RATINGS_KEY], 1)?;
        }
        Ok(())
    }

    /// Schedules a rating edit behind the rating debounce window.
    pub fn set_rating_debounced(self: Arc<Self>, user: &str, media_id: i64, rating: u8) {
        let service = Arc::clone(&self);
        let user = user.to_string();
        let key = DebounceKey {
            user: user.clone(),
            media_id,
            field: EditField::Rating,
        };
        self.debouncer.schedule(key, self.debounce.rating, async move {
            if let Err(err) = service.set_rating_now(&user, media_id, rating) {
                warn!("Deferred rating write failed for {user}/{media_id}: {err:#}");
            }
        });
    }

    /// Commits a start/completion date edit immediately. Only a completion
    /// date touches the aggregates.
    pub fn set_dates_now(
        &self,
        user: &str,
        media_id: i64,
        start_date: Option<NaiveDate>,
        completion_date: Option<NaiveDate>,
    ) -> Result<()> {
        let item = self
            .collection
            .get_item(user, media_id)?
            .with_context(|| format!("Item {} not found for user {}", media_id, user))?;

        self.collection
            .set_dates(user, media_id, start_date, completion_date)?;

        if let Some(date) = completion_date {
            self.stats
                .on_completion_date_changed(user, item.completion_date, date)?;
            if item.completion_date.is_none() {
                self.achievements.apply_delta(
                    user,
                    &[item.media_type.completion_achievement_key()],
                    1,
                )?;
            }
        }
        Ok(())
    }

    /// Schedules a date edit behind the dates debounce window.
    pub fn set_dates_debounced(
        self: Arc<Self>,
        user: &str,
        media_id: i64,
        start_date: Option<NaiveDate>,
        completion_date: Option<NaiveDate>,
    ) {
        let service = Arc::clone(&self);
        let user = user.to_string();
        let key = DebounceKey {
            user: user.clone(),
            media_id,
            field: EditField::Dates,
        };
        self.debouncer.schedule(key, self.debounce.dates, async move {
            if let Err(err) = service.set_dates_now(&user, media_id, start_date, completion_date) {
                warn!("Deferred date write failed for {user}/{media_id}: {err:#}");
            }
        });
    }

    /// Commits a note edit immediately. Notes never touch the aggregates.
    pub fn set_note_now(&self, user: &str, media_id: i64, note: &str) -> Result<()> {
        self.collection.set_note(user, media_id, note)
    }

    /// Schedules a note edit behind the note debounce window.
    pub fn set_note_debounced(self: Arc<Self>, user: &str, media_id: i64, note: String) {
        let service = Arc::clone(&self);
        let user = user.to_string();
        let key = DebounceKey {
            user: user.clone(),
            media_id,
            field: EditField::Note,
        };
        self.debouncer.schedule(key, self.debounce.note, async move {
            if let Err(err) = service.set_note_now(&user, media_id, &note) {
                warn!("Deferred note write failed for {user}/{media_id}: {err:#}");
            }
        });
    }

    /// Removes an item and best-effort rolls back the achievement counters it
    /// earned: the completion key if it was completed, the rating key if it
    /// was rated, plus the total-items counter. Week buckets and the rating
    /// average are intentionally not rolled back.
    pub fn delete_item(&self, user: &str, media_id: i64) -> Result<bool> {
        let Some(item) = self.collection.get_item(user, media_id)? else {
            return Ok(false);
        };

        self.collection.delete_item(user, media_id)?;
        self.stats.on_item_deleted(user, item.media_type)?;

        let mut keys = Vec::new();
        if item.completion_date.is_some() {
            keys.push(item.media_type.completion_achievement_key());
        }
        if item.user_rating.is_some() {
            keys.push(GIVE_RATINGS_KEY);
        }
        keys.push(TOTAL_ITEMS_KEY);
        self.achievements.apply_delta(user, &keys, -1)?;

        Ok(true)
    }

    pub fn stats_overview(&self, user: &str) -> Result<StatsSummary> {
        Ok(self.stats.overview(user)?)
    }

    /// Joins the definition catalog with the user's progress document into
    /// the list shown on the achievements screen, sorted by title.
    pub fn achievements_overview(&self, user: &str) -> Result<Vec<Achievement>> {
        let progress = self.achievements.overview(user)?;
        let mut items: Vec<Achievement> = self
            .achievements
            .catalog()
            .all()
            .iter()
            .map(|definition| {
                let value = progress.progress.get(&definition.id).copied().unwrap_or(0);
                let level = progress.levels.get(&definition.id).copied().unwrap_or(0);
                project(definition, value, level)
            })
            .collect();
        items.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(items)
    }
}
