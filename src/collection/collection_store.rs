use super::models::TrackedItem;
use anyhow::Result;
use chrono::NaiveDate;

/// Storage for the per-user collection of tracked media items.
///
/// Items are keyed by (user handle, external media id); one user tracks a
/// given catalog item at most once.
pub trait CollectionStore: Send + Sync {
    /// Inserts the item, or overwrites the user fields of an existing row
    /// with the same (user, media id).
    fn upsert_item(&self, user: &str, item: &TrackedItem) -> Result<()>;

    /// Returns the item for the given user and media id.
    /// Returns Ok(None) if the user does not track that item.
    /// Returns Err if there is a database error.
    fn get_item(&self, user: &str, media_id: i64) -> Result<Option<TrackedItem>>;

    /// Returns all items tracked by the user, oldest first.
    fn get_user_items(&self, user: &str) -> Result<Vec<TrackedItem>>;

    /// Sets the user rating of an item.
    /// Returns Err if the item does not exist.
    fn set_rating(&self, user: &str, media_id: i64, rating: u8) -> Result<()>;

    /// Updates the start and/or completion date of an item; a None field is
    /// left untouched.
    /// Returns Err if the item does not exist.
    fn set_dates(
        &self,
        user: &str,
        media_id: i64,
        start_date: Option<NaiveDate>,
        completion_date: Option<NaiveDate>,
    ) -> Result<()>;

    /// Sets the free-text note of an item.
    /// Returns Err if the item does not exist.
    fn set_note(&self, user: &str, media_id: i64, note: &str) -> Result<()>;

    /// Deletes an item. Returns true if a row was removed.
    fn delete_item(&self, user: &str, media_id: i64) -> Result<bool>;
}
