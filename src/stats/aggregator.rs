use super::models::StatsSummary;
use super::week::iso_week_key;
use crate::collection::MediaType;
use crate::documents::{DocKey, DocumentStore, DocumentStoreError};
use anyhow::Context;
use chrono::NaiveDate;
use std::sync::Arc;

/// Maintains each user's [`StatsSummary`] incrementally as tracked items
/// change, without ever re-scanning the item collection.
///
/// Every operation is one atomic read-modify-write against the user's stats
/// document. The state transitions are pure functions of the freshly-read
/// summary plus the event, so the document store may safely re-run them when
/// a commit loses a race.
///
/// Known gaps, kept on purpose: moving an already-set completion date does
/// not decrement the old week bucket, and deleting an item rolls back
/// neither its week bucket nor its rating's contribution to the average.
pub struct StatsAggregator {
    documents: Arc<dyn DocumentStore>,
}

impl StatsAggregator {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Returns the user's current summary, zeroed when nothing was written yet.
    pub fn overview(&self, user: &str) -> Result<StatsSummary, DocumentStoreError> {
        match self.documents.read(&DocKey::stats(user))? {
            Some(value) => parse_summary(&DocKey::stats(user), value),
            None => Ok(StatsSummary::default()),
        }
    }

    pub fn on_item_added(
        &self,
        user: &str,
        media_type: MediaType,
        initial_rating: Option<u8>,
        completion_date: Option<NaiveDate>,
    ) -> Result<StatsSummary, DocumentStoreError> {
        self.update(user, move |summary| {
            apply_item_added(summary, media_type, initial_rating, completion_date)
        })
    }

    pub fn on_rating_changed(
        &self,
        user: &str,
        old_rating: Option<u8>,
        new_rating: u8,
    ) -> Result<StatsSummary, DocumentStoreError> {
        self.update(user, move |summary| {
            apply_rating_changed(summary, old_rating, new_rating)
        })
    }

    pub fn on_completion_date_changed(
        &self,
        user: &str,
        old_date: Option<NaiveDate>,
        new_date: NaiveDate,
    ) -> Result<StatsSummary, DocumentStoreError> {
        self.update(user, move |summary| {
            apply_completion_date_changed(summary, old_date, new_date)
        })
    }

    pub fn on_item_deleted(
        &self,
        user: &str,
        media_type: MediaType,
    ) -> Result<StatsSummary, DocumentStoreError> {
        self.update(user, move |summary| apply_item_deleted(summary, media_type))
    }

    fn update<F>(&self, user: &str, transition: F) -> Result<StatsSummary, DocumentStoreError>
    where
        F: Fn(StatsSummary) -> StatsSummary,
    {
        let key = DocKey::stats(user);
        let committed = self.documents.atomic_update(&key, &|prior| {
            let summary = match prior {
                Some(value) => serde_json::from_value::<StatsSummary>(value)
                    .context("Stats document does not match the summary shape")?,
                None => StatsSummary::default(),
            };
            let next = transition(summary);
            Ok(serde_json::to_value(next)?)
        })?;
        parse_summary(&key, committed)
    }
}

fn parse_summary(key: &DocKey, value: serde_json::Value) -> Result<StatsSummary, DocumentStoreError> {
    serde_json::from_value(value).map_err(|source| DocumentStoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}

fn apply_item_added(
    mut summary: StatsSummary,
    media_type: MediaType,
    initial_rating: Option<u8>,
    completion_date: Option<NaiveDate>,
) -> StatsSummary {
    summary.total_items += 1;
    *summary
        .counts_by_type
        .entry(media_type.as_str().to_string())
        .or_insert(0) += 1;

    if let Some(rating) = initial_rating {
        // The pre-increment total is the prior sample count
        let total = summary.total_items;
        summary.average_rating =
            (summary.average_rating * (total - 1) as f64 + rating as f64) / total as f64;
    }

    if let Some(date) = completion_date {
        summary.completed_items += 1;
        *summary.counts_by_week.entry(iso_week_key(date)).or_insert(0) += 1;
    }

    summary
}

fn apply_rating_changed(
    mut summary: StatsSummary,
    old_rating: Option<u8>,
    new_rating: u8,
) -> StatsSummary {
    // Ratings never change totalItems; the average is always divided by the
    // current total, clamped to one sample to avoid division by zero.
    let total = summary.total_items.max(1) as f64;
    summary.average_rating = match old_rating {
        Some(old) => {
            let new_sum = summary.average_rating * total - old as f64 + new_rating as f64;
            new_sum / total
        }
        None => (summary.average_rating * total + new_rating as f64) / total,
    };
    summary
}

fn apply_completion_date_changed(
    mut summary: StatsSummary,
    old_date: Option<NaiveDate>,
    new_date: NaiveDate,
) -> StatsSummary {
    if old_date.is_none() {
        summary.completed_items += 1;
    }
    // The old date's week bucket is NOT decremented; countsByType is only
    // maintained on add and delete.
    *summary
        .counts_by_week
        .entry(iso_week_key(new_date))
        .or_insert(0) += 1;
    summary
}

fn apply_item_deleted(mut summary: StatsSummary, media_type: MediaType) -> StatsSummary {
    summary.total_items = (summary.total_items - 1).max(0);
    *summary
        .counts_by_type
        .entry(media_type.as_str().to_string())
        .or_insert(0) -= 1;
    summary
}
