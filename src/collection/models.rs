use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
    Book,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Book => "book",
        }
    }

    /// The achievement counter bumped the first time an item of this type is
    /// completed.
    pub fn completion_achievement_key(&self) -> &'static str {
        match self {
            MediaType::Movie => "watchMovies",
            MediaType::Tv => "finishTVShows",
            MediaType::Book => "readBooks",
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            "book" => Ok(MediaType::Book),
            other => Err(format!("Unknown media type: {}", other)),
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One media item in a user's collection, with the user's own fields on top
/// of the external catalog id. Field names follow the original per-item
/// document schema (`watchedAtStart` / `watchedAtEnd` are the start and
/// completion dates).
///
/// The presence of `completion_date` is the sole signal of "completed"
/// status used by the aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    pub media_id: i64,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u8>,
    #[serde(
        rename = "watchedAtStart",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        rename = "watchedAtEnd",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub completion_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TrackedItem {
    pub fn new(media_id: i64, media_type: MediaType) -> Self {
        Self {
            media_id,
            media_type,
            user_rating: None,
            start_date: None,
            completion_date: None,
            note: None,
        }
    }
}
