mod catalog;
mod models;
mod tracker;

pub use catalog::{DefinitionCatalog, StaticDefinitionCatalog};
pub use models::{project, Achievement, AchievementDefinition, UserAchievementProgress};
pub use tracker::AchievementTracker;

/// Counter bumped the first time an item receives a rating.
pub const GIVE_RATINGS_KEY: &str = "giveRatings";

/// Counter decremented (together with the earned keys) when an item is deleted.
pub const TOTAL_ITEMS_KEY: &str = "totalItems";
