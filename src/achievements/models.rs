use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Admin-managed achievement content, read-only to the server.
///
/// `thresholds` is a strictly ascending sequence; the derived level of a
/// counter is the number of thresholds it has met or exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    pub thresholds: Vec<i64>,
}

/// Per-user achievement counters and their derived levels, one singleton
/// document per user. Field names are the persisted wire contract.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAchievementProgress {
    pub progress: BTreeMap<String, i64>,
    pub levels: BTreeMap<String, i64>,
}

/// One achievement as presented to a client: the definition joined with the
/// user's counter, plus the fractional progress within the current level's
/// threshold band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Achievement {
    pub id: String,
    pub icon: String,
    pub title: String,
    pub subtitle: String,
    pub progress_value: i64,
    pub thresholds: Vec<i64>,
    pub level: i64,
    /// Progress within the current band, in [0, 1]; 1 once the top level is
    /// reached (the band above the last threshold has zero width).
    pub fraction: f64,
    pub lower_text: String,
    pub upper_text: String,
}

/// Joins a definition with a user's counter and level. Pure, no I/O.
///
/// A level outside `[0, thresholds.len()]` (possible only with a corrupt
/// progress document) is clamped rather than trusted.
pub fn project(
    definition: &AchievementDefinition,
    progress_value: i64,
    level: i64,
) -> Achievement {
    let thresholds = &definition.thresholds;
    let level = level.clamp(0, thresholds.len() as i64);

    let lower = if level > 0 {
        thresholds[level as usize - 1]
    } else {
        0
    };
    let upper = if (level as usize) < thresholds.len() {
        thresholds[level as usize]
    } else {
        thresholds.last().copied().unwrap_or(lower)
    };
    let fraction = if upper > lower {
        (progress_value - lower) as f64 / (upper - lower) as f64
    } else {
        1.0
    };

    Achievement {
        id: definition.id.clone(),
        icon: definition.icon.clone(),
        title: definition.title.clone(),
        subtitle: definition.subtitle.clone(),
        progress_value,
        thresholds: thresholds.clone(),
        level,
        fraction,
        lower_text: lower.to_string(),
        upper_text: upper.to_string(),
    }
}
