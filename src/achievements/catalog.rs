use super::models::AchievementDefinition;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Read-only lookup of achievement definitions, keyed by stable string id.
pub trait DefinitionCatalog: Send + Sync {
    /// Returns the definition for the id, or None for an unknown key.
    fn get(&self, id: &str) -> Option<&AchievementDefinition>;

    /// Returns every definition, in catalog order.
    fn all(&self) -> &[AchievementDefinition];
}

/// In-memory catalog, either the built-in content or loaded from an
/// admin-managed TOML file.
pub struct StaticDefinitionCatalog {
    definitions: Vec<AchievementDefinition>,
    by_id: HashMap<String, usize>,
}

impl StaticDefinitionCatalog {
    pub fn from_definitions(definitions: Vec<AchievementDefinition>) -> Result<Self> {
        let mut by_id = HashMap::new();
        for (index, definition) in definitions.iter().enumerate() {
            if !definition
                .thresholds
                .windows(2)
                .all(|pair| pair[0] < pair[1])
            {
                bail!(
                    "Achievement {} thresholds must be strictly ascending: {:?}",
                    definition.id,
                    definition.thresholds
                );
            }
            if by_id.insert(definition.id.clone(), index).is_some() {
                bail!("Duplicate achievement id {}", definition.id);
            }
        }
        Ok(Self {
            definitions,
            by_id,
        })
    }

    /// The definitions shipped with the app, used when no catalog file is
    /// configured.
    pub fn builtin() -> Self {
        let defs = |id: &str, title: &str, subtitle: &str, icon: &str, thresholds: &[i64]| {
            AchievementDefinition {
                id: id.to_string(),
                title: title.to_string(),
                subtitle: subtitle.to_string(),
                icon: icon.to_string(),
                thresholds: thresholds.to_vec(),
            }
        };
        Self::from_definitions(vec![
            defs(
                "watchMovies",
                "Movie Marathoner",
                "Finish movies",
                "film",
                &[1, 10, 50],
            ),
            defs(
                "finishTVShows",
                "Binge Watcher",
                "Finish TV shows",
                "tv",
                &[1, 5, 25],
            ),
            defs(
                "readBooks",
                "Bookworm",
                "Finish books",
                "book",
                &[1, 10, 50],
            ),
            defs(
                "giveRatings",
                "Critic",
                "Rate items in your collection",
                "star",
                &[1, 10, 50],
            ),
            defs(
                "totalItems",
                "Collector",
                "Grow your collection",
                "tray.full",
                &[1, 25, 100],
            ),
        ])
        .expect("Built-in achievement definitions are valid")
    }

    pub fn from_toml_file<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read achievements file {:?}", path))?;
        let file: CatalogFile = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse achievements file {:?}", path))?;
        Self::from_definitions(file.achievement)
    }
}

impl DefinitionCatalog for StaticDefinitionCatalog {
    fn get(&self, id: &str) -> Option<&AchievementDefinition> {
        self.by_id.get(id).map(|index| &self.definitions[*index])
    }

    fn all(&self) -> &[AchievementDefinition] {
        &self.definitions
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    achievement: Vec<AchievementDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_the_content_keys() {
        let catalog = StaticDefinitionCatalog::builtin();
        for id in [
            "watchMovies",
            "finishTVShows",
            "readBooks",
            "giveRatings",
            "totalItems",
        ] {
            let definition = catalog.get(id).unwrap();
            assert_eq!(definition.id, id);
            assert!(!definition.thresholds.is_empty());
        }
        assert!(catalog.get("unknownKey").is_none());
        assert_eq!(catalog.all().len(), 5);
    }

    #[test]
    fn rejects_non_ascending_thresholds() {
        let result = StaticDefinitionCatalog::from_definitions(vec![AchievementDefinition {
            id: "bad".to_string(),
            title: "Bad".to_string(),
            subtitle: "".to_string(),
            icon: "".to_string(),
            thresholds: vec![10, 10, 50],
        }]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let definition = AchievementDefinition {
            id: "dup".to_string(),
            title: "Dup".to_string(),
            subtitle: "".to_string(),
            icon: "".to_string(),
            thresholds: vec![1],
        };
        let result =
            StaticDefinitionCatalog::from_definitions(vec![definition.clone(), definition]);
        assert!(result.is_err());
    }

    #[test]
    fn loads_definitions_from_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("achievements.toml");
        std::fs::write(
            &path,
            r#"
[[achievement]]
id = "watchMovies"
title = "Movie Marathoner"
subtitle = "Finish movies"
icon = "film"
thresholds = [1, 3]

[[achievement]]
id = "giveRatings"
title = "Critic"
subtitle = "Rate items"
icon = "star"
thresholds = [2, 4, 8]
"#,
        )
        .unwrap();

        let catalog = StaticDefinitionCatalog::from_toml_file(&path).unwrap();
        assert_eq!(catalog.all().len(), 2);
        assert_eq!(catalog.get("watchMovies").unwrap().thresholds, vec![1, 3]);
        assert_eq!(
            catalog.get("giveRatings").unwrap().thresholds,
            vec![2, 4, 8]
        );
    }

    #[test]
    fn toml_with_bad_thresholds_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("achievements.toml");
        std::fs::write(
            &path,
            r#"
[[achievement]]
id = "watchMovies"
title = "Movie Marathoner"
subtitle = "Finish movies"
icon = "film"
thresholds = [50, 10]
"#,
        )
        .unwrap();

        assert!(StaticDefinitionCatalog::from_toml_file(&path).is_err());
    }
}
