use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::inventory::{ChestRestrictions, MAX_ROWS};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub chests: ChestConfig,
    pub cache: CacheConfig,
    pub translations: toml::Table,
}

/// Encoding used when saving. Both are always accepted when loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageFormat {
    #[default]
    Binary,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub format: StorageFormat,
    pub directory: PathBuf,
    /// Name of the item list inside a stored inventory.
    pub inventory_tag: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            format: StorageFormat::Binary,
            directory: PathBuf::from("chests"),
            inventory_tag: "Inventory".to_owned(),
        }
    }
}

/// Rows of newly created chests, also the minimum for chests stored without a row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChestConfig {
    pub player_rows: i32,
    pub public_rows: i32,
    pub default_rows: i32,
}

impl Default for ChestConfig {
    fn default() -> Self {
        Self {
            player_rows: 3,
            public_rows: 3,
            default_rows: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of unsaved inventories that triggers a flush.
    pub max_dirty: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_dirty: 64 }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded config from {}.", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).map_err(|source| ConfigError::Write {
            path: path.to_owned(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rows = [
            ("chests.player_rows", self.chests.player_rows),
            ("chests.public_rows", self.chests.public_rows),
            ("chests.default_rows", self.chests.default_rows),
        ];
        for (field, value) in rows {
            if ChestRestrictions::new(value, 0, true).is_err() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is not between 1 and {MAX_ROWS}"),
                });
            }
        }
        if self.cache.max_dirty == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.max_dirty",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.storage.inventory_tag.is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage.inventory_tag",
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}
