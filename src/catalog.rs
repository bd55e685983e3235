//! Ordered list of levels: the built-in set, or a custom list loaded from JSON.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::grid::Position;
use crate::level::LevelConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<LevelConfig>,
}

impl LevelCatalog {
    /// The three levels that ship with the game.
    pub fn builtin() -> Self {
        let start = Position::new(0, 0);
        Self {
            levels: vec![
                LevelConfig::new(1, "Level 1 - First Step", start).with_star(Position::new(4, 4)),
                LevelConfig::new(2, "Level 2 - Intermediate", start).with_star(Position::new(3, 2)),
                LevelConfig::new(3, "Level 3 - Advanced", start).with_star(Position::new(2, 4)),
            ],
        }
    }

    /// Validates and wraps a list of levels. Order is play order.
    pub fn from_levels(levels: Vec<LevelConfig>) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for level in &levels {
            if !seen.insert(level.id) {
                return Err(CatalogError::DuplicateId(level.id));
            }
            level.validate()?;
        }
        debug!(count = levels.len(), "level catalog built");
        Ok(Self { levels })
    }

    /// Parses a JSON array of levels, as saved by the level editor.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let levels: Vec<LevelConfig> = serde_json::from_str(json)?;
        let catalog = Self::from_levels(levels)?;
        info!(count = catalog.len(), "custom levels loaded");
        Ok(catalog)
    }

    /// Pretty-printed JSON in the same shape [`from_json_str`](Self::from_json_str) reads.
    pub fn to_json_string(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(&self.levels)?)
    }

    /// All levels in play order.
    pub fn levels(&self) -> &[LevelConfig] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The opening level. A catalog is never empty.
    pub fn first(&self) -> &LevelConfig {
        &self.levels[0]
    }

    /// Looks a level up by id.
    pub fn get(&self, id: u32) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.id == id)
    }

    /// Like [`get`](Self::get), with a [`CatalogError::NotFound`] for unknown ids.
    pub fn level(&self, id: u32) -> Result<&LevelConfig, CatalogError> {
        self.get(id).ok_or(CatalogError::NotFound(id))
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        self.levels.iter().position(|l| l.id == id)
    }

    /// Whether `id` opens the list.
    pub fn is_first(&self, id: u32) -> bool {
        self.index_of(id) == Some(0)
    }

    /// Whether `id` closes the list.
    pub fn is_last(&self, id: u32) -> bool {
        self.index_of(id) == Some(self.levels.len() - 1)
    }

    /// Id of the level after `id`, if there is one.
    pub fn next_id(&self, id: u32) -> Option<u32> {
        let idx = self.index_of(id)?;
        self.levels.get(idx + 1).map(|l| l.id)
    }

    /// Id of the level before `id`, if there is one.
    pub fn previous_id(&self, id: u32) -> Option<u32> {
        let idx = self.index_of(id)?;
        idx.checked_sub(1).map(|i| self.levels[i].id)
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
