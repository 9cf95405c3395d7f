//! Skill and item catalog loaders.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::skills::{ItemDefinition, ItemTable, SkillDefinition, SkillTable};

/// Loader for the skill catalog from RON files.
pub struct SkillLoader;

impl SkillLoader {
    /// Load skills from a RON file.
    ///
    /// RON format: `Vec<SkillDefinition>`
    pub fn load(path: &Path) -> LoadResult<SkillTable> {
        let content = read_file(path)?;
        let definitions: Vec<SkillDefinition> = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse skill catalog RON at {:?}: {}", path, e))?;

        Ok(SkillTable::new(definitions))
    }
}

/// Loader for the item catalog from RON files.
pub struct ItemLoader;

impl ItemLoader {
    /// Load items from a RON file.
    ///
    /// RON format: `Vec<ItemDefinition>`
    pub fn load(path: &Path) -> LoadResult<ItemTable> {
        let content = read_file(path)?;
        let definitions: Vec<ItemDefinition> = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON at {:?}: {}", path, e))?;

        Ok(ItemTable::new(definitions))
    }
}
