//! Content factory for building battles from data files.

use std::path::{Path, PathBuf};

use battle_core::BattleConfig;

use crate::loaders::{BattleScenario, ConfigLoader, ItemLoader, LoadResult, ScenarioLoader, SkillLoader};
use crate::skills::{ItemTable, SkillTable};

/// Content factory that loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── battle.toml
/// ├── skills.ron
/// ├── items.ron
/// └── scenarios/
///     ├── slimes.ron
///     └── ambush.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Path to the directory containing data files
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load battle configuration from `battle.toml`.
    ///
    /// A missing file yields the default configuration.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        let path = self.data_dir.join("battle.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no battle config, using defaults");
            return Ok(BattleConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load skill catalog from `skills.ron`.
    pub fn load_skills(&self) -> LoadResult<SkillTable> {
        let path = self.data_dir.join("skills.ron");
        SkillLoader::load(&path)
    }

    /// Load item catalog from `items.ron`.
    pub fn load_items(&self) -> LoadResult<ItemTable> {
        let path = self.data_dir.join("items.ron");
        ItemLoader::load(&path)
    }

    /// Load a scenario from `scenarios/{name}.ron`.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the scenario file (without `.ron` extension)
    pub fn load_scenario(&self, name: &str) -> LoadResult<BattleScenario> {
        let path = self
            .data_dir
            .join("scenarios")
            .join(format!("{}.ron", name));
        ScenarioLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
