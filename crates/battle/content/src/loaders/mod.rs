//! Content loaders for reading battle data from files.
//!
//! Configuration comes from TOML; skills, items and scenarios from RON.

pub mod config;
pub mod factory;
pub mod scenario;
pub mod skills;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use scenario::{
    ActionSpec, BattleScenario, BattlerSpec, CommandSpec, ScenarioLoader, TargetSpec,
};
pub use skills::{ItemLoader, SkillLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
