//! Data-driven battle content.
//!
//! This crate supplies the pieces `battle-core` leaves to its host:
//! - [`TableAlgorithm`]: damage, hit and escape formulas over skill/item tables
//! - [`TacticalAi`]: deterministic enemy and auto-battle commands
//! - [`ScriptedCommands`]: pre-recorded party commands
//! - loaders for TOML configuration and RON catalogs and scenarios
//!
//! Nothing here touches battle state directly; everything reaches the scene
//! through the `battle-core` provider traits.

pub mod ai;
pub mod algorithm;
pub mod script;
pub mod skills;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use ai::TacticalAi;
pub use algorithm::TableAlgorithm;
pub use script::ScriptedCommands;
pub use skills::{EffectSpec, ItemDefinition, ItemTable, SkillDefinition, SkillTable, TargetScope};

#[cfg(feature = "loaders")]
pub use loaders::{
    ActionSpec, BattleScenario, BattlerSpec, CommandSpec, ConfigLoader, ContentFactory,
    ItemLoader, LoadResult, ScenarioLoader, SkillLoader, TargetSpec,
};
