//! Battle scenario loader.
//!
//! A scenario lists the party, the troop, the encounter condition and an
//! optional script of party commands. It is everything needed to build a
//! [`battle_core::BattleScene`] besides the catalogs.

use std::path::Path;

use battle_core::{
    ActionKind, ActionRequest, Battler, BattleCondition, BattlerId, BattlerStats, ConditionKind,
    ItemId, ScreenPosition, Side, SkillId, TargetSelection,
};

use crate::ai::TacticalAi;
use crate::loaders::{LoadResult, read_file};
use crate::script::ScriptedCommands;
use crate::skills::SkillTable;

/// One encounter, as written in `scenarios/*.ron`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BattleScenario {
    pub name: String,
    #[serde(default)]
    pub condition: BattleCondition,
    #[serde(default = "default_allow_escape")]
    pub allow_escape: bool,
    /// Let the AI command the party too.
    #[serde(default)]
    pub auto_battle: bool,
    pub party: Vec<BattlerSpec>,
    pub troop: Vec<BattlerSpec>,
    /// Party commands played back in order before the fallback takes over.
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

fn default_allow_escape() -> bool {
    true
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BattlerSpec {
    pub id: u32,
    pub name: String,
    pub hp: u32,
    #[serde(default)]
    pub sp: u32,
    #[serde(default)]
    pub stats: BattlerStats,
    /// Screen position of a troop member. Party members are placed by the
    /// formation and ignore it.
    #[serde(default)]
    pub position: Option<(i32, i32)>,
    #[serde(default)]
    pub conditions: Vec<(ConditionKind, Option<u16>)>,
    #[serde(default)]
    pub sprite: Option<String>,
    /// Skill ids the AI may pick for this battler.
    #[serde(default)]
    pub skills: Vec<u32>,
}

impl BattlerSpec {
    fn to_battler(&self, side: Side) -> Battler {
        let mut battler = Battler::new(BattlerId(self.id), self.name.clone(), side, self.hp)
            .with_sp(self.sp)
            .with_stats(self.stats);
        if let Some((x, y)) = self.position {
            battler = battler.with_position(ScreenPosition::new(x, y));
        }
        for &(kind, turns) in &self.conditions {
            battler = battler.with_condition(kind, turns);
        }
        if let Some(sprite) = &self.sprite {
            battler = battler.with_sprite(sprite.clone());
        }
        battler
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSpec {
    Attack,
    Skill(u32),
    Item(u32),
    Defend,
    Escape,
    Wait,
}

impl From<ActionSpec> for ActionKind {
    fn from(spec: ActionSpec) -> Self {
        match spec {
            ActionSpec::Attack => ActionKind::Attack,
            ActionSpec::Skill(id) => ActionKind::Skill(SkillId(id)),
            ActionSpec::Item(id) => ActionKind::Item(ItemId(id)),
            ActionSpec::Defend => ActionKind::Defend,
            ActionSpec::Escape => ActionKind::Escape,
            ActionSpec::Wait => ActionKind::Wait,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSpec {
    Single(u32),
    AllOpponents,
    AllAllies,
    Itself,
}

impl From<TargetSpec> for TargetSelection {
    fn from(spec: TargetSpec) -> Self {
        match spec {
            TargetSpec::Single(id) => TargetSelection::Single(BattlerId(id)),
            TargetSpec::AllOpponents => TargetSelection::AllOpponents,
            TargetSpec::AllAllies => TargetSelection::AllAllies,
            TargetSpec::Itself => TargetSelection::Itself,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CommandSpec {
    pub source: u32,
    pub action: ActionSpec,
    pub target: TargetSpec,
    #[serde(default = "default_combo")]
    pub combo: u8,
}

fn default_combo() -> u8 {
    1
}

impl From<CommandSpec> for ActionRequest {
    fn from(spec: CommandSpec) -> Self {
        ActionRequest::new(BattlerId(spec.source), spec.action.into(), spec.target.into())
            .with_combo(spec.combo)
    }
}

impl BattleScenario {
    /// Party members followed by troop members, in file order.
    pub fn battlers(&self) -> Vec<Battler> {
        self.party
            .iter()
            .map(|spec| spec.to_battler(Side::Actor))
            .chain(self.troop.iter().map(|spec| spec.to_battler(Side::Enemy)))
            .collect()
    }

    /// Party commands from the file, in order.
    pub fn script(&self) -> ScriptedCommands {
        ScriptedCommands::new(self.commands.iter().copied().map(ActionRequest::from))
    }

    /// AI that knows every battler's listed skills.
    pub fn tactical_ai(&self, skills: SkillTable) -> TacticalAi {
        self.party
            .iter()
            .chain(&self.troop)
            .fold(TacticalAi::new(skills), |ai, spec| {
                ai.with_known_skills(BattlerId(spec.id), spec.skills.iter().copied())
            })
    }
}

/// Loader for battle scenarios from RON files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load a scenario from a RON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the scenario RON file
    ///
    /// # Returns
    ///
    /// The parsed scenario. Fails if either side is empty or an id repeats.
    pub fn load(path: &Path) -> LoadResult<BattleScenario> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<BattleScenario> {
        let scenario: BattleScenario = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))?;

        if scenario.party.is_empty() {
            anyhow::bail!("Scenario '{}' has no party members", scenario.name);
        }
        if scenario.troop.is_empty() {
            anyhow::bail!("Scenario '{}' has no enemies", scenario.name);
        }

        let mut seen = std::collections::HashSet::new();
        for spec in scenario.party.iter().chain(&scenario.troop) {
            if !seen.insert(spec.id) {
                anyhow::bail!("Scenario '{}' repeats battler id {}", scenario.name, spec.id);
            }
        }
        for command in &scenario.commands {
            if !scenario.party.iter().any(|spec| spec.id == command.source) {
                anyhow::bail!(
                    "Scenario '{}' scripts a command for {}, which is not in the party",
                    scenario.name,
                    command.source
                );
            }
        }

        Ok(scenario)
    }
}
