//! Skill and item definitions.
//!
//! Definitions are plain data; [`crate::TableAlgorithm`] turns them into
//! outcomes. Both skills and items share [`EffectSpec`], so a potion and a
//! healing spell resolve through the same formula.

use std::collections::HashMap;

use battle_core::{ConditionKind, ItemId, SkillId};

/// What a skill or item does to each of its targets.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EffectSpec {
    /// Magic damage: `power + 2 * magic - defense / 2`, at least 1.
    Damage { power: u32 },
    /// Restores `power + magic` HP.
    Heal { power: u32 },
    /// Restores SP by a flat amount.
    Restore { power: u32 },
    Inflict {
        condition: ConditionKind,
        turns: Option<u16>,
    },
    Cure { condition: ConditionKind },
    /// Kills outright unless the target is protected.
    Death,
}

/// Targeting rule of a definition, resolved against the user's side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TargetScope {
    #[default]
    Opponent,
    AllOpponents,
    Ally,
    AllAllies,
    User,
}

impl TargetScope {
    pub fn is_offensive(self) -> bool {
        matches!(self, TargetScope::Opponent | TargetScope::AllOpponents)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillDefinition {
    pub id: u32,
    pub name: String,
    pub effect: EffectSpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scope: TargetScope,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sp_cost: u32,
    /// Bounces off targets under the reflect condition.
    #[cfg_attr(feature = "serde", serde(default))]
    pub reflectable: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub animation: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sound: Option<String>,
}

impl SkillDefinition {
    pub fn skill_id(&self) -> SkillId {
        SkillId(self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub id: u32,
    pub name: String,
    pub effect: EffectSpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scope: TargetScope,
    #[cfg_attr(feature = "serde", serde(default))]
    pub animation: Option<u32>,
}

impl ItemDefinition {
    pub fn item_id(&self) -> ItemId {
        ItemId(self.id)
    }
}

/// Skill catalog indexed by id.
#[derive(Clone, Debug, Default)]
pub struct SkillTable {
    skills: HashMap<SkillId, SkillDefinition>,
}

impl SkillTable {
    pub fn new(definitions: impl IntoIterator<Item = SkillDefinition>) -> Self {
        let mut table = Self::default();
        for definition in definitions {
            table.insert(definition);
        }
        table
    }

    /// Adds a definition. A later definition with the same id replaces the earlier one.
    pub fn insert(&mut self, definition: SkillDefinition) {
        if let Some(previous) = self.skills.insert(definition.skill_id(), definition) {
            tracing::warn!(id = previous.id, name = %previous.name, "skill definition replaced");
        }
    }

    pub fn get(&self, id: SkillId) -> Option<&SkillDefinition> {
        self.skills.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.skills.values()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// Item catalog indexed by id.
#[derive(Clone, Debug, Default)]
pub struct ItemTable {
    items: HashMap<ItemId, ItemDefinition>,
}

impl ItemTable {
    pub fn new(definitions: impl IntoIterator<Item = ItemDefinition>) -> Self {
        Self {
            items: definitions
                .into_iter()
                .map(|definition| (definition.item_id(), definition))
                .collect(),
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire(id: u32, power: u32) -> SkillDefinition {
        SkillDefinition {
            id,
            name: "Fire".to_owned(),
            effect: EffectSpec::Damage { power },
            scope: TargetScope::Opponent,
            sp_cost: 4,
            reflectable: true,
            animation: None,
            sound: None,
        }
    }

    #[test]
    fn later_definition_wins() {
        let table = SkillTable::new([fire(1, 10), fire(1, 25), fire(2, 5)]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(SkillId(1)).map(|s| &s.effect),
            Some(&EffectSpec::Damage { power: 25 })
        );
        assert!(table.get(SkillId(3)).is_none());
    }
}
