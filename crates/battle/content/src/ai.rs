//! Deterministic command selection for enemies and auto battle.

use std::collections::HashMap;

use battle_core::{
    ActionKind, ActionRequest, Battler, BattlerId, CommandProvider, Roster, SkillId,
    TargetSelection,
};

use crate::skills::{EffectSpec, SkillDefinition, SkillTable, TargetScope};

/// Allies below this share of their max HP get healed first.
const HEAL_THRESHOLD_PERCENT: u32 = 35;

/// Picks the most useful known skill, otherwise attacks the weakest opponent.
///
/// Priorities, highest first:
/// 1. heal the most wounded ally under [`HEAL_THRESHOLD_PERCENT`]
/// 2. cast the strongest affordable damage skill at the weakest opponent
/// 3. attack the opponent with the lowest HP
///
/// Ties are broken by roster order, so the same state always yields the same
/// command.
#[derive(Clone, Debug, Default)]
pub struct TacticalAi {
    skills: SkillTable,
    known: HashMap<BattlerId, Vec<u32>>,
}

impl TacticalAi {
    pub fn new(skills: SkillTable) -> Self {
        Self {
            skills,
            known: HashMap::new(),
        }
    }

    /// Registers the skills a battler may use.
    #[must_use]
    pub fn with_known_skills(mut self, battler: BattlerId, skills: impl IntoIterator<Item = u32>) -> Self {
        self.known.entry(battler).or_default().extend(skills);
        self
    }

    fn usable<'a>(&'a self, battler: &'a Battler) -> impl Iterator<Item = &'a SkillDefinition> + 'a {
        self.known
            .get(&battler.id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.skills.get(SkillId(*id)))
            .filter(move |skill| skill.sp_cost <= battler.sp.current)
    }

    fn heal(&self, battler: &Battler, roster: &Roster) -> Option<ActionRequest> {
        let wounded = roster
            .targetable(battler.side)
            .filter(|ally| hp_percent(ally) < HEAL_THRESHOLD_PERCENT)
            .min_by_key(|ally| hp_percent(ally))?;

        let skill = self
            .usable(battler)
            .filter(|skill| matches!(skill.effect, EffectSpec::Heal { .. }))
            .max_by_key(|skill| match skill.effect {
                EffectSpec::Heal { power } => power,
                _ => 0,
            })?;

        let targets = match skill.scope {
            TargetScope::AllAllies => TargetSelection::AllAllies,
            TargetScope::User => TargetSelection::Itself,
            _ => TargetSelection::Single(wounded.id),
        };
        Some(ActionRequest::new(battler.id, ActionKind::Skill(skill.skill_id()), targets))
    }

    fn offense(&self, battler: &Battler, roster: &Roster) -> Option<ActionRequest> {
        let weakest = roster
            .targetable(battler.side.opponent())
            .min_by_key(|enemy| enemy.hp.current)?;

        let skill = self
            .usable(battler)
            .filter(|skill| skill.scope.is_offensive())
            .filter(|skill| matches!(skill.effect, EffectSpec::Damage { .. }))
            .max_by_key(|skill| match skill.effect {
                EffectSpec::Damage { power } => power,
                _ => 0,
            });

        Some(match skill {
            Some(skill) if skill.scope == TargetScope::AllOpponents => ActionRequest::new(
                battler.id,
                ActionKind::Skill(skill.skill_id()),
                TargetSelection::AllOpponents,
            ),
            Some(skill) => ActionRequest::new(
                battler.id,
                ActionKind::Skill(skill.skill_id()),
                TargetSelection::Single(weakest.id),
            ),
            None => ActionRequest::attack(battler.id, weakest.id),
        })
    }
}

impl CommandProvider for TacticalAi {
    fn select(&mut self, battler: &Battler, roster: &Roster) -> Option<ActionRequest> {
        let request = self
            .heal(battler, roster)
            .or_else(|| self.offense(battler, roster));
        if let Some(request) = &request {
            tracing::debug!(battler = %battler.id, kind = request.kind.name(), "ai selected command");
        }
        request
    }
}

fn hp_percent(battler: &Battler) -> u32 {
    if battler.hp.maximum == 0 {
        return 0;
    }
    (battler.hp.current as u64 * 100 / battler.hp.maximum as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{BattlerStats, ResourceMeter, Side};

    fn table() -> SkillTable {
        SkillTable::new([
            SkillDefinition {
                id: 1,
                name: "Fire".to_owned(),
                effect: EffectSpec::Damage { power: 10 },
                scope: TargetScope::Opponent,
                sp_cost: 4,
                reflectable: true,
                animation: None,
                sound: None,
            },
            SkillDefinition {
                id: 2,
                name: "Cure".to_owned(),
                effect: EffectSpec::Heal { power: 30 },
                scope: TargetScope::Ally,
                sp_cost: 3,
                reflectable: false,
                animation: None,
                sound: None,
            },
        ])
    }

    fn roster(shaman_hp: u32, shaman_sp: u32) -> Roster {
        Roster::new([
            Battler::new(BattlerId(1), "Knight", Side::Actor, 100),
            Battler::new(BattlerId(2), "Archer", Side::Actor, 60).with_hp(ResourceMeter::new(20, 60)),
            Battler::new(BattlerId(10), "Shaman", Side::Enemy, 50)
                .with_hp(ResourceMeter::new(shaman_hp, 50))
                .with_sp(12)
                .with_stats(BattlerStats::new(5, 5, 8, 5)),
        ])
        .map(|mut roster| {
            roster.get_mut(BattlerId(10)).unwrap().sp.current = shaman_sp;
            roster
        })
        .unwrap()
    }

    #[test]
    fn heals_a_badly_wounded_ally_first() {
        let roster = roster(10, 12);
        let mut ai = TacticalAi::new(table()).with_known_skills(BattlerId(10), [1, 2]);
        let shaman = roster.get(BattlerId(10)).unwrap();
        let request = ai.select(shaman, &roster).unwrap();
        assert_eq!(request.kind, ActionKind::Skill(SkillId(2)));
        assert_eq!(request.targets, TargetSelection::Single(BattlerId(10)));
    }

    #[test]
    fn casts_at_the_weakest_opponent() {
        let roster = roster(50, 12);
        let mut ai = TacticalAi::new(table()).with_known_skills(BattlerId(10), [1, 2]);
        let shaman = roster.get(BattlerId(10)).unwrap();
        let request = ai.select(shaman, &roster).unwrap();
        assert_eq!(request.kind, ActionKind::Skill(SkillId(1)));
        assert_eq!(request.targets, TargetSelection::Single(BattlerId(2)));
    }

    #[test]
    fn falls_back_to_attacking_without_sp() {
        let roster = roster(50, 0);
        let mut ai = TacticalAi::new(table()).with_known_skills(BattlerId(10), [1, 2]);
        let shaman = roster.get(BattlerId(10)).unwrap();
        assert_eq!(
            ai.select(shaman, &roster),
            Some(ActionRequest::attack(BattlerId(10), BattlerId(2)))
        );
    }
}
