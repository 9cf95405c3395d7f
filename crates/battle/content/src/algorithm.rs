//! Table-driven outcome formulas.
//!
//! Every number is a pure function of the battlers involved; the "dice" are a
//! hash of ids and current HP, so replaying the same battle with the same
//! commands reproduces it exactly.

use battle_core::{
    ActionKind, AlgorithmError, AlgorithmProvider, Battler, ConditionChange, ConditionKind, ItemId, Outcome,
    OutcomeFlags, Roster, Side, SkillId,
};

use crate::skills::{EffectSpec, ItemTable, SkillTable};

/// Percent chance (0..100) of a critical physical hit.
pub const DEFAULT_CRITICAL_PERCENT: u32 = 5;

/// Percent chance of a blinded attacker missing.
const BLIND_MISS_PERCENT: u32 = 50;

/// [`AlgorithmProvider`] backed by skill and item tables.
#[derive(Clone, Debug, Default)]
pub struct TableAlgorithm {
    skills: SkillTable,
    items: ItemTable,
    critical_percent: u32,
}

impl TableAlgorithm {
    pub fn new(skills: SkillTable, items: ItemTable) -> Self {
        Self {
            skills,
            items,
            critical_percent: DEFAULT_CRITICAL_PERCENT,
        }
    }

    #[must_use]
    pub fn with_critical_percent(mut self, percent: u32) -> Self {
        self.critical_percent = percent.min(100);
        self
    }

    pub fn skills(&self) -> &SkillTable {
        &self.skills
    }

    fn attack(&self, source: &Battler, target: &Battler) -> Outcome {
        let start = format!("{} attacks!", source.name);

        if source.conditions.has(ConditionKind::Blind)
            && roll(source, target, Salt::Accuracy) < BLIND_MISS_PERCENT
        {
            return Outcome::new(start)
                .with_flags(OutcomeFlags::MISSED)
                .with_result_line(format!("{} misses!", source.name));
        }

        let mut damage = source
            .stats
            .attack
            .saturating_mul(2)
            .saturating_sub(target.stats.defense)
            .max(1);
        let mut outcome = Outcome::new(start).with_animation(1).with_sound("attack");
        if roll(source, target, Salt::Critical) < self.critical_percent {
            damage = damage.saturating_mul(2);
            outcome = outcome
                .with_second_line("A critical hit!")
                .with_flags(OutcomeFlags::CRITICAL);
        }
        let damage = shielded(target, damage);

        outcome
            .with_hp_delta(-to_delta(damage))
            .with_result_line(format!("{} takes {} damage.", target.name, damage))
    }

    fn skill(&self, id: SkillId, source: &Battler, target: &Battler) -> Result<Outcome, AlgorithmError> {
        let skill = self
            .skills
            .get(id)
            .ok_or_else(|| AlgorithmError::UnknownDefinition {
                kind: "skill",
                detail: format!("id {}", id.0),
            })?;

        if source.conditions.has(ConditionKind::Silence) {
            return Ok(Outcome::new(format!("{} tries to cast {}...", source.name, skill.name))
                .with_flags(OutcomeFlags::MISSED)
                .with_result_line(format!("{} is silenced!", source.name)));
        }

        let start = format!("{} casts {}!", source.name, skill.name);
        let mut outcome = effect(&skill.effect, source, target, start).with_sp_cost(skill.sp_cost);
        if skill.reflectable {
            outcome = outcome.with_flags(OutcomeFlags::REFLECTABLE);
        }
        if let Some(animation) = skill.animation {
            outcome = outcome.with_animation(animation);
        }
        if let Some(sound) = &skill.sound {
            outcome = outcome.with_sound(sound.clone());
        }
        Ok(outcome)
    }

    fn item(&self, id: ItemId, source: &Battler, target: &Battler) -> Result<Outcome, AlgorithmError> {
        let item = self
            .items
            .get(id)
            .ok_or_else(|| AlgorithmError::UnknownDefinition {
                kind: "item",
                detail: format!("id {}", id.0),
            })?;

        let start = format!("{} uses {}!", source.name, item.name);
        let mut outcome = effect(&item.effect, source, target, start);
        if let Some(animation) = item.animation {
            outcome = outcome.with_animation(animation);
        }
        Ok(outcome)
    }

    fn escape(&self, source: &Battler, roster: &Roster) -> Outcome {
        if source.side == Side::Enemy {
            return Outcome::new(format!("{} runs away!", source.name))
                .with_flags(OutcomeFlags::ESCAPED);
        }

        let party = average_agility(roster, Side::Actor);
        let troop = average_agility(roster, Side::Enemy).max(1);
        let chance = (50 + (party as i64 - troop as i64) * 2).clamp(10, 95) as u32;

        let outcome = Outcome::new(format!("{} tries to flee...", source.name));
        if roll(source, source, Salt::Escape) < chance {
            outcome.with_flags(OutcomeFlags::ESCAPED)
        } else {
            outcome.with_result_line("Couldn't escape!")
        }
    }
}

impl AlgorithmProvider for TableAlgorithm {
    fn compute(
        &self,
        source: &Battler,
        target: &Battler,
        kind: &ActionKind,
        roster: &Roster,
    ) -> Result<Outcome, AlgorithmError> {
        match kind {
            ActionKind::Attack => Ok(self.attack(source, target)),
            ActionKind::Skill(id) => self.skill(*id, source, target),
            ActionKind::Item(id) => self.item(*id, source, target),
            ActionKind::Defend => Ok(Outcome::new(format!("{} is on guard.", source.name))
                .with_condition(ConditionChange::new(ConditionKind::Protect, Some(1)))),
            ActionKind::Escape => Ok(self.escape(source, roster)),
            ActionKind::Wait => Ok(Outcome::new(format!("{} waits.", source.name))),
        }
    }
}

fn effect(effect: &EffectSpec, source: &Battler, target: &Battler, start: String) -> Outcome {
    let outcome = Outcome::new(start);
    match effect {
        EffectSpec::Damage { power } => {
            let damage = power
                .saturating_add(source.stats.magic.saturating_mul(2))
                .saturating_sub(target.stats.defense / 2)
                .max(1);
            let damage = shielded(target, damage);
            outcome
                .with_hp_delta(-to_delta(damage))
                .with_result_line(format!("{} takes {} damage.", target.name, damage))
        }
        EffectSpec::Heal { power } => {
            let amount = power.saturating_add(source.stats.magic);
            outcome
                .with_hp_delta(to_delta(amount))
                .with_result_line(format!("{} recovers {} HP.", target.name, amount))
        }
        EffectSpec::Restore { power } => outcome
            .with_sp_delta(to_delta(*power))
            .with_result_line(format!("{} recovers {} SP.", target.name, power)),
        EffectSpec::Inflict { condition, turns } => {
            if target.conditions.has(ConditionKind::Protect) {
                return unaffected(outcome, target);
            }
            outcome
                .with_condition(ConditionChange::new(*condition, *turns))
                .with_result_line(format!("{} is afflicted with {}.", target.name, condition))
        }
        EffectSpec::Cure { condition } => outcome
            .with_cure(*condition)
            .with_result_line(format!("{} is cured of {}.", target.name, condition)),
        EffectSpec::Death => {
            if target.conditions.has(ConditionKind::Protect) {
                return unaffected(outcome, target);
            }
            outcome
                .with_flags(OutcomeFlags::KILLS)
                .with_result_line(format!("{} is struck down!", target.name))
        }
    }
}

fn unaffected(outcome: Outcome, target: &Battler) -> Outcome {
    outcome
        .with_flags(OutcomeFlags::MISSED)
        .with_result_line(format!("{} is unaffected.", target.name))
}

/// Protect halves incoming damage.
fn shielded(target: &Battler, damage: u32) -> u32 {
    if target.conditions.has(ConditionKind::Protect) {
        (damage / 2).max(1)
    } else {
        damage
    }
}

fn to_delta(amount: u32) -> i32 {
    amount.min(i32::MAX as u32) as i32
}

fn average_agility(roster: &Roster, side: Side) -> u32 {
    let (sum, count) = roster
        .targetable(side)
        .fold((0u64, 0u64), |(sum, count), b| (sum + b.stats.agility as u64, count + 1));
    if count == 0 { 0 } else { (sum / count) as u32 }
}

#[derive(Clone, Copy)]
enum Salt {
    Accuracy = 0x51,
    Critical = 0xC7,
    Escape = 0xE5,
}

/// Deterministic percentile in `0..100` derived from the two battlers.
fn roll(source: &Battler, target: &Battler, salt: Salt) -> u32 {
    let mut x = source.id.0.wrapping_mul(0x9E37_79B9)
        ^ target.id.0.wrapping_mul(0x85EB_CA6B)
        ^ target.hp.current.wrapping_mul(0xC2B2_AE35)
        ^ salt as u32;
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    x % 100
}
