//! Battler conditions (status effects).
//!
//! # Turn-based Duration
//!
//! Conditions store the number of the owner's own actions they still last.
//! Each time the owner's action becomes current the counters are decremented
//! once (during `ConditionHeal`) and conditions reaching zero are removed.
//! Conditions without a duration persist until cured by an action or death.

use arrayvec::ArrayVec;

use crate::config::BattleConfig;

/// Types of conditions a battler can carry.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum ConditionKind {
    // ========================================================================
    // Restrictions (the battler cannot act)
    // ========================================================================
    Sleep,
    Paralysis,
    Stun,

    // ========================================================================
    // Debuffs
    // ========================================================================
    Poison,
    Blind,
    Silence,
    Confusion,

    // ========================================================================
    // Buffs
    // ========================================================================
    /// Bounces reflectable effects back to their caster.
    Reflect,
    Protect,
}

impl ConditionKind {
    /// Returns true if this condition prevents its owner from acting.
    pub const fn prevents_action(self) -> bool {
        matches!(self, Self::Sleep | Self::Paralysis | Self::Stun)
    }
}

/// A single condition and its remaining duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveCondition {
    pub kind: ConditionKind,
    /// Remaining owner turns; `None` lasts until cured.
    pub remaining_turns: Option<u16>,
}

/// Conditions currently affecting a battler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionSet {
    conditions: ArrayVec<ActiveCondition, { BattleConfig::MAX_CONDITIONS }>,
}

impl ConditionSet {
    pub fn empty() -> Self {
        Self {
            conditions: ArrayVec::new(),
        }
    }

    pub fn has(&self, kind: ConditionKind) -> bool {
        self.conditions.iter().any(|c| c.kind == kind)
    }

    pub fn remaining_turns(&self, kind: ConditionKind) -> Option<u16> {
        self.conditions
            .iter()
            .find(|c| c.kind == kind)
            .and_then(|c| c.remaining_turns)
    }

    /// Adds a condition.
    ///
    /// If it is already present the longer duration wins (an unbounded
    /// duration beats any count). Returns false when the set is full.
    pub fn add(&mut self, kind: ConditionKind, turns: Option<u16>) -> bool {
        if let Some(existing) = self.conditions.iter_mut().find(|c| c.kind == kind) {
            existing.remaining_turns = match (existing.remaining_turns, turns) {
                (None, _) | (_, None) => None,
                (Some(a), Some(b)) => Some(a.max(b)),
            };
            return true;
        }

        self.conditions
            .try_push(ActiveCondition {
                kind,
                remaining_turns: turns,
            })
            .is_ok()
    }

    /// Removes a condition. Returns true if it was present.
    pub fn remove(&mut self, kind: ConditionKind) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| c.kind != kind);
        self.conditions.len() != before
    }

    /// Counts down one owner turn and removes the conditions that run out.
    ///
    /// Returns the expired kinds in the order they were added.
    pub fn tick_turn(&mut self) -> Vec<ConditionKind> {
        let mut expired = Vec::new();
        for condition in self.conditions.iter_mut() {
            if let Some(turns) = condition.remaining_turns.as_mut() {
                *turns = turns.saturating_sub(1);
                if *turns == 0 {
                    expired.push(condition.kind);
                }
            }
        }
        self.conditions
            .retain(|c| c.remaining_turns.is_none_or(|turns| turns > 0));
        expired
    }

    /// Returns true if any condition prevents acting.
    pub fn prevents_action(&self) -> bool {
        self.conditions.iter().any(|c| c.kind.prevents_action())
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveCondition> {
        self.conditions.iter()
    }
}
