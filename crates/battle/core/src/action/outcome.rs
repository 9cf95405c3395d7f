use bitflags::bitflags;

use crate::state::ConditionKind;

bitflags! {
    /// Properties of a computed outcome that steer the state machine.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct OutcomeFlags: u8 {
        /// A reflect-capable target bounces the effect back to the source.
        const REFLECTABLE = 1 << 0;
        /// The action missed; no effect is applied.
        const MISSED = 1 << 1;
        const CRITICAL = 1 << 2;
        /// The effect kills the target outright regardless of HP.
        const KILLS = 1 << 3;
        /// Escape attempt succeeded.
        const ESCAPED = 1 << 4;
    }
}

/// A condition inflicted by an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionChange {
    pub kind: ConditionKind,
    pub turns: Option<u16>,
}

impl ConditionChange {
    pub const fn new(kind: ConditionKind, turns: Option<u16>) -> Self {
        Self { kind, turns }
    }
}

/// Deterministic result of one action against one target.
///
/// Produced by the algorithm provider, never re-rolled: a reflected
/// sub-action carries the same outcome to its new target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    /// HP change on the target. Negative values are damage.
    pub hp_delta: i32,
    /// SP change on the target.
    pub sp_delta: i32,
    /// SP spent by the source.
    pub sp_cost: u32,
    pub conditions_added: Vec<ConditionChange>,
    pub conditions_removed: Vec<ConditionKind>,
    /// Line printed when the action starts ("Alex attacks!").
    pub start_line: String,
    /// Optional second line printed when the effect is applied.
    pub second_line: Option<String>,
    /// Result lines shown one by one after the effect.
    pub result_lines: Vec<String>,
    pub animation: Option<u32>,
    pub sound: Option<String>,
    pub flags: OutcomeFlags,
}

impl Outcome {
    pub fn new(start_line: impl Into<String>) -> Self {
        Self {
            start_line: start_line.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_hp_delta(mut self, hp_delta: i32) -> Self {
        self.hp_delta = hp_delta;
        self
    }

    #[must_use]
    pub fn with_sp_delta(mut self, sp_delta: i32) -> Self {
        self.sp_delta = sp_delta;
        self
    }

    #[must_use]
    pub fn with_sp_cost(mut self, sp_cost: u32) -> Self {
        self.sp_cost = sp_cost;
        self
    }

    #[must_use]
    pub fn with_second_line(mut self, line: impl Into<String>) -> Self {
        self.second_line = Some(line.into());
        self
    }

    #[must_use]
    pub fn with_result_line(mut self, line: impl Into<String>) -> Self {
        self.result_lines.push(line.into());
        self
    }

    #[must_use]
    pub fn with_condition(mut self, change: ConditionChange) -> Self {
        self.conditions_added.push(change);
        self
    }

    #[must_use]
    pub fn with_cure(mut self, kind: ConditionKind) -> Self {
        self.conditions_removed.push(kind);
        self
    }

    #[must_use]
    pub fn with_animation(mut self, animation: u32) -> Self {
        self.animation = Some(animation);
        self
    }

    #[must_use]
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: OutcomeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn is_reflectable(&self) -> bool {
        self.flags.contains(OutcomeFlags::REFLECTABLE)
    }

    pub fn is_miss(&self) -> bool {
        self.flags.contains(OutcomeFlags::MISSED)
    }

    /// Returns true if the outcome kills its target outright.
    pub fn is_lethal(&self) -> bool {
        self.flags.contains(OutcomeFlags::KILLS)
    }

    pub fn escaped(&self) -> bool {
        self.flags.contains(OutcomeFlags::ESCAPED)
    }

    /// Copy of this outcome with `from` renamed to `to` in the lines shown
    /// after the effect lands. Deltas, conditions and flags are unchanged.
    pub fn retargeted(&self, from: &str, to: &str) -> Self {
        let rename = |line: &String| {
            if from.is_empty() {
                line.clone()
            } else {
                line.replace(from, to)
            }
        };
        Self {
            second_line: self.second_line.as_ref().map(rename),
            result_lines: self.result_lines.iter().map(rename).collect(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_flags() {
        let outcome = Outcome::new("Mage casts Fire!")
            .with_hp_delta(-18)
            .with_flags(OutcomeFlags::REFLECTABLE)
            .with_flags(OutcomeFlags::CRITICAL);
        assert!(outcome.is_reflectable());
        assert!(outcome.flags.contains(OutcomeFlags::CRITICAL));
        assert!(!outcome.is_miss());
        assert!(!outcome.is_lethal());
    }

    #[test]
    fn retargeted_renames_lines_but_keeps_payload() {
        let outcome = Outcome::new("Mage casts Fire!")
            .with_hp_delta(-66)
            .with_second_line("Flames engulf Sorcerer.")
            .with_result_line("Sorcerer takes 66 damage.")
            .with_flags(OutcomeFlags::REFLECTABLE);

        let bounced = outcome.retargeted("Sorcerer", "Mage");

        assert_eq!(bounced.start_line, "Mage casts Fire!");
        assert_eq!(bounced.second_line.as_deref(), Some("Flames engulf Mage."));
        assert_eq!(bounced.result_lines, vec!["Mage takes 66 damage.".to_owned()]);
        assert_eq!(bounced.hp_delta, -66);
        assert_eq!(bounced.flags, outcome.flags);
    }
}
