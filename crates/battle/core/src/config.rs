use crate::state::ConditionKind;

/// Battle pacing constants and tunable parameters.
///
/// Frame counts are tuning values rather than contracts; every field can be
/// overridden from a TOML file through the content loaders.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Lifetime of a floating damage text, in frames.
    pub float_text_lifetime: u32,

    /// Dwell window for a displayed action or result line.
    pub message_wait: WaitWindow,

    /// Dwell window for a condition recovery line shown during ConditionHeal.
    pub condition_heal_wait: WaitWindow,

    /// Dwell window for the battle start message.
    pub start_wait: WaitWindow,

    /// Frames the victory/defeat/escape message stays up before the scene ends.
    pub outcome_wait: u32,

    /// Value at which an ATB gauge is full.
    pub atb_max: u32,

    /// Percentage applied to agility when filling ATB gauges each frame.
    pub atb_speed_percent: u32,

    /// Whether ATB gauges keep filling while an action resolves.
    pub atb_mode: AtbMode,

    /// Advance wait gates at their minimum without waiting for input.
    pub auto_advance: bool,

    /// Maximum number of lines shown at once in the battle message window.
    pub message_lines: usize,
}

/// Minimum/maximum frame counts for one wait gate arming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaitWindow {
    pub min: u32,
    pub max: u32,
}

impl WaitWindow {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// ATB fill policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum AtbMode {
    /// Gauges pause while an action is being resolved.
    #[default]
    Wait,
    /// Gauges keep filling during action resolution.
    Active,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of simultaneous conditions per battler: one of each kind.
    pub const MAX_CONDITIONS: usize = <ConditionKind as strum::EnumCount>::COUNT;
    /// Maximum number of battlers per side.
    pub const MAX_PARTY: usize = 4;
    pub const MAX_TROOP: usize = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_FLOAT_TEXT_LIFETIME: u32 = 30;
    pub const DEFAULT_MESSAGE_WAIT: WaitWindow = WaitWindow::new(15, 60);
    pub const DEFAULT_CONDITION_HEAL_WAIT: WaitWindow = WaitWindow::new(20, 60);
    pub const DEFAULT_START_WAIT: WaitWindow = WaitWindow::new(30, 90);
    pub const DEFAULT_OUTCOME_WAIT: u32 = 60;
    pub const DEFAULT_ATB_MAX: u32 = 1_000;
    pub const DEFAULT_ATB_SPEED_PERCENT: u32 = 100;
    pub const DEFAULT_MESSAGE_LINES: usize = 4;

    pub fn new() -> Self {
        Self {
            float_text_lifetime: Self::DEFAULT_FLOAT_TEXT_LIFETIME,
            message_wait: Self::DEFAULT_MESSAGE_WAIT,
            condition_heal_wait: Self::DEFAULT_CONDITION_HEAL_WAIT,
            start_wait: Self::DEFAULT_START_WAIT,
            outcome_wait: Self::DEFAULT_OUTCOME_WAIT,
            atb_max: Self::DEFAULT_ATB_MAX,
            atb_speed_percent: Self::DEFAULT_ATB_SPEED_PERCENT,
            atb_mode: AtbMode::default(),
            auto_advance: true,
            message_lines: Self::DEFAULT_MESSAGE_LINES,
        }
    }

    /// Configuration with every wait collapsed to a single frame.
    ///
    /// Useful for headless simulation where pacing only adds frames.
    pub fn instant() -> Self {
        let one = WaitWindow::new(1, 1);
        Self {
            float_text_lifetime: 1,
            message_wait: one,
            condition_heal_wait: one,
            start_wait: one,
            outcome_wait: 1,
            ..Self::new()
        }
    }

    /// ATB increment for one frame given a battler's agility.
    pub fn atb_increment(&self, agility: u32) -> u32 {
        (agility.saturating_mul(self.atb_speed_percent) / 100).max(1)
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for WaitWindow {
    fn default() -> Self {
        BattleConfig::DEFAULT_MESSAGE_WAIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atb_increment_never_stalls() {
        let config = BattleConfig::default();
        assert_eq!(config.atb_increment(0), 1);
        assert_eq!(config.atb_increment(12), 12);

        let slow = BattleConfig {
            atb_speed_percent: 50,
            ..BattleConfig::default()
        };
        assert_eq!(slow.atb_increment(12), 6);
    }

    #[test]
    fn atb_mode_parses_snake_case() {
        assert_eq!("active".parse::<AtbMode>().ok(), Some(AtbMode::Active));
        assert_eq!(AtbMode::Wait.to_string(), "wait");
    }
}
