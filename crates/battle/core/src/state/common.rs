use std::fmt;

/// Unique identifier for a battle participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattlerId(pub u32);

impl fmt::Display for BattlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which party a battler fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    /// Player-controlled party member.
    Actor,
    /// Member of the enemy troop.
    Enemy,
}

impl Side {
    pub const fn opponent(self) -> Self {
        match self {
            Side::Actor => Side::Enemy,
            Side::Enemy => Side::Actor,
        }
    }
}

/// Horizontal direction a battler sprite faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Direction from `from_x` toward `to_x`; ties keep `self`.
    pub fn toward(self, from_x: i32, to_x: i32) -> Self {
        match to_x.cmp(&from_x) {
            std::cmp::Ordering::Less => Facing::Left,
            std::cmp::Ordering::Greater => Facing::Right,
            std::cmp::Ordering::Equal => self,
        }
    }

    pub const fn flipped(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Screen-space position of a battler, used for facing and float texts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScreenPosition {
    pub x: i32,
    pub y: i32,
}

impl ScreenPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position offset upward, where overlays above a sprite are drawn.
    pub const fn above(self, offset: i32) -> Self {
        Self {
            x: self.x,
            y: self.y - offset,
        }
    }
}

/// Integer resource meter (HP, SP) tracked per battler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceMeter {
    pub current: u32,
    pub maximum: u32,
}

impl ResourceMeter {
    pub fn new(current: u32, maximum: u32) -> Self {
        Self {
            current: current.min(maximum),
            maximum,
        }
    }

    pub fn full(maximum: u32) -> Self {
        Self::new(maximum, maximum)
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Applies a signed change, clamping to `[0, maximum]`.
    ///
    /// Returns the change actually applied.
    pub fn apply_delta(&mut self, delta: i32) -> i32 {
        let before = self.current as i64;
        let after = (before + delta as i64).clamp(0, self.maximum as i64);
        self.current = after as u32;
        (after - before) as i32
    }

    pub fn deplete(&mut self) -> u32 {
        let lost = self.current;
        self.current = 0;
        lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_clamps_both_ends() {
        let mut hp = ResourceMeter::new(30, 50);
        assert_eq!(hp.apply_delta(-45), -30);
        assert!(hp.is_empty());
        assert_eq!(hp.apply_delta(80), 50);
        assert_eq!(hp.current, 50);
    }

    #[test]
    fn meter_new_caps_current() {
        assert_eq!(ResourceMeter::new(99, 10).current, 10);
    }

    #[test]
    fn facing_toward_keeps_direction_on_tie() {
        assert_eq!(Facing::Left.toward(10, 40), Facing::Right);
        assert_eq!(Facing::Right.toward(40, 10), Facing::Left);
        assert_eq!(Facing::Right.toward(10, 10), Facing::Right);
    }
}
