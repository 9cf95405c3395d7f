use std::collections::HashSet;

use super::{Battler, BattlerId, Side};
use crate::config::BattleConfig;
use crate::error::{BattleError, ErrorSeverity};

/// Errors raised while assembling a roster.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("battler id {0} is used more than once")]
    DuplicateId(BattlerId),

    #[error("{side} side has {count} battlers, limit is {limit}")]
    SideTooLarge { side: Side, count: usize, limit: usize },

    #[error("{0} side has no battlers")]
    EmptySide(Side),
}

impl BattleError for RosterError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId(_) => "ROSTER_DUPLICATE_ID",
            Self::SideTooLarge { .. } => "ROSTER_SIDE_TOO_LARGE",
            Self::EmptySide(_) => "ROSTER_EMPTY_SIDE",
        }
    }
}

/// All participants of one battle, actors and enemies, in roster order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roster {
    battlers: Vec<Battler>,
}

impl Roster {
    /// Builds a roster, validating ids and party sizes.
    pub fn new(battlers: impl IntoIterator<Item = Battler>) -> Result<Self, RosterError> {
        let battlers: Vec<Battler> = battlers.into_iter().collect();

        let mut seen = HashSet::new();
        for battler in &battlers {
            if !seen.insert(battler.id) {
                return Err(RosterError::DuplicateId(battler.id));
            }
        }

        for (side, limit) in [
            (Side::Actor, BattleConfig::MAX_PARTY),
            (Side::Enemy, BattleConfig::MAX_TROOP),
        ] {
            let count = battlers.iter().filter(|b| b.side == side).count();
            if count == 0 {
                return Err(RosterError::EmptySide(side));
            }
            if count > limit {
                return Err(RosterError::SideTooLarge { side, count, limit });
            }
        }

        Ok(Self { battlers })
    }

    pub fn get(&self, id: BattlerId) -> Option<&Battler> {
        self.battlers.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BattlerId) -> Option<&mut Battler> {
        self.battlers.iter_mut().find(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Battler> {
        self.battlers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Battler> {
        self.battlers.iter_mut()
    }

    pub fn side(&self, side: Side) -> impl Iterator<Item = &Battler> {
        self.battlers.iter().filter(move |b| b.side == side)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Battler> {
        self.side(Side::Actor)
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Battler> {
        self.side(Side::Enemy)
    }

    /// Battlers of `side` that can still be targeted.
    pub fn targetable(&self, side: Side) -> impl Iterator<Item = &Battler> {
        self.side(side).filter(|b| b.is_targetable())
    }

    /// Returns true if every battler of `side` is dead or has fled.
    pub fn is_side_defeated(&self, side: Side) -> bool {
        self.targetable(side).next().is_none()
    }

    /// Mean x coordinate of the targetable battlers of `side`.
    pub fn center_x(&self, side: Side) -> Option<i32> {
        let (sum, count) = self
            .targetable(side)
            .fold((0i64, 0i64), |(sum, count), b| (sum + b.position.x as i64, count + 1));
        (count > 0).then(|| (sum / count) as i32)
    }

    pub fn len(&self) -> usize {
        self.battlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ScreenPosition;

    fn roster() -> Roster {
        Roster::new([
            Battler::new(BattlerId(1), "Alex", Side::Actor, 40)
                .with_position(ScreenPosition::new(240, 80)),
            Battler::new(BattlerId(10), "Slime", Side::Enemy, 20)
                .with_position(ScreenPosition::new(60, 90)),
            Battler::new(BattlerId(11), "Bat", Side::Enemy, 15)
                .with_position(ScreenPosition::new(100, 70)),
        ])
        .expect("valid roster")
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = Roster::new([
            Battler::new(BattlerId(1), "Alex", Side::Actor, 40),
            Battler::new(BattlerId(1), "Slime", Side::Enemy, 20),
        ]);
        assert_eq!(result, Err(RosterError::DuplicateId(BattlerId(1))));
    }

    #[test]
    fn rejects_empty_side() {
        let result = Roster::new([Battler::new(BattlerId(1), "Alex", Side::Actor, 40)]);
        assert_eq!(result, Err(RosterError::EmptySide(Side::Enemy)));
    }

    #[test]
    fn side_defeat_counts_fled_and_dead() {
        let mut roster = roster();
        assert!(!roster.is_side_defeated(Side::Enemy));

        roster.get_mut(BattlerId(10)).unwrap().mark_dead();
        assert!(!roster.is_side_defeated(Side::Enemy));

        roster.get_mut(BattlerId(11)).unwrap().mark_fled();
        assert!(roster.is_side_defeated(Side::Enemy));
        assert!(!roster.get(BattlerId(11)).unwrap().is_dead());
    }

    #[test]
    fn center_ignores_untargetable() {
        let mut roster = roster();
        assert_eq!(roster.center_x(Side::Enemy), Some(80));
        roster.get_mut(BattlerId(11)).unwrap().mark_dead();
        assert_eq!(roster.center_x(Side::Enemy), Some(60));
        roster.get_mut(BattlerId(10)).unwrap().mark_dead();
        assert_eq!(roster.center_x(Side::Enemy), None);
    }
}
