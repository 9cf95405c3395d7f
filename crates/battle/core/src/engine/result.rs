//! Win/lose/draw evaluation over the roster.

use crate::state::{Roster, Side};

/// How a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    /// Both sides were wiped out by the same action.
    Draw,
    Escaped,
}

impl BattleOutcome {
    /// Message shown while the outcome dwells on screen.
    pub fn message(self) -> &'static str {
        match self {
            BattleOutcome::Victory => "Victory!",
            BattleOutcome::Defeat => "The party has fallen...",
            BattleOutcome::Draw => "Nobody is left standing.",
            BattleOutcome::Escaped => "The party escaped!",
        }
    }
}

/// Win iff every enemy is dead or has fled.
pub fn check_win(roster: &Roster) -> bool {
    roster.is_side_defeated(Side::Enemy)
}

/// Lose iff no actor can still fight.
pub fn check_lose(roster: &Roster) -> bool {
    roster.is_side_defeated(Side::Actor)
}

/// Runs both checks and folds them into an outcome, if the battle is decided.
pub fn check_result_conditions(roster: &Roster) -> Option<BattleOutcome> {
    match (check_win(roster), check_lose(roster)) {
        (true, true) => Some(BattleOutcome::Draw),
        (true, false) => Some(BattleOutcome::Victory),
        (false, true) => Some(BattleOutcome::Defeat),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Battler, BattlerId};

    fn roster() -> Roster {
        Roster::new([
            Battler::new(BattlerId(1), "Alex", Side::Actor, 40),
            Battler::new(BattlerId(10), "Slime", Side::Enemy, 20),
            Battler::new(BattlerId(11), "Bat", Side::Enemy, 15),
        ])
        .expect("valid roster")
    }

    #[test]
    fn undecided_while_both_sides_stand() {
        let roster = roster();
        assert!(!check_win(&roster));
        assert!(!check_lose(&roster));
        assert_eq!(check_result_conditions(&roster), None);
    }

    #[test]
    fn win_when_enemies_dead_or_fled() {
        let mut roster = roster();
        roster.get_mut(BattlerId(10)).unwrap().mark_dead();
        assert_eq!(check_result_conditions(&roster), None);
        roster.get_mut(BattlerId(11)).unwrap().mark_fled();
        assert_eq!(check_result_conditions(&roster), Some(BattleOutcome::Victory));
        assert!(!check_lose(&roster));
    }

    #[test]
    fn lose_when_party_dead() {
        let mut roster = roster();
        roster.get_mut(BattlerId(1)).unwrap().mark_dead();
        assert_eq!(check_result_conditions(&roster), Some(BattleOutcome::Defeat));
        assert!(!check_win(&roster));
    }

    #[test]
    fn draw_when_everyone_is_gone() {
        let mut roster = roster();
        for id in [1, 10, 11] {
            roster.get_mut(BattlerId(id)).unwrap().mark_dead();
        }
        assert_eq!(check_result_conditions(&roster), Some(BattleOutcome::Draw));
    }

    #[test]
    fn win_and_lose_exclusive_with_a_survivor() {
        let roster = roster();
        let ids = [1, 10, 11];
        for mask in 0u8..8 {
            let mut r = roster.clone();
            for (bit, id) in ids.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    r.get_mut(BattlerId(*id)).unwrap().mark_dead();
                }
            }
            if r.iter().any(|b| b.is_targetable()) {
                assert!(!(check_win(&r) && check_lose(&r)), "mask {mask:03b}");
            }
        }
    }
}
