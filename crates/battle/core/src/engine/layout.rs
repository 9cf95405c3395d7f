//! Battle formation: start condition, positions, initial ATB and facing.

use crate::config::BattleConfig;
use crate::state::{BattlerId, Roster, ScreenPosition, Side};

/// Formation the battle starts in.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum BattleCondition {
    #[default]
    None,
    /// The party strikes first.
    Initiative,
    /// The enemies attack the party from behind.
    Back,
    /// The party surrounds the enemies.
    SurroundAttack,
    /// The enemies surround the party.
    PincerAttack,
}

impl BattleCondition {
    pub fn start_message(self) -> &'static str {
        match self {
            BattleCondition::None => "Enemies appear!",
            BattleCondition::Initiative => "The party seized the initiative!",
            BattleCondition::Back => "Ambushed from behind!",
            BattleCondition::SurroundAttack => "The party surrounds the enemies!",
            BattleCondition::PincerAttack => "The party is caught in a pincer attack!",
        }
    }

    /// Party gauges start full and enemy gauges start empty.
    pub fn party_strikes_first(self) -> bool {
        matches!(self, BattleCondition::Initiative | BattleCondition::SurroundAttack)
    }

    /// Enemy gauges start full and party gauges start empty.
    pub fn enemies_strike_first(self) -> bool {
        matches!(self, BattleCondition::Back | BattleCondition::PincerAttack)
    }

    /// Whether the party may pick escape from its commands at all.
    pub fn allows_escape(self) -> bool {
        !self.enemies_strike_first()
    }

    /// Whether the first escape attempt succeeds without consulting the algorithm.
    pub fn guarantees_first_escape(self) -> bool {
        matches!(self, BattleCondition::Initiative)
    }
}

const STAGE_WIDTH: i32 = 320;
const PARTY_X: i32 = 256;
const PARTY_TOP: i32 = 72;
const PARTY_SPACING: i32 = 24;

/// Places the party according to the condition and mirrors enemies when needed.
///
/// Enemy y coordinates always come from the troop definition.
pub fn arrange(roster: &mut Roster, condition: BattleCondition) {
    let mut party_index = 0;
    let mut troop_index = 0;
    for battler in roster.iter_mut() {
        match battler.side {
            Side::Actor => {
                let y = PARTY_TOP + PARTY_SPACING * party_index;
                let x = match condition {
                    BattleCondition::None | BattleCondition::Initiative => PARTY_X,
                    BattleCondition::Back => STAGE_WIDTH - PARTY_X,
                    BattleCondition::SurroundAttack if party_index % 2 == 0 => PARTY_X,
                    BattleCondition::SurroundAttack => STAGE_WIDTH - PARTY_X,
                    BattleCondition::PincerAttack => STAGE_WIDTH / 2,
                };
                battler.position = ScreenPosition::new(x, y);
                party_index += 1;
            }
            Side::Enemy => {
                let mirror = match condition {
                    BattleCondition::Back => true,
                    BattleCondition::PincerAttack => troop_index % 2 == 1,
                    BattleCondition::SurroundAttack => {
                        // Pulled halfway toward the middle of the stage.
                        battler.position.x = (battler.position.x + STAGE_WIDTH / 2) / 2;
                        false
                    }
                    BattleCondition::None | BattleCondition::Initiative => false,
                };
                if mirror {
                    battler.position.x = STAGE_WIDTH - battler.position.x;
                }
                troop_index += 1;
            }
        }
    }
}

/// Sets the starting ATB gauge of every battler.
///
/// Without a formation advantage the fastest battler starts half full and the
/// others proportionally to their agility.
pub fn init_atb_gauges(roster: &mut Roster, condition: BattleCondition, config: &BattleConfig) {
    let fastest = roster
        .iter()
        .map(|b| b.stats.agility)
        .max()
        .unwrap_or(0)
        .max(1);

    for battler in roster.iter_mut() {
        battler.atb = if !battler.is_targetable() {
            0
        } else if condition.party_strikes_first() {
            if battler.side == Side::Actor { config.atb_max } else { 0 }
        } else if condition.enemies_strike_first() {
            if battler.side == Side::Enemy { config.atb_max } else { 0 }
        } else {
            let scaled = config.atb_max as u64 * battler.stats.agility as u64 / (2 * fastest as u64);
            scaled as u32
        };
    }
}

/// Turns every standing battler toward the center of its opponents.
///
/// `acting` keeps the facing it was given by [`face_target`].
pub fn update_directions(roster: &mut Roster, acting: Option<BattlerId>) {
    let party_center = roster.center_x(Side::Actor);
    let troop_center = roster.center_x(Side::Enemy);

    for battler in roster.iter_mut() {
        if !battler.is_targetable() || Some(battler.id) == acting {
            continue;
        }
        let center = match battler.side {
            Side::Actor => troop_center,
            Side::Enemy => party_center,
        };
        if let Some(center) = center {
            battler.facing = battler.facing.toward(battler.position.x, center);
        }
    }
}

/// Turns `source` toward `target`.
pub fn face_target(roster: &mut Roster, source: BattlerId, target: BattlerId) {
    if source == target {
        return;
    }
    let Some(target_x) = roster.get(target).map(|b| b.position.x) else {
        return;
    };
    if let Some(source) = roster.get_mut(source) {
        source.facing = source.facing.toward(source.position.x, target_x);
    }
}
