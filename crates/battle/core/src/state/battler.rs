use super::{BattlerId, ConditionKind, ConditionSet, Facing, ResourceMeter, ScreenPosition, Side};

/// Base stats consumed by the external algorithm provider.
///
/// The engine itself only reads `agility`, to fill ATB gauges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattlerStats {
    pub attack: u32,
    pub defense: u32,
    pub magic: u32,
    pub agility: u32,
}

impl BattlerStats {
    pub const fn new(attack: u32, defense: u32, magic: u32, agility: u32) -> Self {
        Self {
            attack,
            defense,
            magic,
            agility,
        }
    }
}

/// A battle participant.
///
/// Battlers live for the whole battle. Death and escape only flip flags, so
/// status windows and final messages can still reference the battler.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battler {
    pub id: BattlerId,
    pub name: String,
    pub side: Side,
    pub hp: ResourceMeter,
    pub sp: ResourceMeter,
    pub stats: BattlerStats,
    pub position: ScreenPosition,
    pub facing: Facing,
    pub atb: u32,
    pub conditions: ConditionSet,
    /// Graphic requested from the asset loader for this battler, if any.
    pub sprite: Option<String>,
    dead: bool,
    fled: bool,
}

impl Battler {
    pub fn new(id: BattlerId, name: impl Into<String>, side: Side, max_hp: u32) -> Self {
        let facing = match side {
            Side::Actor => Facing::Left,
            Side::Enemy => Facing::Right,
        };
        Self {
            id,
            name: name.into(),
            side,
            hp: ResourceMeter::full(max_hp),
            sp: ResourceMeter::default(),
            stats: BattlerStats::default(),
            position: ScreenPosition::default(),
            facing,
            atb: 0,
            conditions: ConditionSet::empty(),
            sprite: None,
            dead: max_hp == 0,
            fled: false,
        }
    }

    #[must_use]
    pub fn with_hp(mut self, hp: ResourceMeter) -> Self {
        self.dead = hp.is_empty();
        self.hp = hp;
        self
    }

    #[must_use]
    pub fn with_sp(mut self, max_sp: u32) -> Self {
        self.sp = ResourceMeter::full(max_sp);
        self
    }

    #[must_use]
    pub fn with_stats(mut self, stats: BattlerStats) -> Self {
        self.stats = stats;
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: ScreenPosition) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_condition(mut self, kind: ConditionKind, turns: Option<u16>) -> Self {
        self.conditions.add(kind, turns);
        self
    }

    #[must_use]
    pub fn with_sprite(mut self, sprite: impl Into<String>) -> Self {
        self.sprite = Some(sprite.into());
        self
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn has_fled(&self) -> bool {
        self.fled
    }

    /// Returns true if the battler can still be targeted by actions.
    pub fn is_targetable(&self) -> bool {
        !self.dead && !self.fled
    }

    /// Returns true if the battler can start an action right now.
    pub fn can_act(&self) -> bool {
        self.is_targetable() && !self.conditions.prevents_action()
    }

    /// Returns true if reflectable effects aimed at this battler bounce back.
    pub fn reflects(&self) -> bool {
        self.conditions.has(ConditionKind::Reflect)
    }

    /// Returns true if the battler's HP ran out but death has not been processed.
    pub fn is_dying(&self) -> bool {
        !self.dead && self.hp.is_empty()
    }

    /// Marks the battler dead and removes it from targeting.
    ///
    /// Returns false if it was already dead.
    pub fn mark_dead(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.hp.deplete();
        self.atb = 0;
        self.conditions.clear();
        true
    }

    /// Marks the battler as having left the battle.
    pub fn mark_fled(&mut self) -> bool {
        if self.fled || self.dead {
            return false;
        }
        self.fled = true;
        self.atb = 0;
        true
    }

    pub fn is_atb_full(&self, atb_max: u32) -> bool {
        self.atb >= atb_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slime() -> Battler {
        Battler::new(BattlerId(10), "Slime", Side::Enemy, 20)
    }

    #[test]
    fn dead_battler_is_not_targetable() {
        let mut battler = slime().with_condition(ConditionKind::Poison, Some(3));
        battler.atb = 400;
        assert!(battler.is_targetable());

        assert!(battler.mark_dead());
        assert!(!battler.mark_dead());
        assert!(!battler.is_targetable());
        assert!(battler.hp.is_empty());
        assert!(battler.conditions.is_empty());
        assert_eq!(battler.atb, 0);
    }

    #[test]
    fn restricted_battler_cannot_act() {
        let battler = slime().with_condition(ConditionKind::Sleep, Some(1));
        assert!(battler.is_targetable());
        assert!(!battler.can_act());
    }

    #[test]
    fn fled_battler_cannot_die() {
        let mut battler = slime();
        assert!(battler.mark_fled());
        assert!(!battler.is_targetable());
        assert!(!battler.mark_fled());
    }

    #[test]
    fn dying_until_death_processed() {
        let mut battler = slime();
        battler.hp.apply_delta(-50);
        assert!(battler.is_dying());
        battler.mark_dead();
        assert!(!battler.is_dying());
    }
}
