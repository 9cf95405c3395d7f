//! Observable battle events.
//!
//! Every effect the scene produces is recorded here in frame order. The log
//! is what replays are compared against: two runs of the same battle with the
//! same inputs produce identical logs.

use super::float_text::FloatColor;
use super::layout::BattleCondition;
use super::machine::BattleActionState;
use super::result::BattleOutcome;
use crate::action::ActionKind;
use crate::env::{GraphicOwner, GraphicStatus};
use crate::state::{BattlerId, ConditionKind};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleEvent {
    BattleStarted {
        condition: BattleCondition,
    },
    GraphicResolved {
        frame: u64,
        owner: GraphicOwner,
        name: String,
        status: GraphicStatus,
    },
    CommandQueued {
        frame: u64,
        source: BattlerId,
        kind: ActionKind,
    },
    ActionStarted {
        frame: u64,
        source: BattlerId,
        kind: ActionKind,
        targets: Vec<BattlerId>,
    },
    StateEntered {
        frame: u64,
        state: BattleActionState,
        source: BattlerId,
        target: Option<BattlerId>,
        /// 0 for the top-level action, 1 for a reflected sub-action.
        depth: usize,
    },
    Message {
        frame: u64,
        text: String,
    },
    FloatText {
        frame: u64,
        target: BattlerId,
        color: FloatColor,
        text: String,
    },
    EffectApplied {
        frame: u64,
        source: BattlerId,
        target: BattlerId,
        hp_change: i32,
        sp_change: i32,
    },
    ConditionAdded {
        frame: u64,
        battler: BattlerId,
        kind: ConditionKind,
    },
    ConditionRemoved {
        frame: u64,
        battler: BattlerId,
        kind: ConditionKind,
    },
    AnimationPlayed {
        frame: u64,
        target: BattlerId,
        animation: u32,
    },
    SoundPlayed {
        frame: u64,
        name: String,
    },
    Reflected {
        frame: u64,
        reflector: BattlerId,
        target: BattlerId,
    },
    TargetSkipped {
        frame: u64,
        source: BattlerId,
        target: Option<BattlerId>,
        reason: String,
    },
    BattlerDied {
        frame: u64,
        battler: BattlerId,
    },
    BattlerFled {
        frame: u64,
        battler: BattlerId,
    },
    ActionFinished {
        frame: u64,
        source: BattlerId,
    },
    EscapeRequested {
        frame: u64,
    },
    ActionsDiscarded {
        frame: u64,
        count: usize,
    },
    OutcomeDecided {
        frame: u64,
        outcome: BattleOutcome,
    },
}

/// Append-only record of the events produced so far.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<BattleEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: BattleEvent) {
        tracing::trace!(?event, "battle event");
        self.events.push(event);
    }

    /// Takes every event recorded so far, leaving the log empty.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
