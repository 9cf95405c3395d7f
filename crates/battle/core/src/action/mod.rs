//! Combat intents and their computed outcomes.
//!
//! - [`ActionRequest`]: what a command provider chose (source, kind, target selection)
//! - [`BattleAction`]: a request expanded against the roster into an ordered target list
//! - [`Outcome`]: the deterministic result the algorithm provider computed for one target
//! - [`ActionQueue`]: actions waiting for their turn in the state machine

mod outcome;
mod queue;

pub use outcome::{ConditionChange, Outcome, OutcomeFlags};
pub use queue::ActionQueue;

use crate::error::{BattleError, ErrorSeverity};
use crate::state::{BattlerId, Roster, Side};

/// Skill identifier resolved by the algorithm provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillId(pub u32);

/// Item identifier resolved by the algorithm provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u32);

/// What a battler does with its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Attack,
    Skill(SkillId),
    Item(ItemId),
    Defend,
    Escape,
    /// Does nothing; used for battlers that lost their turn.
    Wait,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub const fn is_escape(&self) -> bool {
        matches!(self, ActionKind::Escape)
    }
}

/// How the targets of a request are chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetSelection {
    Single(BattlerId),
    AllOpponents,
    AllAllies,
    Itself,
}

/// A command chosen by a player or the AI, before target expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionRequest {
    pub source: BattlerId,
    pub kind: ActionKind,
    pub targets: TargetSelection,
    /// Number of times each target is hit.
    pub combo: u8,
}

impl ActionRequest {
    pub fn new(source: BattlerId, kind: ActionKind, targets: TargetSelection) -> Self {
        Self {
            source,
            kind,
            targets,
            combo: 1,
        }
    }

    pub fn attack(source: BattlerId, target: BattlerId) -> Self {
        Self::new(source, ActionKind::Attack, TargetSelection::Single(target))
    }

    pub fn escape(source: BattlerId) -> Self {
        Self::new(source, ActionKind::Escape, TargetSelection::Itself)
    }

    #[must_use]
    pub fn with_combo(mut self, combo: u8) -> Self {
        self.combo = combo.max(1);
        self
    }
}

/// Errors raised while turning a request into an executable action.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("source battler {0} is not in the roster")]
    UnknownSource(BattlerId),

    #[error("source battler {0} cannot act")]
    SourceUnavailable(BattlerId),

    #[error("no targetable battler for {kind} from {battler}")]
    NoTargets { battler: BattlerId, kind: &'static str },
}

impl BattleError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownSource(_) => ErrorSeverity::Validation,
            Self::SourceUnavailable(_) | Self::NoTargets { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSource(_) => "ACTION_UNKNOWN_SOURCE",
            Self::SourceUnavailable(_) => "ACTION_SOURCE_UNAVAILABLE",
            Self::NoTargets { .. } => "ACTION_NO_TARGETS",
        }
    }
}

/// An action with its target list expanded against the roster.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleAction {
    pub source: BattlerId,
    pub kind: ActionKind,
    pub targets: Vec<BattlerId>,
    pub combo: u8,
}

impl BattleAction {
    /// Expands a request into an ordered target list.
    ///
    /// A single target that can no longer be targeted is redirected to the
    /// first targetable battler on the same side.
    pub fn from_request(request: &ActionRequest, roster: &Roster) -> Result<Self, ActionError> {
        let source = roster
            .get(request.source)
            .ok_or(ActionError::UnknownSource(request.source))?;

        let targets: Vec<BattlerId> = match request.targets {
            TargetSelection::Itself => vec![source.id],
            TargetSelection::AllOpponents => roster
                .targetable(source.side.opponent())
                .map(|b| b.id)
                .collect(),
            TargetSelection::AllAllies => roster.targetable(source.side).map(|b| b.id).collect(),
            TargetSelection::Single(id) => match roster.get(id) {
                Some(target) if target.is_targetable() => vec![id],
                Some(target) => retarget(roster, target.side).into_iter().collect(),
                None => retarget(roster, source.side.opponent()).into_iter().collect(),
            },
        };

        if targets.is_empty() {
            return Err(ActionError::NoTargets {
                battler: source.id,
                kind: request.kind.name(),
            });
        }

        Ok(Self {
            source: source.id,
            kind: request.kind,
            targets,
            combo: request.combo.max(1),
        })
    }

    /// Builds the action bouncing a reflected effect from `reflector` back to
    /// this action's source. The derived action is a new value with one target.
    pub fn reflected(&self, reflector: BattlerId) -> Self {
        Self {
            source: reflector,
            kind: self.kind,
            targets: vec![self.source],
            combo: 1,
        }
    }

    /// Total number of target iterations (targets × combo).
    pub fn iterations(&self) -> usize {
        self.targets.len() * self.combo as usize
    }

    /// Target hit during the given iteration.
    pub fn target_at(&self, iteration: usize) -> Option<BattlerId> {
        self.targets.get(iteration / self.combo.max(1) as usize).copied()
    }
}

fn retarget(roster: &Roster, side: Side) -> Option<BattlerId> {
    roster.targetable(side).map(|b| b.id).next()
}
