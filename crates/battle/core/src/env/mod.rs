//! Traits describing the collaborators the battle engine consumes.
//!
//! The engine owns no formulas, no AI, no rendering and no I/O. Everything it
//! needs from the outside world is reached through the narrow interfaces in
//! this module:
//!
//! - [`AlgorithmProvider`]: deterministic outcome of one action on one target
//! - [`CommandProvider`]: player or AI command selection for a ready battler
//! - [`StatusWindow`]: re-render hook after visible roster changes
//! - [`AssetLoader`]: asynchronous graphic requests (see [`assets`])

pub mod assets;

pub use assets::{
    AssetError, AssetHandle, AssetLoader, AssetNotifier, AssetReady, AssetTracker, GraphicOwner,
    GraphicStatus, ImmediateLoader, ResolvedGraphic,
};

use crate::action::{ActionKind, ActionRequest, Outcome};
use crate::error::{BattleError, ErrorSeverity};
use crate::state::{Battler, BattlerId, Roster};

/// Reasons an algorithm provider refuses to compute an outcome.
///
/// Every variant is a local skip: the state machine jumps to `Finished` for the
/// current target and the battle carries on.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AlgorithmError {
    #[error("target {0} is no longer in the battle")]
    TargetUnavailable(BattlerId),

    #[error("{kind} is not supported by this provider")]
    Unsupported { kind: &'static str },

    #[error("{battler} lacks the {required} SP required")]
    InsufficientSp { battler: BattlerId, required: u32 },

    #[error("{kind} is not defined: {detail}")]
    UnknownDefinition { kind: &'static str, detail: String },
}

impl BattleError for AlgorithmError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TargetUnavailable(_) | Self::InsufficientSp { .. } => {
                ErrorSeverity::Recoverable
            }
            Self::Unsupported { .. } => ErrorSeverity::Validation,
            Self::UnknownDefinition { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TargetUnavailable(_) => "ALGORITHM_TARGET_UNAVAILABLE",
            Self::Unsupported { .. } => "ALGORITHM_UNSUPPORTED",
            Self::InsufficientSp { .. } => "ALGORITHM_INSUFFICIENT_SP",
            Self::UnknownDefinition { .. } => "ALGORITHM_UNKNOWN_DEFINITION",
        }
    }
}

/// Computes the outcome of one action against one target.
///
/// Implementations must be pure functions of their inputs: the same source,
/// target, kind and roster always produce the same outcome. Any randomness
/// has to be derived deterministically from those inputs.
pub trait AlgorithmProvider {
    fn compute(
        &self,
        source: &Battler,
        target: &Battler,
        kind: &ActionKind,
        roster: &Roster,
    ) -> Result<Outcome, AlgorithmError>;

    /// Rewords `outcome` after `reflector` bounced it back onto `caster`.
    ///
    /// The effect itself is never recomputed. The default renames the
    /// reflector to the caster in the second and result lines.
    fn reflected(&self, outcome: &Outcome, reflector: &Battler, caster: &Battler) -> Outcome {
        outcome.retargeted(&reflector.name, &caster.name)
    }
}

/// Chooses a command for a battler whose ATB gauge is full.
///
/// Returning `None` means no decision yet (a player still browsing menus);
/// the battler keeps its full gauge and is asked again next frame.
pub trait CommandProvider {
    fn select(&mut self, battler: &Battler, roster: &Roster) -> Option<ActionRequest>;
}

/// Re-render hook for the on-screen status windows.
pub trait StatusWindow {
    fn refresh(&mut self, roster: &Roster);
}

/// Status window that ignores refreshes, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusWindow;

impl StatusWindow for NullStatusWindow {
    fn refresh(&mut self, _roster: &Roster) {}
}

/// Command provider that never decides; battlers relying on it wait forever.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleCommands;

impl CommandProvider for IdleCommands {
    fn select(&mut self, _battler: &Battler, _roster: &Roster) -> Option<ActionRequest> {
        None
    }
}
