//! Deterministic, frame-stepped battle action resolution.
//!
//! `battle-core` resolves combat actions one state step per frame: condition
//! recovery, execution, effect application, reflection, result messages and
//! death processing, each paced by wait gates so a renderer can show them.
//! All mutation flows through [`engine::BattleScene`]; formulas, AI, menus
//! and asset I/O are injected through the traits in [`env`].
pub mod action;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod state;

pub use action::{
    ActionError, ActionKind, ActionQueue, ActionRequest, BattleAction, ConditionChange, ItemId,
    Outcome, OutcomeFlags, SkillId, TargetSelection,
};
pub use config::{AtbMode, BattleConfig, WaitWindow};
pub use engine::{
    ActionStateMachine, BattleActionState, BattleCondition, BattleEvent, BattleOutcome,
    BattleScene, BattleSceneBuilder, EscapeError, EventLog, FloatColor, FloatText,
    FloatTextManager, FrameInput, MessageWindow, SceneError, ScenePhase, StepResult, WaitGate,
};
pub use env::{
    AlgorithmError, AlgorithmProvider, AssetError, AssetHandle, AssetLoader, AssetNotifier,
    AssetTracker, CommandProvider, GraphicOwner, GraphicStatus, IdleCommands, ImmediateLoader,
    NullStatusWindow, ResolvedGraphic, StatusWindow,
};
pub use error::{BattleError, ErrorSeverity};
pub use state::{
    ActiveCondition, Battler, BattlerId, BattlerStats, ConditionKind, ConditionSet, Facing,
    ResourceMeter, Roster, RosterError, ScreenPosition, Side,
};
