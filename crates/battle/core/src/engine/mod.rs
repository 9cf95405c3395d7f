//! Frame-stepped battle engine.
//!
//! - [`scene`] hosts [`BattleScene`], the per-frame orchestrator
//! - [`machine`] resolves one action at a time through [`BattleActionState`]
//! - [`wait`], [`messages`] and [`float_text`] pace what the player sees
//! - [`layout`] places battlers and decides which way they face
//! - [`result`] evaluates win/lose/draw
//! - [`events`] records everything observable for replays and tests

pub mod events;
pub mod float_text;
pub mod layout;
pub mod machine;
pub mod messages;
pub mod result;
pub mod scene;
pub mod wait;

pub use events::{BattleEvent, EventLog};
pub use float_text::{FloatColor, FloatText, FloatTextManager};
pub use layout::BattleCondition;
pub use machine::{
    ActionStateMachine, BattleActionState, FinishedAction, MachineError, StepContext, StepResult,
};
pub use messages::MessageWindow;
pub use result::{BattleOutcome, check_lose, check_result_conditions, check_win};
pub use scene::{
    BattleScene, BattleSceneBuilder, EscapeError, FrameInput, SYSTEM_GRAPHIC, SceneError,
    ScenePhase,
};
pub use wait::WaitGate;
