//! Per-action finite state machine.
//!
//! One [`BattleAction`] is resolved at a time. Each call to
//! [`ActionStateMachine::step`] runs the handler of the current state exactly
//! once; handlers either stay (waiting on the [`WaitGate`] or looping through
//! queued lines) or name the next state. A state change therefore happens at
//! most once per frame.
//!
//! ```text
//! ConditionHeal → Execute → Apply ─┬─────────────→ ResultPop ⇄ ResultPush → Death → Finished
//!       ↑                          └→ Reflect ─┐                                     │
//!       └────────────── next target iteration ─┼─────────────────────────────────────┘
//!                                              └→ [derived action] Execute → … → Finished
//! ```
//!
//! Reflection never recurses: the derived action is pushed as a new frame on
//! an explicit stack and the original resumes at `ResultPop` once the derived
//! frame has passed its own `Finished`.

use std::collections::VecDeque;

use super::events::{BattleEvent, EventLog};
use super::float_text::{FloatColor, FloatTextManager};
use super::layout;
use super::messages::MessageWindow;
use super::wait::WaitGate;
use crate::action::{BattleAction, Outcome, OutcomeFlags};
use crate::config::BattleConfig;
use crate::env::{AlgorithmError, AlgorithmProvider, StatusWindow};
use crate::error::{BattleError, ErrorSeverity, log_error};
use crate::state::{Battler, BattlerId, ConditionKind, Roster, Side};

/// States of the action state machine, in their nominal order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum BattleActionState {
    /// Called repeatedly. Expires the source's timed conditions and reports
    /// each recovery, one line per wait.
    ConditionHeal,
    /// Called once per target iteration. Runs the algorithm and prints the
    /// start line.
    Execute,
    /// Called once. Applies the effect, plays animation and sound, prints the
    /// second line.
    Apply,
    /// Bounces the effect back to the source as a derived action.
    Reflect,
    /// Called repeatedly. Waits, then pops the displayed lines.
    ResultPop,
    /// Called repeatedly. Pushes the next result line and the float text.
    ResultPush,
    /// Called once. Processes deaths caused by this iteration.
    Death,
    /// Called once. Moves to the next target iteration or ends the action.
    Finished,
}

/// Errors raised by the state machine API itself.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error("an action by {current} is still resolving")]
    Busy { current: BattlerId },
}

impl BattleError for MachineError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        "MACHINE_BUSY"
    }
}

/// Everything a state handler may read or mutate during one step.
pub struct StepContext<'a> {
    pub roster: &'a mut Roster,
    pub algorithm: &'a dyn AlgorithmProvider,
    pub status: &'a mut dyn StatusWindow,
    pub messages: &'a mut MessageWindow,
    pub float_texts: &'a mut FloatTextManager,
    pub events: &'a mut EventLog,
    pub config: &'a BattleConfig,
    pub frame: u64,
    /// Input press or auto-advance: lets wait gates open at their minimum.
    pub advance: bool,
    /// An escape was requested; remaining target iterations are abandoned at
    /// the next safe point.
    pub escape_pending: bool,
    /// Escape actions succeed without consulting the algorithm.
    pub escape_guaranteed: bool,
}

impl StepContext<'_> {
    fn show(&mut self, text: String) {
        self.messages.push_line(text.clone());
        self.events.record(BattleEvent::Message {
            frame: self.frame,
            text,
        });
    }

    fn name_of(&self, id: BattlerId) -> String {
        self.roster
            .get(id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn skip(&mut self, source: BattlerId, target: Option<BattlerId>, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::debug!(%source, ?target, %reason, "skipping target iteration");
        self.events.record(BattleEvent::TargetSkipped {
            frame: self.frame,
            source,
            target,
            reason,
        });
    }
}

/// What a fully resolved top-level action left behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinishedAction {
    pub action: BattleAction,
    /// The party's escape attempt succeeded.
    pub escaped: bool,
    /// Remaining target iterations were dropped (source incapacitated or escape).
    pub abandoned: bool,
}

/// Result of one [`ActionStateMachine::step`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// No action is current.
    Idle,
    Running,
    /// The top-level action passed its terminal `Finished`.
    Finished(FinishedAction),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct FloatSpec {
    target: BattlerId,
    color: FloatColor,
    text: String,
}

/// State carried by one action on the frame stack.
#[derive(Clone, Debug)]
struct ActionFrame {
    action: BattleAction,
    state: BattleActionState,
    iteration: usize,
    /// Target iterations left, including the current one.
    repeat: usize,
    outcome: Option<Outcome>,
    /// Derived from a reflection; never reflects again.
    reflected: bool,
    heal_started: bool,
    heal_pending: VecDeque<ConditionKind>,
    results: VecDeque<String>,
    float: Option<FloatSpec>,
    escaped: bool,
    abandoned: bool,
}

impl ActionFrame {
    fn top_level(action: BattleAction) -> Self {
        let repeat = action.iterations();
        Self {
            action,
            state: BattleActionState::ConditionHeal,
            iteration: 0,
            repeat,
            outcome: None,
            reflected: false,
            heal_started: false,
            heal_pending: VecDeque::new(),
            results: VecDeque::new(),
            float: None,
            escaped: false,
            abandoned: false,
        }
    }

    fn derived(action: BattleAction, outcome: Outcome) -> Self {
        Self {
            state: BattleActionState::Execute,
            repeat: 1,
            outcome: Some(outcome),
            reflected: true,
            heal_started: true,
            ..Self::top_level(action)
        }
    }

    fn source(&self) -> BattlerId {
        self.action.source
    }

    fn target(&self) -> Option<BattlerId> {
        self.action.target_at(self.iteration)
    }
}

enum Transition {
    Stay,
    Goto(BattleActionState),
    Push(ActionFrame),
    Finish,
}

/// Drives the current action through its states, one state step per frame.
#[derive(Debug, Default)]
pub struct ActionStateMachine {
    frames: Vec<ActionFrame>,
    wait: WaitGate,
}

impl ActionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.frames.is_empty()
    }

    /// State of the innermost frame.
    pub fn current_state(&self) -> Option<BattleActionState> {
        self.frames.last().map(|f| f.state)
    }

    /// The top-level action being resolved.
    pub fn current_action(&self) -> Option<&BattleAction> {
        self.frames.first().map(|f| &f.action)
    }

    /// Source of the innermost frame, the battler currently animating.
    pub fn acting_source(&self) -> Option<BattlerId> {
        self.frames.last().map(ActionFrame::source)
    }

    /// Makes `action` current, entering `ConditionHeal`.
    pub fn begin(&mut self, action: BattleAction, ctx: &mut StepContext<'_>) -> Result<(), MachineError> {
        if let Some(current) = self.frames.first() {
            return Err(MachineError::Busy {
                current: current.source(),
            });
        }

        tracing::debug!(source = %action.source, kind = action.kind.name(), targets = ?action.targets, "action started");
        ctx.events.record(BattleEvent::ActionStarted {
            frame: ctx.frame,
            source: action.source,
            kind: action.kind,
            targets: action.targets.clone(),
        });

        self.wait.clear();
        self.frames.push(ActionFrame::top_level(action));
        self.record_entry(ctx);
        Ok(())
    }

    /// Runs the handler of the current state once.
    pub fn step(&mut self, ctx: &mut StepContext<'_>) -> StepResult {
        let Some(frame) = self.frames.last_mut() else {
            return StepResult::Idle;
        };
        let wait = &mut self.wait;

        let transition = match frame.state {
            BattleActionState::ConditionHeal => condition_heal(frame, wait, ctx),
            BattleActionState::Execute => execute(frame, ctx),
            BattleActionState::Apply => apply(frame, wait, ctx),
            BattleActionState::Reflect => reflect(frame, ctx),
            BattleActionState::ResultPop => result_pop(wait, ctx),
            BattleActionState::ResultPush => result_push(frame, wait, ctx),
            BattleActionState::Death => death(frame, wait, ctx),
            BattleActionState::Finished => finished(frame, wait, ctx),
        };

        match transition {
            Transition::Stay => StepResult::Running,
            Transition::Goto(state) => {
                frame.state = state;
                self.record_entry(ctx);
                StepResult::Running
            }
            Transition::Push(child) => {
                // The original resumes here once the derived frame is done.
                frame.state = BattleActionState::ResultPop;
                self.frames.push(child);
                self.record_entry(ctx);
                StepResult::Running
            }
            Transition::Finish => self.finish_frame(ctx),
        }
    }

    fn finish_frame(&mut self, ctx: &mut StepContext<'_>) -> StepResult {
        let Some(done) = self.frames.pop() else {
            return StepResult::Idle;
        };
        ctx.events.record(BattleEvent::ActionFinished {
            frame: ctx.frame,
            source: done.source(),
        });

        if self.frames.is_empty() {
            tracing::debug!(source = %done.source(), escaped = done.escaped, "action finished");
            self.wait.clear();
            return StepResult::Finished(FinishedAction {
                action: done.action,
                escaped: done.escaped,
                abandoned: done.abandoned,
            });
        }

        // Resume the reflected-from action at ResultPop.
        self.wait.arm(ctx.config.message_wait);
        self.record_entry(ctx);
        StepResult::Running
    }

    fn record_entry(&self, ctx: &mut StepContext<'_>) {
        let Some(frame) = self.frames.last() else {
            return;
        };
        let depth = self.frames.len() - 1;
        tracing::trace!(state = %frame.state, source = %frame.source(), depth, "entering state");
        ctx.events.record(BattleEvent::StateEntered {
            frame: ctx.frame,
            state: frame.state,
            source: frame.source(),
            target: frame.target(),
            depth,
        });
    }
}

fn condition_heal(frame: &mut ActionFrame, wait: &mut WaitGate, ctx: &mut StepContext<'_>) -> Transition {
    let source_id = frame.source();

    if !frame.heal_started {
        frame.heal_started = true;
        if frame.iteration == 0 {
            if let Some(source) = ctx.roster.get_mut(source_id).filter(|b| b.is_targetable()) {
                for kind in source.conditions.tick_turn() {
                    frame.heal_pending.push_back(kind);
                    ctx.events.record(BattleEvent::ConditionRemoved {
                        frame: ctx.frame,
                        battler: source_id,
                        kind,
                    });
                }
            }
            if !frame.heal_pending.is_empty() {
                ctx.status.refresh(ctx.roster);
            }
        }
    }

    if wait.is_armed() && !wait.check_wait(ctx.advance) {
        return Transition::Stay;
    }
    if let Some(kind) = frame.heal_pending.pop_front() {
        let name = ctx.name_of(source_id);
        ctx.show(format!("{name} recovered from {kind}."));
        wait.arm(ctx.config.condition_heal_wait);
        return Transition::Stay;
    }
    ctx.messages.clear();

    let source_can_act = ctx.roster.get(source_id).is_some_and(Battler::can_act);
    if !source_can_act {
        ctx.skip(source_id, frame.target(), "source cannot act");
        frame.abandoned = true;
        return Transition::Goto(BattleActionState::Finished);
    }

    if ctx.escape_pending && frame.iteration > 0 {
        ctx.skip(source_id, frame.target(), "escape requested");
        frame.abandoned = true;
        return Transition::Goto(BattleActionState::Finished);
    }

    let target = frame.target();
    if !target
        .and_then(|id| ctx.roster.get(id))
        .is_some_and(Battler::is_targetable)
    {
        ctx.skip(source_id, target, "target already removed");
        return Transition::Goto(BattleActionState::Finished);
    }

    Transition::Goto(BattleActionState::Execute)
}

fn execute(frame: &mut ActionFrame, ctx: &mut StepContext<'_>) -> Transition {
    let source_id = frame.source();
    let Some(target_id) = frame.target() else {
        ctx.skip(source_id, None, "no target for this iteration");
        return Transition::Goto(BattleActionState::Finished);
    };

    layout::face_target(ctx.roster, source_id, target_id);

    let outcome = match frame.outcome.take() {
        Some(carried) => Ok(carried),
        None => compute_outcome(&frame.action, target_id, ctx),
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(error) => {
            log_error(&error, "action skipped");
            ctx.skip(source_id, Some(target_id), error.to_string());
            return Transition::Goto(BattleActionState::Finished);
        }
    };

    if !frame.reflected {
        // SP is paid once, on the first target, for the whole action.
        if frame.iteration == 0 && outcome.sp_cost > 0 {
            let Some(source) = ctx.roster.get_mut(source_id) else {
                return Transition::Goto(BattleActionState::Finished);
            };
            if source.sp.current < outcome.sp_cost {
                let error = AlgorithmError::InsufficientSp {
                    battler: source_id,
                    required: outcome.sp_cost,
                };
                log_error(&error, "action abandoned");
                ctx.skip(source_id, Some(target_id), error.to_string());
                frame.abandoned = true;
                return Transition::Goto(BattleActionState::Finished);
            }
            source.sp.apply_delta(-(outcome.sp_cost.min(i32::MAX as u32) as i32));
        }
        if !outcome.start_line.is_empty() {
            ctx.show(outcome.start_line.clone());
        }
    }

    frame.outcome = Some(outcome);
    Transition::Goto(BattleActionState::Apply)
}

fn compute_outcome(
    action: &BattleAction,
    target_id: BattlerId,
    ctx: &StepContext<'_>,
) -> Result<Outcome, AlgorithmError> {
    let source = ctx
        .roster
        .get(action.source)
        .ok_or(AlgorithmError::TargetUnavailable(action.source))?;
    let target = ctx
        .roster
        .get(target_id)
        .filter(|b| b.is_targetable())
        .ok_or(AlgorithmError::TargetUnavailable(target_id))?;

    if action.kind.is_escape() && ctx.escape_guaranteed && source.side == Side::Actor {
        return Ok(Outcome::new(format!("{} and the party flee!", source.name))
            .with_flags(OutcomeFlags::ESCAPED));
    }

    ctx.algorithm.compute(source, target, &action.kind, ctx.roster)
}

fn apply(frame: &mut ActionFrame, wait: &mut WaitGate, ctx: &mut StepContext<'_>) -> Transition {
    let source_id = frame.source();
    let (Some(target_id), Some(outcome)) = (frame.target(), frame.outcome.clone()) else {
        ctx.skip(source_id, frame.target(), "no outcome to apply");
        return Transition::Goto(BattleActionState::Finished);
    };

    if let Some(line) = &outcome.second_line {
        ctx.show(line.clone());
    }
    if let Some(animation) = outcome.animation {
        ctx.events.record(BattleEvent::AnimationPlayed {
            frame: ctx.frame,
            target: target_id,
            animation,
        });
    }
    if let Some(sound) = &outcome.sound {
        ctx.events.record(BattleEvent::SoundPlayed {
            frame: ctx.frame,
            name: sound.clone(),
        });
    }

    let bounces = !frame.reflected
        && outcome.is_reflectable()
        && target_id != source_id
        && ctx.roster.get(target_id).is_some_and(Battler::reflects);
    if bounces {
        return Transition::Goto(BattleActionState::Reflect);
    }

    if frame.action.kind.is_escape() {
        apply_escape(frame, &outcome, ctx);
    } else {
        frame.float = apply_effect(source_id, target_id, &outcome, ctx);
    }

    frame.results = outcome.result_lines.iter().cloned().collect();
    ctx.status.refresh(ctx.roster);
    wait.arm(ctx.config.message_wait);
    Transition::Goto(BattleActionState::ResultPop)
}

fn apply_escape(frame: &mut ActionFrame, outcome: &Outcome, ctx: &mut StepContext<'_>) {
    if !outcome.escaped() {
        return;
    }
    let source_id = frame.source();
    let Some(source) = ctx.roster.get_mut(source_id) else {
        return;
    };
    match source.side {
        Side::Actor => frame.escaped = true,
        Side::Enemy => {
            if source.mark_fled() {
                ctx.events.record(BattleEvent::BattlerFled {
                    frame: ctx.frame,
                    battler: source_id,
                });
            }
        }
    }
}

/// Applies HP/SP/condition changes and returns the float text to show.
fn apply_effect(
    source_id: BattlerId,
    target_id: BattlerId,
    outcome: &Outcome,
    ctx: &mut StepContext<'_>,
) -> Option<FloatSpec> {
    let frame = ctx.frame;
    let target = ctx.roster.get_mut(target_id)?;

    if outcome.is_miss() {
        return Some(FloatSpec {
            target: target_id,
            color: FloatColor::Miss,
            text: "Miss".to_owned(),
        });
    }

    let hp_change = if outcome.is_lethal() {
        -(target.hp.deplete().min(i32::MAX as u32) as i32)
    } else {
        target.hp.apply_delta(outcome.hp_delta)
    };
    let sp_change = target.sp.apply_delta(outcome.sp_delta);

    for kind in &outcome.conditions_removed {
        if target.conditions.remove(*kind) {
            ctx.events.record(BattleEvent::ConditionRemoved {
                frame,
                battler: target_id,
                kind: *kind,
            });
        }
    }
    if !target.hp.is_empty() {
        for change in &outcome.conditions_added {
            if target.conditions.add(change.kind, change.turns) {
                ctx.events.record(BattleEvent::ConditionAdded {
                    frame,
                    battler: target_id,
                    kind: change.kind,
                });
            } else {
                tracing::warn!(battler = %target_id, kind = %change.kind, "condition set full");
            }
        }
    }

    ctx.events.record(BattleEvent::EffectApplied {
        frame,
        source: source_id,
        target: target_id,
        hp_change,
        sp_change,
    });

    let color = match hp_change {
        0 if outcome.hp_delta == 0 => return None,
        change if change > 0 => FloatColor::Heal,
        _ if outcome.flags.contains(OutcomeFlags::CRITICAL) => FloatColor::Critical,
        _ => FloatColor::Damage,
    };
    Some(FloatSpec {
        target: target_id,
        color,
        text: hp_change.unsigned_abs().to_string(),
    })
}

fn reflect(frame: &mut ActionFrame, ctx: &mut StepContext<'_>) -> Transition {
    let source_id = frame.source();
    let (Some(reflector), Some(outcome)) = (frame.target(), frame.outcome.clone()) else {
        ctx.skip(source_id, frame.target(), "nothing to reflect");
        return Transition::Goto(BattleActionState::ResultPop);
    };

    ctx.events.record(BattleEvent::Reflected {
        frame: ctx.frame,
        reflector,
        target: source_id,
    });
    let name = ctx.name_of(reflector);
    ctx.show(format!("{name} reflected the effect!"));

    let outcome = match (ctx.roster.get(reflector), ctx.roster.get(source_id)) {
        (Some(from), Some(caster)) => ctx.algorithm.reflected(&outcome, from, caster),
        _ => outcome,
    };
    let derived = frame.action.reflected(reflector);
    Transition::Push(ActionFrame::derived(derived, outcome))
}

fn result_pop(wait: &mut WaitGate, ctx: &mut StepContext<'_>) -> Transition {
    if !wait.check_wait(ctx.advance) {
        return Transition::Stay;
    }
    ctx.messages.pop_line();
    if ctx.messages.is_empty() {
        Transition::Goto(BattleActionState::ResultPush)
    } else {
        wait.arm(ctx.config.message_wait);
        Transition::Stay
    }
}

fn result_push(frame: &mut ActionFrame, wait: &mut WaitGate, ctx: &mut StepContext<'_>) -> Transition {
    if let Some(spec) = frame.float.take() {
        let position = ctx
            .roster
            .get(spec.target)
            .map(|b| b.position.above(16))
            .unwrap_or_default();
        ctx.float_texts.draw_float_text(position, spec.color, spec.text.clone());
        ctx.events.record(BattleEvent::FloatText {
            frame: ctx.frame,
            target: spec.target,
            color: spec.color,
            text: spec.text,
        });
    }

    match frame.results.pop_front() {
        Some(line) => {
            ctx.show(line);
            wait.arm(ctx.config.message_wait);
            Transition::Goto(BattleActionState::ResultPop)
        }
        None => Transition::Goto(BattleActionState::Death),
    }
}

fn death(frame: &mut ActionFrame, wait: &mut WaitGate, ctx: &mut StepContext<'_>) -> Transition {
    let source_id = frame.source();
    let mut checked = Vec::with_capacity(2);
    checked.extend(frame.target());
    if !checked.contains(&source_id) {
        checked.push(source_id);
    }

    let mut anyone_died = false;
    for id in checked {
        let Some(battler) = ctx.roster.get_mut(id) else {
            continue;
        };
        if !battler.is_dying() {
            continue;
        }
        battler.mark_dead();
        let line = match battler.side {
            Side::Actor => format!("{} has fallen!", battler.name),
            Side::Enemy => format!("{} was defeated!", battler.name),
        };
        tracing::debug!(battler = %id, "battler died");
        ctx.events.record(BattleEvent::BattlerDied {
            frame: ctx.frame,
            battler: id,
        });
        ctx.show(line);
        anyone_died = true;
    }

    if anyone_died {
        ctx.status.refresh(ctx.roster);
        wait.arm(ctx.config.message_wait);
    }
    Transition::Goto(BattleActionState::Finished)
}

fn finished(frame: &mut ActionFrame, wait: &mut WaitGate, ctx: &mut StepContext<'_>) -> Transition {
    if !ctx.messages.is_empty() {
        if !wait.check_wait(ctx.advance) {
            return Transition::Stay;
        }
        ctx.messages.clear();
    }
    wait.clear();

    frame.outcome = None;
    frame.results.clear();
    frame.float = None;

    if !frame.abandoned && frame.repeat > 1 {
        frame.repeat -= 1;
        frame.iteration += 1;
        frame.heal_started = false;
        return Transition::Goto(BattleActionState::ConditionHeal);
    }
    Transition::Finish
}
