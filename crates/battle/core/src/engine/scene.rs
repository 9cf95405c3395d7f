//! Battle scene orchestrator.
//!
//! [`BattleScene`] owns the roster, the action queue and the state machine,
//! and advances all of them by exactly one frame per [`BattleScene::update`].
//! Collaborators (algorithm, command providers, status window, asset loader)
//! are injected through [`BattleSceneBuilder`].

use super::events::{BattleEvent, EventLog};
use super::float_text::FloatTextManager;
use super::layout::{self, BattleCondition};
use super::machine::{ActionStateMachine, FinishedAction, StepContext, StepResult};
use super::messages::MessageWindow;
use super::result::{BattleOutcome, check_result_conditions};
use super::wait::WaitGate;
use crate::action::{ActionKind, ActionQueue, ActionRequest, BattleAction, TargetSelection};
use crate::config::{AtbMode, BattleConfig};
use crate::env::{
    AlgorithmProvider, AssetLoader, AssetTracker, CommandProvider, GraphicOwner, IdleCommands,
    ImmediateLoader, NullStatusWindow, StatusWindow,
};
use crate::error::{BattleError, ErrorSeverity, log_error};
use crate::state::{Battler, BattlerId, Roster, RosterError, Side};

/// Graphic shared by every battle scene (gauges, digits, cursors).
pub const SYSTEM_GRAPHIC: &str = "system2";

/// Errors raised while assembling a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("no algorithm provider was configured")]
    MissingAlgorithm,

    #[error("invalid roster: {0}")]
    Roster(#[from] RosterError),
}

impl BattleError for SceneError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingAlgorithm => ErrorSeverity::Fatal,
            Self::Roster(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAlgorithm => "SCENE_MISSING_ALGORITHM",
            Self::Roster(inner) => inner.error_code(),
        }
    }
}

/// Reasons an escape request is refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EscapeError {
    #[error("escape is not allowed in this battle ({condition})")]
    NotAllowed { condition: BattleCondition },

    #[error("an escape is already pending")]
    AlreadyPending,

    #[error("the battle is already decided")]
    BattleOver,

    #[error("no party member is able to flee")]
    NoActorCanFlee,
}

impl BattleError for EscapeError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAllowed { .. } => "ESCAPE_NOT_ALLOWED",
            Self::AlreadyPending => "ESCAPE_ALREADY_PENDING",
            Self::BattleOver => "ESCAPE_BATTLE_OVER",
            Self::NoActorCanFlee => "ESCAPE_NO_ACTOR_CAN_FLEE",
        }
    }
}

/// Player input sampled for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Decision key pressed this frame; lets wait gates open early.
    pub decision: bool,
}

impl FrameInput {
    pub const IDLE: Self = Self { decision: false };
    pub const DECISION: Self = Self { decision: true };
}

/// Coarse lifecycle of the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenePhase {
    /// The start message is on screen.
    Starting,
    /// Gauges fill and actions resolve.
    Running,
    /// The outcome message dwells before the scene closes.
    Ending(BattleOutcome),
    /// Nothing left to do; the caller should leave the scene.
    Over(BattleOutcome),
}

/// A running battle.
pub struct BattleScene {
    config: BattleConfig,
    condition: BattleCondition,
    roster: Roster,
    algorithm: Box<dyn AlgorithmProvider>,
    player: Box<dyn CommandProvider>,
    enemy_ai: Box<dyn CommandProvider>,
    status: Box<dyn StatusWindow>,
    loader: Box<dyn AssetLoader>,
    assets: AssetTracker,
    queue: ActionQueue,
    machine: ActionStateMachine,
    scene_wait: WaitGate,
    messages: MessageWindow,
    float_texts: FloatTextManager,
    events: EventLog,
    phase: ScenePhase,
    allow_escape: bool,
    auto_battle: bool,
    escape_pending: bool,
    escape_attempted: bool,
    /// The escape being resolved is the first one of an initiative battle.
    escape_guaranteed: bool,
    frame: u64,
}

impl BattleScene {
    pub fn builder() -> BattleSceneBuilder {
        BattleSceneBuilder::new()
    }

    /// Advances the battle by one frame.
    ///
    /// Order within a frame: asset completions, phase logic (start message,
    /// between-action bookkeeping or one state machine step, outcome dwell),
    /// facing, floating texts.
    pub fn update(&mut self, input: FrameInput) {
        let advance = input.decision || self.config.auto_advance;

        self.poll_assets();

        match self.phase {
            ScenePhase::Starting => self.update_start(advance),
            ScenePhase::Running => self.update_running(advance),
            ScenePhase::Ending(outcome) => {
                if self.scene_wait.check_wait(advance) {
                    self.messages.clear();
                    self.phase = ScenePhase::Over(outcome);
                    tracing::info!(%outcome, frame = self.frame, "battle scene finished");
                }
            }
            ScenePhase::Over(_) => {}
        }

        layout::update_directions(&mut self.roster, self.machine.acting_source());
        self.float_texts.update();
        self.frame += 1;
    }

    /// Runs frames until the scene is over or `max_frames` elapse.
    ///
    /// Returns the outcome if the battle was decided.
    pub fn run_to_end(&mut self, max_frames: u64) -> Option<BattleOutcome> {
        for _ in 0..max_frames {
            if self.is_finished() {
                break;
            }
            self.update(FrameInput::IDLE);
        }
        self.outcome()
    }

    /// Asks the party to flee. Takes effect at the next safe point: the
    /// current target iteration still completes, remaining ones are dropped.
    pub fn request_escape(&mut self) -> Result<(), EscapeError> {
        if matches!(self.phase, ScenePhase::Ending(_) | ScenePhase::Over(_)) {
            return Err(EscapeError::BattleOver);
        }
        if !self.allow_escape || !self.condition.allows_escape() {
            return Err(EscapeError::NotAllowed {
                condition: self.condition,
            });
        }
        if self.escape_pending {
            return Err(EscapeError::AlreadyPending);
        }
        if !self.roster.actors().any(Battler::can_act) {
            return Err(EscapeError::NoActorCanFlee);
        }

        tracing::info!(frame = self.frame, "escape requested");
        self.escape_pending = true;
        self.events.record(BattleEvent::EscapeRequested { frame: self.frame });
        Ok(())
    }

    /// Lets the enemy AI pick commands for the party as well.
    pub fn set_auto_battle(&mut self, enabled: bool) {
        self.auto_battle = enabled;
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            ScenePhase::Ending(outcome) | ScenePhase::Over(outcome) => Some(outcome),
            ScenePhase::Starting | ScenePhase::Running => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, ScenePhase::Over(_))
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn condition(&self) -> BattleCondition {
        self.condition
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn messages(&self) -> &MessageWindow {
        &self.messages
    }

    pub fn float_texts(&self) -> &FloatTextManager {
        &self.float_texts
    }

    pub fn machine(&self) -> &ActionStateMachine {
        &self.machine
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn assets(&self) -> &AssetTracker {
        &self.assets
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Takes the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain()
    }

    /// Number of frames processed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_escape_pending(&self) -> bool {
        self.escape_pending
    }

    fn poll_assets(&mut self) {
        for graphic in self.assets.poll() {
            self.events.record(BattleEvent::GraphicResolved {
                frame: self.frame,
                owner: graphic.owner,
                name: graphic.name,
                status: graphic.status,
            });
        }
    }

    fn update_start(&mut self, advance: bool) {
        if !self.scene_wait.is_armed() && self.messages.is_empty() {
            self.show(self.condition.start_message().to_owned());
            self.scene_wait.arm(self.config.start_wait);
            return;
        }
        if self.scene_wait.check_wait(advance) {
            self.messages.clear();
            self.phase = ScenePhase::Running;
        }
    }

    fn update_running(&mut self, advance: bool) {
        if self.machine.is_idle() {
            self.between_actions();
        } else {
            self.step_machine(advance);
            if self.config.atb_mode == AtbMode::Active && self.phase == ScenePhase::Running {
                self.fill_gauges();
                self.collect_commands();
            }
        }
    }

    /// Bookkeeping done while no action is current.
    fn between_actions(&mut self) {
        if let Some(outcome) = check_result_conditions(&self.roster) {
            self.finish(outcome);
            return;
        }

        if self.escape_pending && self.begin_escape() {
            return;
        }

        while let Some(action) = self.queue.pop() {
            let ready = self
                .roster
                .get(action.source)
                .is_some_and(Battler::is_targetable);
            if !ready {
                tracing::debug!(source = %action.source, "dropping queued action of a removed battler");
                continue;
            }
            self.begin(action);
            return;
        }

        self.fill_gauges();
        self.collect_commands();
    }

    /// Replaces the queue with a single escape action by the first able actor.
    ///
    /// The queue is kept if the party lost its last able actor after the
    /// request was made.
    fn begin_escape(&mut self) -> bool {
        self.escape_pending = false;

        let Some(source) = self.roster.actors().find(|b| b.can_act()).map(|b| b.id) else {
            log_error(&EscapeError::NoActorCanFlee, "escape dropped");
            return false;
        };
        self.discard_queue();
        let request = ActionRequest::escape(source);
        match BattleAction::from_request(&request, &self.roster) {
            Ok(action) => {
                self.queue.push_front(action);
                true
            }
            Err(error) => {
                log_error(&error, "escape rejected");
                false
            }
        }
    }

    fn begin(&mut self, action: BattleAction) {
        self.escape_guaranteed = action.kind.is_escape()
            && self.condition.guarantees_first_escape()
            && !self.escape_attempted;
        if action.kind.is_escape() {
            self.escape_attempted = true;
        }

        let mut ctx = StepContext {
            roster: &mut self.roster,
            algorithm: self.algorithm.as_ref(),
            status: self.status.as_mut(),
            messages: &mut self.messages,
            float_texts: &mut self.float_texts,
            events: &mut self.events,
            config: &self.config,
            frame: self.frame,
            advance: false,
            escape_pending: self.escape_pending,
            escape_guaranteed: self.escape_guaranteed,
        };
        if let Err(error) = self.machine.begin(action, &mut ctx) {
            log_error(&error, "action not started");
        }
    }

    fn step_machine(&mut self, advance: bool) {
        let mut ctx = StepContext {
            roster: &mut self.roster,
            algorithm: self.algorithm.as_ref(),
            status: self.status.as_mut(),
            messages: &mut self.messages,
            float_texts: &mut self.float_texts,
            events: &mut self.events,
            config: &self.config,
            frame: self.frame,
            advance,
            escape_pending: self.escape_pending,
            escape_guaranteed: self.escape_guaranteed,
        };

        if let StepResult::Finished(finished) = self.machine.step(&mut ctx) {
            self.after_action(finished);
        }
    }

    fn after_action(&mut self, finished: FinishedAction) {
        self.escape_guaranteed = false;
        let source = finished.action.source;
        if let Some(battler) = self.roster.get_mut(source) {
            battler.atb = 0;
        }

        if finished.escaped {
            self.finish(BattleOutcome::Escaped);
            return;
        }
        if let Some(outcome) = check_result_conditions(&self.roster) {
            self.finish(outcome);
        }
    }

    fn fill_gauges(&mut self) {
        let atb_max = self.config.atb_max;
        let current = self.machine.current_action().map(|a| a.source);
        for battler in self.roster.iter_mut() {
            if !battler.is_targetable() || Some(battler.id) == current {
                continue;
            }
            let step = self.config.atb_increment(battler.stats.agility);
            battler.atb = battler.atb.saturating_add(step).min(atb_max);
        }
    }

    /// Asks the command providers for every battler whose gauge is full.
    ///
    /// Battlers unable to act still take their turn so their conditions
    /// count down; they queue a `Wait` that resolves as a skip.
    fn collect_commands(&mut self) {
        let atb_max = self.config.atb_max;
        let current = self.machine.current_action().map(|a| a.source);
        let ready: Vec<BattlerId> = self
            .roster
            .iter()
            .filter(|b| b.is_targetable() && b.is_atb_full(atb_max))
            .filter(|b| Some(b.id) != current && !self.queue.has_source(b.id))
            .filter(|b| b.side == Side::Enemy || !self.escape_pending)
            .map(|b| b.id)
            .collect();

        for id in ready {
            let Some(battler) = self.roster.get(id) else {
                continue;
            };

            let request = if !battler.can_act() {
                Some(ActionRequest::new(id, ActionKind::Wait, TargetSelection::Itself))
            } else if battler.side == Side::Enemy || self.auto_battle {
                self.enemy_ai.select(battler, &self.roster)
            } else {
                self.player.select(battler, &self.roster)
            };
            let Some(request) = request else {
                continue;
            };

            if request.source != id {
                tracing::warn!(expected = %id, got = %request.source, "command provider answered for another battler");
                continue;
            }
            if request.kind.is_escape() {
                // Party escapes go through request_escape; enemies flee as actions.
                if battler.side == Side::Actor {
                    if let Err(error) = self.request_escape() {
                        log_error(&error, "escape command ignored");
                    }
                    continue;
                }
            }

            match BattleAction::from_request(&request, &self.roster) {
                Ok(action) => {
                    self.events.record(BattleEvent::CommandQueued {
                        frame: self.frame,
                        source: id,
                        kind: action.kind,
                    });
                    self.queue.push(action);
                }
                Err(error) => log_error(&error, "command rejected"),
            }
        }
    }

    fn discard_queue(&mut self) {
        let count = self.queue.discard_all();
        if count > 0 {
            tracing::debug!(count, "discarding queued actions");
            self.events.record(BattleEvent::ActionsDiscarded {
                frame: self.frame,
                count,
            });
        }
    }

    fn finish(&mut self, outcome: BattleOutcome) {
        self.discard_queue();
        self.escape_pending = false;
        tracing::info!(%outcome, frame = self.frame, "battle decided");
        self.events.record(BattleEvent::OutcomeDecided {
            frame: self.frame,
            outcome,
        });
        self.messages.clear();
        self.show(outcome.message().to_owned());
        self.scene_wait
            .set_wait(self.config.outcome_wait, self.config.outcome_wait);
        self.phase = ScenePhase::Ending(outcome);
        self.status.refresh(&self.roster);
    }

    fn show(&mut self, text: String) {
        self.messages.push_line(text.clone());
        self.events.record(BattleEvent::Message {
            frame: self.frame,
            text,
        });
    }
}

/// Builder for [`BattleScene`].
pub struct BattleSceneBuilder {
    config: BattleConfig,
    condition: BattleCondition,
    battlers: Vec<Battler>,
    algorithm: Option<Box<dyn AlgorithmProvider>>,
    player: Box<dyn CommandProvider>,
    enemy_ai: Box<dyn CommandProvider>,
    status: Box<dyn StatusWindow>,
    loader: Box<dyn AssetLoader>,
    allow_escape: bool,
    auto_battle: bool,
}

impl BattleSceneBuilder {
    fn new() -> Self {
        Self {
            config: BattleConfig::default(),
            condition: BattleCondition::default(),
            battlers: Vec::new(),
            algorithm: None,
            player: Box::new(IdleCommands),
            enemy_ai: Box::new(IdleCommands),
            status: Box::new(NullStatusWindow),
            loader: Box::new(ImmediateLoader),
            allow_escape: true,
            auto_battle: false,
        }
    }

    pub fn config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn condition(mut self, condition: BattleCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Party members and troop members, in display order.
    pub fn battlers(mut self, battlers: impl IntoIterator<Item = Battler>) -> Self {
        self.battlers.extend(battlers);
        self
    }

    /// Set the outcome algorithm (required)
    pub fn algorithm(mut self, algorithm: impl AlgorithmProvider + 'static) -> Self {
        self.algorithm = Some(Box::new(algorithm));
        self
    }

    /// Command source for party members (menus, scripted input).
    pub fn player(mut self, provider: impl CommandProvider + 'static) -> Self {
        self.player = Box::new(provider);
        self
    }

    /// Command source for enemies, and for the party under auto battle.
    pub fn enemy_ai(mut self, provider: impl CommandProvider + 'static) -> Self {
        self.enemy_ai = Box::new(provider);
        self
    }

    pub fn status_window(mut self, status: impl StatusWindow + 'static) -> Self {
        self.status = Box::new(status);
        self
    }

    pub fn asset_loader(mut self, loader: impl AssetLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Whether the troop allows the party to run (boss fights usually don't).
    pub fn allow_escape(mut self, allow: bool) -> Self {
        self.allow_escape = allow;
        self
    }

    pub fn auto_battle(mut self, enabled: bool) -> Self {
        self.auto_battle = enabled;
        self
    }

    /// Validates the roster, lays out the formation and requests graphics.
    pub fn build(self) -> Result<BattleScene, SceneError> {
        let algorithm = self.algorithm.ok_or(SceneError::MissingAlgorithm)?;
        let mut roster = Roster::new(self.battlers)?;

        layout::arrange(&mut roster, self.condition);
        layout::init_atb_gauges(&mut roster, self.condition, &self.config);
        layout::update_directions(&mut roster, None);

        let mut scene = BattleScene {
            messages: MessageWindow::new(self.config.message_lines),
            float_texts: FloatTextManager::new(self.config.float_text_lifetime),
            config: self.config,
            condition: self.condition,
            roster,
            algorithm,
            player: self.player,
            enemy_ai: self.enemy_ai,
            status: self.status,
            loader: self.loader,
            assets: AssetTracker::new(),
            queue: ActionQueue::new(),
            machine: ActionStateMachine::new(),
            scene_wait: WaitGate::new(),
            events: EventLog::new(),
            phase: ScenePhase::Starting,
            allow_escape: self.allow_escape,
            auto_battle: self.auto_battle,
            escape_pending: false,
            escape_attempted: false,
            escape_guaranteed: false,
            frame: 0,
        };

        tracing::info!(condition = %scene.condition, battlers = scene.roster.len(), "battle scene created");
        scene.events.record(BattleEvent::BattleStarted {
            condition: scene.condition,
        });

        scene
            .assets
            .request(scene.loader.as_mut(), SYSTEM_GRAPHIC, GraphicOwner::System);
        let sprites: Vec<(BattlerId, String)> = scene
            .roster
            .iter()
            .filter_map(|b| b.sprite.clone().map(|s| (b.id, s)))
            .collect();
        for (id, sprite) in sprites {
            scene
                .assets
                .request(scene.loader.as_mut(), &sprite, GraphicOwner::Battler(id));
        }

        scene.status.refresh(&scene.roster);
        Ok(scene)
    }
}
