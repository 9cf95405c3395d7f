#![allow(dead_code)]

use std::collections::VecDeque;

use battle_core::engine::machine::StepContext;
use battle_core::{
    ActionKind, ActionRequest, ActionStateMachine, AlgorithmError, AlgorithmProvider,
    BattleAction, BattleActionState, BattleConfig, BattleEvent, Battler, BattlerId, BattlerStats,
    CommandProvider, ConditionChange, ConditionKind, EventLog, FloatTextManager, MessageWindow,
    NullStatusWindow, Outcome, OutcomeFlags, Roster, Side, SkillId, StepResult,
};

pub const HERO: BattlerId = BattlerId(1);
pub const MAGE: BattlerId = BattlerId(2);
pub const SLIME: BattlerId = BattlerId(10);
pub const BAT: BattlerId = BattlerId(11);
pub const GOLEM: BattlerId = BattlerId(12);

pub const FIRE: SkillId = SkillId(1);
pub const SLEEP_SPELL: SkillId = SkillId(2);
pub const DOOM: SkillId = SkillId(3);
pub const WHIFF: SkillId = SkillId(4);
pub const BROKEN: SkillId = SkillId(99);

/// Deterministic formulas small enough to reason about in assertions.
///
/// - Attack: damage equals the source's attack stat, one result line
/// - FIRE: reflectable, damage equals the source's magic stat, costs 5 SP
/// - SLEEP_SPELL: inflicts sleep for two turns
/// - DOOM: kills outright regardless of HP
/// - WHIFF: always misses
/// - BROKEN: always refused
/// - Escape: always succeeds
pub struct StubAlgorithm;

impl AlgorithmProvider for StubAlgorithm {
    fn compute(
        &self,
        source: &Battler,
        target: &Battler,
        kind: &ActionKind,
        _roster: &Roster,
    ) -> Result<Outcome, AlgorithmError> {
        match kind {
            ActionKind::Attack => {
                let damage = source.stats.attack;
                Ok(Outcome::new(format!("{} attacks!", source.name))
                    .with_hp_delta(-(damage as i32))
                    .with_result_line(format!("{} takes {} damage.", target.name, damage)))
            }
            ActionKind::Skill(id) if *id == FIRE => {
                let damage = source.stats.magic;
                Ok(Outcome::new(format!("{} casts Fire!", source.name))
                    .with_hp_delta(-(damage as i32))
                    .with_sp_cost(5)
                    .with_animation(7)
                    .with_flags(OutcomeFlags::REFLECTABLE)
                    .with_result_line(format!("{} takes {} damage.", target.name, damage)))
            }
            ActionKind::Skill(id) if *id == SLEEP_SPELL => {
                Ok(Outcome::new(format!("{} casts Sleep!", source.name))
                    .with_condition(ConditionChange::new(ConditionKind::Sleep, Some(2)))
                    .with_result_line(format!("{} falls asleep.", target.name)))
            }
            ActionKind::Skill(id) if *id == DOOM => {
                Ok(Outcome::new(format!("{} casts Doom!", source.name))
                    .with_flags(OutcomeFlags::KILLS)
                    .with_result_line(format!("{} is struck down!", target.name)))
            }
            ActionKind::Skill(id) if *id == WHIFF => {
                Ok(Outcome::new(format!("{} swings wildly!", source.name))
                    .with_hp_delta(-10)
                    .with_flags(OutcomeFlags::MISSED)
                    .with_result_line(format!("{} misses!", source.name)))
            }
            ActionKind::Skill(_) => Err(AlgorithmError::Unsupported { kind: "skill" }),
            ActionKind::Escape => Ok(Outcome::new(format!("{} tries to run.", source.name))
                .with_flags(OutcomeFlags::ESCAPED)),
            ActionKind::Wait | ActionKind::Defend => {
                Ok(Outcome::new(format!("{} waits.", source.name)))
            }
            ActionKind::Item(_) => Err(AlgorithmError::Unsupported { kind: "item" }),
        }
    }
}

/// Answers each battler with its next scripted request, in order.
#[derive(Default)]
pub struct Script {
    requests: VecDeque<ActionRequest>,
}

impl Script {
    pub fn new(requests: impl IntoIterator<Item = ActionRequest>) -> Self {
        Self {
            requests: requests.into_iter().collect(),
        }
    }
}

impl CommandProvider for Script {
    fn select(&mut self, battler: &Battler, _roster: &Roster) -> Option<ActionRequest> {
        let index = self.requests.iter().position(|r| r.source == battler.id)?;
        self.requests.remove(index)
    }
}

/// Attacks the first standing opponent.
pub struct FirstTargetAi;

impl CommandProvider for FirstTargetAi {
    fn select(&mut self, battler: &Battler, roster: &Roster) -> Option<ActionRequest> {
        let target = roster.targetable(battler.side.opponent()).next()?;
        Some(ActionRequest::attack(battler.id, target.id))
    }
}

pub fn hero() -> Battler {
    Battler::new(HERO, "Hero", Side::Actor, 120)
        .with_sp(30)
        .with_stats(BattlerStats::new(50, 10, 20, 30))
}

pub fn mage() -> Battler {
    Battler::new(MAGE, "Mage", Side::Actor, 80)
        .with_sp(60)
        .with_stats(BattlerStats::new(8, 6, 25, 12))
}

pub fn slime() -> Battler {
    Battler::new(SLIME, "Slime", Side::Enemy, 40).with_stats(BattlerStats::new(6, 2, 4, 5))
}

pub fn bat() -> Battler {
    Battler::new(BAT, "Bat", Side::Enemy, 30).with_stats(BattlerStats::new(4, 1, 2, 8))
}

pub fn golem() -> Battler {
    Battler::new(GOLEM, "Golem", Side::Enemy, 500).with_stats(BattlerStats::new(20, 30, 0, 2))
}

/// Owns everything a [`StepContext`] borrows, for driving the machine directly.
pub struct Harness {
    pub roster: Roster,
    pub machine: ActionStateMachine,
    pub messages: MessageWindow,
    pub float_texts: FloatTextManager,
    pub events: EventLog,
    pub config: BattleConfig,
    pub status: NullStatusWindow,
    pub frame: u64,
}

impl Harness {
    pub fn new(battlers: impl IntoIterator<Item = Battler>) -> Self {
        let config = BattleConfig::instant();
        Self {
            roster: Roster::new(battlers).expect("valid roster"),
            machine: ActionStateMachine::new(),
            messages: MessageWindow::new(config.message_lines),
            float_texts: FloatTextManager::new(config.float_text_lifetime),
            events: EventLog::new(),
            config,
            status: NullStatusWindow,
            frame: 0,
        }
    }

    pub fn action(&self, request: ActionRequest) -> BattleAction {
        BattleAction::from_request(&request, &self.roster).expect("valid request")
    }

    /// Begins `action` and steps until it finishes. Panics after `limit` frames.
    pub fn resolve(&mut self, action: BattleAction) -> StepResult {
        self.resolve_with(action, |_| false)
    }

    /// Like [`resolve`](Self::resolve), with an escape flag computed per frame.
    pub fn resolve_with(
        &mut self,
        action: BattleAction,
        mut escape_pending: impl FnMut(&ActionStateMachine) -> bool,
    ) -> StepResult {
        let algorithm = StubAlgorithm;
        {
            let mut ctx = StepContext {
                roster: &mut self.roster,
                algorithm: &algorithm,
                status: &mut self.status,
                messages: &mut self.messages,
                float_texts: &mut self.float_texts,
                events: &mut self.events,
                config: &self.config,
                frame: self.frame,
                advance: true,
                escape_pending: false,
                escape_guaranteed: false,
            };
            self.machine.begin(action, &mut ctx).expect("machine idle");
        }

        for _ in 0..1_000 {
            self.frame += 1;
            let pending = escape_pending(&self.machine);
            let mut ctx = StepContext {
                roster: &mut self.roster,
                algorithm: &algorithm,
                status: &mut self.status,
                messages: &mut self.messages,
                float_texts: &mut self.float_texts,
                events: &mut self.events,
                config: &self.config,
                frame: self.frame,
                advance: true,
                escape_pending: pending,
                escape_guaranteed: false,
            };
            let result = self.machine.step(&mut ctx);
            if matches!(result, StepResult::Finished(_)) {
                return result;
            }
        }
        panic!("action did not finish within 1000 frames");
    }

    /// `(state, depth)` pairs in entry order.
    pub fn states(&self) -> Vec<(BattleActionState, usize)> {
        states_of(self.events.iter())
    }

    pub fn battler(&self, id: BattlerId) -> &Battler {
        self.roster.get(id).expect("battler exists")
    }
}

pub fn states_of<'a>(
    events: impl IntoIterator<Item = &'a BattleEvent>,
) -> Vec<(BattleActionState, usize)> {
    events
        .into_iter()
        .filter_map(|event| match event {
            BattleEvent::StateEntered { state, depth, .. } => Some((*state, *depth)),
            _ => None,
        })
        .collect()
}

pub fn messages_of<'a>(events: impl IntoIterator<Item = &'a BattleEvent>) -> Vec<String> {
    events
        .into_iter()
        .filter_map(|event| match event {
            BattleEvent::Message { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}
