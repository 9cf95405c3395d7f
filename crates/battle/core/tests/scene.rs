//! Whole-scene behaviour: ATB, command collection, escape, outcome, assets.

mod common;

use std::sync::{Arc, Mutex};

use battle_core::{
    ActionKind, ActionRequest, AlgorithmError, AlgorithmProvider, AssetError, AssetLoader,
    AssetNotifier, AtbMode, BattleActionState, BattleCondition, BattleConfig, BattleEvent,
    BattleOutcome, BattleScene, Battler, ConditionKind, EscapeError, FrameInput, GraphicOwner,
    GraphicStatus, Outcome, Roster, ScenePhase, TargetSelection,
};

use common::*;

const FRAME_LIMIT: u64 = 20_000;

fn scene_with(
    battlers: Vec<Battler>,
    script: Script,
    condition: BattleCondition,
) -> BattleScene {
    BattleScene::builder()
        .config(BattleConfig::instant())
        .condition(condition)
        .battlers(battlers)
        .algorithm(StubAlgorithm)
        .player(script)
        .build()
        .expect("scene builds")
}

fn step_until(scene: &mut BattleScene, mut done: impl FnMut(&BattleScene) -> bool) {
    for _ in 0..FRAME_LIMIT {
        if done(scene) {
            return;
        }
        scene.update(FrameInput::IDLE);
    }
    panic!("condition not reached within {FRAME_LIMIT} frames");
}

#[test]
fn lethal_attack_wins_the_battle() {
    let mut scene = scene_with(
        vec![hero(), slime()],
        Script::new([ActionRequest::attack(HERO, SLIME)]),
        BattleCondition::None,
    );

    assert_eq!(scene.run_to_end(FRAME_LIMIT), Some(BattleOutcome::Victory));
    assert!(scene.is_finished());

    let events: Vec<_> = scene.events().iter().cloned().collect();
    assert!(matches!(events[0], BattleEvent::BattleStarted { condition: BattleCondition::None }));
    let messages = messages_of(&events);
    assert_eq!(messages.first().map(String::as_str), Some("Enemies appear!"));
    assert_eq!(messages.last().map(String::as_str), Some("Victory!"));
    assert!(events.iter().any(|e| matches!(
        e,
        BattleEvent::OutcomeDecided { outcome: BattleOutcome::Victory, .. }
    )));
}

#[test]
fn at_most_one_state_transition_per_frame() {
    let mut scene = BattleScene::builder()
        .config(BattleConfig::instant())
        .battlers([hero(), mage(), slime(), bat()])
        .algorithm(StubAlgorithm)
        .enemy_ai(FirstTargetAi)
        .auto_battle(true)
        .build()
        .expect("scene builds");

    scene.run_to_end(FRAME_LIMIT);

    let mut per_frame = std::collections::BTreeMap::<u64, usize>::new();
    for event in scene.events().iter() {
        if let BattleEvent::StateEntered { frame, .. } = event {
            *per_frame.entry(*frame).or_default() += 1;
        }
    }
    assert!(!per_frame.is_empty());
    assert!(per_frame.values().all(|count| *count == 1), "{per_frame:?}");
}

#[test]
fn escape_waits_for_the_current_target_to_finish() {
    let mut hero = hero();
    hero.stats.attack = 1;
    let mut scene = scene_with(
        vec![hero, golem(), bat()],
        Script::new([ActionRequest::new(
            HERO,
            ActionKind::Attack,
            TargetSelection::AllOpponents,
        )]),
        BattleCondition::None,
    );

    step_until(&mut scene, |s| {
        s.machine().current_state() == Some(BattleActionState::ResultPush)
    });
    scene.request_escape().expect("escape allowed");
    assert_eq!(scene.request_escape(), Err(EscapeError::AlreadyPending));

    assert_eq!(scene.run_to_end(FRAME_LIMIT), Some(BattleOutcome::Escaped));
    assert_eq!(scene.roster().get(GOLEM).unwrap().hp.current, 499);
    assert_eq!(scene.roster().get(BAT).unwrap().hp.current, 30);
    assert!(scene.events().iter().any(|e| matches!(
        e,
        BattleEvent::TargetSkipped { target: Some(BAT), reason, .. } if reason == "escape requested"
    )));
    assert_eq!(scene.request_escape(), Err(EscapeError::BattleOver));
}

#[test]
fn back_attack_and_boss_battles_forbid_escape() {
    let mut scene = scene_with(vec![hero(), slime()], Script::default(), BattleCondition::Back);
    assert_eq!(
        scene.request_escape(),
        Err(EscapeError::NotAllowed { condition: BattleCondition::Back })
    );

    let mut boss = BattleScene::builder()
        .battlers([hero(), golem()])
        .algorithm(StubAlgorithm)
        .allow_escape(false)
        .build()
        .expect("scene builds");
    assert!(matches!(boss.request_escape(), Err(EscapeError::NotAllowed { .. })));
}

/// Delegates to [`StubAlgorithm`] but never lets anyone run.
struct NoEscape;

impl AlgorithmProvider for NoEscape {
    fn compute(
        &self,
        source: &Battler,
        target: &Battler,
        kind: &ActionKind,
        roster: &Roster,
    ) -> Result<Outcome, AlgorithmError> {
        match kind {
            ActionKind::Escape => Ok(Outcome::new(format!("{} tries to run.", source.name))
                .with_result_line("Couldn't escape!")),
            _ => StubAlgorithm.compute(source, target, kind, roster),
        }
    }
}

#[test]
fn initiative_guarantees_the_first_escape() {
    let mut scene = BattleScene::builder()
        .config(BattleConfig::instant())
        .condition(BattleCondition::Initiative)
        .battlers([hero(), golem()])
        .algorithm(NoEscape)
        .build()
        .expect("scene builds");

    scene.request_escape().expect("escape allowed");
    assert_eq!(scene.run_to_end(FRAME_LIMIT), Some(BattleOutcome::Escaped));
}

#[test]
fn failed_escape_keeps_the_battle_going() {
    let mut scene = BattleScene::builder()
        .config(BattleConfig::instant())
        .battlers([hero(), golem()])
        .algorithm(NoEscape)
        .build()
        .expect("scene builds");

    scene.request_escape().expect("escape allowed");
    step_until(&mut scene, |s| {
        s.events().iter().any(|e| matches!(e, BattleEvent::ActionFinished { source: HERO, .. }))
    });

    assert_eq!(scene.outcome(), None);
    assert!(messages_of(scene.events().iter()).contains(&"Couldn't escape!".to_owned()));
    assert!(!scene.is_escape_pending());
}

#[test]
fn outcome_message_dwells_before_the_scene_ends() {
    let config = BattleConfig {
        outcome_wait: 5,
        ..BattleConfig::instant()
    };
    let mut scene = BattleScene::builder()
        .config(config)
        .battlers([hero(), slime()])
        .algorithm(StubAlgorithm)
        .player(Script::new([ActionRequest::attack(HERO, SLIME)]))
        .build()
        .expect("scene builds");

    step_until(&mut scene, |s| s.outcome().is_some());
    assert_eq!(scene.phase(), ScenePhase::Ending(BattleOutcome::Victory));
    assert_eq!(scene.messages().lines().collect::<Vec<_>>(), vec!["Victory!"]);

    for _ in 0..4 {
        scene.update(FrameInput::IDLE);
        assert!(!scene.is_finished());
    }
    scene.update(FrameInput::IDLE);
    assert_eq!(scene.phase(), ScenePhase::Over(BattleOutcome::Victory));
    assert!(scene.messages().is_empty());
}

#[test]
fn party_wiped_out_is_a_defeat() {
    let mut scene = BattleScene::builder()
        .config(BattleConfig::instant())
        .battlers([mage(), golem()])
        .algorithm(StubAlgorithm)
        .enemy_ai(FirstTargetAi)
        .build()
        .expect("scene builds");

    assert_eq!(scene.run_to_end(FRAME_LIMIT), Some(BattleOutcome::Defeat));
    assert!(scene.roster().get(MAGE).unwrap().is_dead());
}

#[test]
fn sleeping_battler_loses_turns_until_it_wakes() {
    let sleepy = hero().with_condition(ConditionKind::Sleep, Some(2));
    let mut scene = scene_with(
        vec![sleepy, slime()],
        Script::new([ActionRequest::attack(HERO, SLIME)]),
        BattleCondition::None,
    );

    assert_eq!(scene.run_to_end(FRAME_LIMIT), Some(BattleOutcome::Victory));
    let events: Vec<_> = scene.events().iter().cloned().collect();
    assert!(events.iter().any(|e| matches!(
        e,
        BattleEvent::TargetSkipped { source: HERO, reason, .. } if reason == "source cannot act"
    )));
    assert!(messages_of(&events).contains(&"Hero recovered from sleep.".to_owned()));
}

#[test]
fn active_mode_keeps_filling_gauges_during_actions() {
    fn mage_gain(mode: AtbMode) -> u32 {
        let config = BattleConfig {
            atb_mode: mode,
            ..BattleConfig::instant()
        };
        let mut scene = BattleScene::builder()
            .config(config)
            .battlers([hero(), mage(), golem()])
            .algorithm(StubAlgorithm)
            .player(Script::new([ActionRequest::attack(HERO, GOLEM)]))
            .build()
            .expect("scene builds");

        step_until(&mut scene, |s| !s.machine().is_idle());
        let before = scene.roster().get(MAGE).unwrap().atb;
        scene.update(FrameInput::IDLE);
        scene.roster().get(MAGE).unwrap().atb - before
    }

    assert_eq!(mage_gain(AtbMode::Wait), 0);
    assert_eq!(mage_gain(AtbMode::Active), 12);
}

#[test]
fn identical_inputs_replay_identically() {
    fn run() -> (Option<BattleOutcome>, Vec<BattleEvent>) {
        let mut scene = BattleScene::builder()
            .config(BattleConfig::instant())
            .condition(BattleCondition::SurroundAttack)
            .battlers([hero(), mage(), slime(), bat(), golem()])
            .algorithm(StubAlgorithm)
            .enemy_ai(FirstTargetAi)
            .auto_battle(true)
            .build()
            .expect("scene builds");
        let outcome = scene.run_to_end(FRAME_LIMIT);
        (outcome, scene.take_events())
    }

    let (first_outcome, first) = run();
    let (second_outcome, second) = run();
    assert!(first_outcome.is_some());
    assert_eq!(first_outcome, second_outcome);
    assert_eq!(first, second);
}

/// Hands notifiers to the test so it decides when graphics complete.
#[derive(Clone, Default)]
struct DeferredLoader {
    held: Arc<Mutex<Vec<(String, AssetNotifier)>>>,
}

impl DeferredLoader {
    fn complete(&self, name: &str, result: Result<(), AssetError>) {
        let mut held = self.held.lock().unwrap();
        let index = held.iter().position(|(n, _)| n == name).expect("requested");
        let (_, notifier) = held.remove(index);
        notifier.notify(result);
    }
}

impl AssetLoader for DeferredLoader {
    fn request_graphic(&mut self, name: &str, notifier: AssetNotifier) {
        self.held.lock().unwrap().push((name.to_owned(), notifier));
    }
}

#[test]
fn battle_runs_on_placeholders_until_graphics_arrive() {
    let loader = DeferredLoader::default();
    let mut scene = BattleScene::builder()
        .config(BattleConfig::instant())
        .battlers([hero().with_sprite("hero"), slime().with_sprite("slime")])
        .algorithm(StubAlgorithm)
        .player(Script::new([ActionRequest::attack(HERO, SLIME)]))
        .asset_loader(loader.clone())
        .build()
        .expect("scene builds");

    for _ in 0..3 {
        scene.update(FrameInput::IDLE);
    }
    assert_eq!(scene.phase(), ScenePhase::Running);
    assert_eq!(scene.assets().pending(), 3);
    assert_eq!(scene.assets().status(GraphicOwner::System), Some(GraphicStatus::Pending));

    loader.complete("system2", Ok(()));
    loader.complete("slime", Err(AssetError::NotFound("slime".to_owned())));
    scene.update(FrameInput::IDLE);

    assert_eq!(scene.assets().status(GraphicOwner::System), Some(GraphicStatus::Ready));
    assert_eq!(
        scene.assets().status(GraphicOwner::Battler(SLIME)),
        Some(GraphicStatus::Fallback)
    );
    assert_eq!(
        scene.assets().status(GraphicOwner::Battler(HERO)),
        Some(GraphicStatus::Pending)
    );
    let resolved = scene
        .events()
        .iter()
        .filter(|e| matches!(e, BattleEvent::GraphicResolved { .. }))
        .count();
    assert_eq!(resolved, 2);

    // The hero's graphic never arrives; the battle still ends.
    assert_eq!(scene.run_to_end(FRAME_LIMIT), Some(BattleOutcome::Victory));
}

#[test]
fn last_enemy_fleeing_is_a_victory() {
    let mut scene = BattleScene::builder()
        .config(BattleConfig::instant())
        .battlers([hero(), slime()])
        .algorithm(StubAlgorithm)
        .enemy_ai(Script::new([ActionRequest::escape(SLIME)]))
        .build()
        .expect("scene builds");

    assert_eq!(scene.run_to_end(FRAME_LIMIT), Some(BattleOutcome::Victory));
    let slime = scene.roster().get(SLIME).unwrap();
    assert!(slime.has_fled());
    assert!(!slime.is_dead());
    assert!(scene.events().iter().any(|e| matches!(
        e,
        BattleEvent::BattlerFled { battler: SLIME, .. }
    )));
    assert!(!scene.events().iter().any(|e| matches!(e, BattleEvent::BattlerDied { .. })));
}

#[test]
fn battle_against_an_extinct_troop_ends_before_any_action() {
    let mut fallen = slime();
    fallen.mark_dead();
    let mut scene = scene_with(
        vec![hero(), fallen],
        Script::new([ActionRequest::attack(HERO, SLIME)]),
        BattleCondition::None,
    );

    assert_eq!(scene.run_to_end(FRAME_LIMIT), Some(BattleOutcome::Victory));
    assert!(!scene.events().iter().any(|e| matches!(
        e,
        BattleEvent::ActionStarted { .. } | BattleEvent::CommandQueued { .. }
    )));
}

#[test]
fn escape_is_refused_when_no_party_member_can_act() {
    let sleepy = hero().with_condition(ConditionKind::Sleep, None);
    let mut scene = scene_with(vec![sleepy, golem()], Script::default(), BattleCondition::None);

    assert_eq!(scene.request_escape(), Err(EscapeError::NoActorCanFlee));
    assert!(!scene.is_escape_pending());
    assert!(!scene.events().iter().any(|e| matches!(e, BattleEvent::EscapeRequested { .. })));
}
