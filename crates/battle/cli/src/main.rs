//! Battle scene runner.
//!
//! Loads a scenario from the content data directory, plays it frame by frame
//! and prints the battle messages as they appear.
//!
//! ```bash
//! BATTLE_SCENARIO=mirror BATTLE_FRAME_RATE=0 cargo run -p battle-cli
//! ```

mod assets;
mod config;
mod logging;
mod status;

use anyhow::{Context, Result};
use battle_content::{ContentFactory, TableAlgorithm};
use battle_core::{BattleEvent, BattleScene, FrameInput};

use crate::assets::TokioAssetLoader;
use crate::config::CliConfig;
use crate::status::LogStatusWindow;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = CliConfig::from_env();
    let _guard = logging::setup_logging(config.session_id.as_deref(), config.log_dir.clone())?;

    tracing::info!("Starting battle: scenario={}", config.scenario);
    tracing::info!("Data directory: {}", config.data_dir.display());

    let mut scene = build_scene(&config)?;
    let events = run(&mut scene, &config).await;

    match scene.outcome() {
        Some(outcome) => {
            println!("== {} ==", outcome);
            tracing::info!(%outcome, frames = scene.frame(), "battle over");
        }
        None => tracing::warn!(frames = scene.frame(), "frame budget exhausted before an outcome"),
    }

    if let Some(path) = &config.events_out {
        let json = serde_json::to_string_pretty(&events)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write event log: {}", path.display()))?;
        tracing::info!("Event log written: {} ({} events)", path.display(), events.len());
    }

    Ok(())
}

fn build_scene(config: &CliConfig) -> Result<BattleScene> {
    let factory = ContentFactory::new(&config.data_dir);
    let battle_config = factory.load_config()?;
    let skills = factory.load_skills()?;
    let items = factory.load_items()?;
    let scenario = factory
        .load_scenario(&config.scenario)
        .with_context(|| format!("Failed to load scenario '{}'", config.scenario))?;

    tracing::debug!(
        skills = skills.len(),
        items = items.len(),
        party = scenario.party.len(),
        troop = scenario.troop.len(),
        "content loaded"
    );

    let enemy_ai = scenario.tactical_ai(skills.clone());
    let player = scenario
        .script()
        .with_fallback(scenario.tactical_ai(skills.clone()));

    let scene = BattleScene::builder()
        .config(battle_config)
        .condition(scenario.condition)
        .allow_escape(scenario.allow_escape)
        .auto_battle(config.auto_battle.unwrap_or(scenario.auto_battle))
        .battlers(scenario.battlers())
        .algorithm(TableAlgorithm::new(skills, items))
        .player(player)
        .enemy_ai(enemy_ai)
        .status_window(LogStatusWindow::default())
        .asset_loader(TokioAssetLoader::new(
            tokio::runtime::Handle::current(),
            config.asset_delay,
            config.asset_dir.clone(),
        ))
        .build()?;

    Ok(scene)
}

/// Steps the scene until it is over or the frame budget runs out.
///
/// Returns every event the scene recorded.
async fn run(scene: &mut BattleScene, config: &CliConfig) -> Vec<BattleEvent> {
    let mut interval = config.frame_interval().map(tokio::time::interval);
    let mut events = scene.take_events();

    while !scene.is_finished() && scene.frame() < config.max_frames {
        if config.escape_at_frame == Some(scene.frame()) {
            if let Err(e) = scene.request_escape() {
                println!("Can't run: {}", e);
            }
        }

        scene.update(FrameInput::IDLE);

        for event in scene.take_events() {
            if let BattleEvent::Message { text, .. } = &event {
                println!("{}", text);
            }
            events.push(event);
        }

        match interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => tokio::task::yield_now().await,
        }
    }

    events
}
