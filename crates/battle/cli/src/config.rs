//! Runtime settings for the battle binary.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Settings read from the process environment (and `.env`).
#[derive(Clone, Debug)]
pub struct CliConfig {
    /// Directory with `battle.toml`, `skills.ron`, `items.ron` and `scenarios/`.
    pub data_dir: PathBuf,
    pub scenario: String,
    /// Frames per second; 0 runs headless as fast as possible.
    pub frame_rate: u32,
    pub max_frames: u64,
    /// Simulated latency of each graphic load.
    pub asset_delay: Duration,
    /// Directory graphics are looked up in; unset accepts every name.
    pub asset_dir: Option<PathBuf>,
    /// Frame on which the party asks to flee.
    pub escape_at_frame: Option<u64>,
    /// Overrides the scenario's auto battle flag.
    pub auto_battle: Option<bool>,
    /// Writes the full event log as JSON when the battle ends.
    pub events_out: Option<PathBuf>,
    pub session_id: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("crates/battle/content/data"),
            scenario: "slimes".to_owned(),
            frame_rate: 60,
            max_frames: 36_000,
            asset_delay: Duration::from_millis(250),
            asset_dir: None,
            escape_at_frame: None,
            auto_battle: None,
            events_out: None,
            session_id: None,
            log_dir: None,
        }
    }
}

impl CliConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_DATA_DIR` - Content data directory (default: crates/battle/content/data)
    /// - `BATTLE_SCENARIO` - Scenario file name without extension (default: slimes)
    /// - `BATTLE_FRAME_RATE` - Frames per second, 0 for headless (default: 60)
    /// - `BATTLE_MAX_FRAMES` - Frame budget before giving up (default: 36000)
    /// - `BATTLE_ASSET_DELAY_MS` - Simulated graphic load latency (default: 250)
    /// - `BATTLE_ASSET_DIR` - Directory holding `<name>.png` graphics (default: unset)
    /// - `BATTLE_ESCAPE_AT_FRAME` - Request an escape on this frame (default: never)
    /// - `BATTLE_AUTO` - Let the AI command the party (default: scenario setting)
    /// - `BATTLE_EVENTS_OUT` - Path of the JSON event dump (default: none)
    /// - `BATTLE_SESSION_ID` - Session identifier for log files (default: timestamp)
    /// - `BATTLE_LOG_DIR` - Log directory (default: platform cache dir)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("BATTLE_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Ok(scenario) = env::var("BATTLE_SCENARIO") {
            config.scenario = scenario;
        }
        if let Some(rate) = read_env::<u32>("BATTLE_FRAME_RATE") {
            config.frame_rate = rate;
        }
        if let Some(frames) = read_env::<u64>("BATTLE_MAX_FRAMES") {
            config.max_frames = frames.max(1);
        }
        if let Some(millis) = read_env::<u64>("BATTLE_ASSET_DELAY_MS") {
            config.asset_delay = Duration::from_millis(millis);
        }

        config.asset_dir = read_env::<PathBuf>("BATTLE_ASSET_DIR");
        config.escape_at_frame = read_env::<u64>("BATTLE_ESCAPE_AT_FRAME");
        config.auto_battle = read_env::<bool>("BATTLE_AUTO");
        config.events_out = read_env::<PathBuf>("BATTLE_EVENTS_OUT");
        config.session_id = env::var("BATTLE_SESSION_ID").ok();
        config.log_dir = read_env::<PathBuf>("BATTLE_LOG_DIR");

        config
    }

    /// Time between frames, or `None` when running headless.
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.frame_rate > 0).then(|| Duration::from_secs(1) / self.frame_rate)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_has_no_interval() {
        let config = CliConfig {
            frame_rate: 0,
            ..CliConfig::default()
        };
        assert_eq!(config.frame_interval(), None);

        let config = CliConfig {
            frame_rate: 50,
            ..CliConfig::default()
        };
        assert_eq!(config.frame_interval(), Some(Duration::from_millis(20)));
    }
}
