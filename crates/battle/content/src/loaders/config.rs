//! Battle configuration loader.

use std::path::Path;

use battle_core::BattleConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for battle configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys keep their [`BattleConfig::default`] values, so a file
    /// only needs to list what it tunes.
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<BattleConfig> {
        let config: BattleConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse battle config TOML: {}", e))?;

        if config.atb_max == 0 {
            anyhow::bail!("atb_max must be positive");
        }
        if config.message_lines == 0 {
            anyhow::bail!("message_lines must be positive");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{AtbMode, WaitWindow};

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ConfigLoader::parse(
            r#"
            atb_mode = "active"
            float_text_lifetime = 45
            message_wait = { min = 10, max = 40 }
            "#,
        )
        .unwrap();

        assert_eq!(config.atb_mode, AtbMode::Active);
        assert_eq!(config.float_text_lifetime, 45);
        assert_eq!(config.message_wait, WaitWindow::new(10, 40));
        assert_eq!(config.atb_max, BattleConfig::DEFAULT_ATB_MAX);
        assert!(config.auto_advance);
    }

    #[test]
    fn zero_gauge_is_rejected() {
        assert!(ConfigLoader::parse("atb_max = 0").is_err());
    }
}
