//! Graphic loading on the tokio runtime.

use std::path::PathBuf;
use std::time::Duration;

use battle_core::{AssetError, AssetLoader, AssetNotifier};
use tokio::runtime::Handle;

/// Resolves each graphic on a spawned task after a fixed delay.
///
/// With an asset directory configured, a graphic is ready only if
/// `<dir>/<name>.png` exists; otherwise every request succeeds.
pub struct TokioAssetLoader {
    runtime: Handle,
    delay: Duration,
    asset_dir: Option<PathBuf>,
}

impl TokioAssetLoader {
    pub fn new(runtime: Handle, delay: Duration, asset_dir: Option<PathBuf>) -> Self {
        Self {
            runtime,
            delay,
            asset_dir,
        }
    }
}

impl AssetLoader for TokioAssetLoader {
    fn request_graphic(&mut self, name: &str, notifier: AssetNotifier) {
        let name = name.to_owned();
        let delay = self.delay;
        let path = self
            .asset_dir
            .as_ref()
            .map(|dir| dir.join(format!("{name}.png")));

        tracing::debug!(%name, handle = ?notifier.handle(), "graphic requested");
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let result = match path {
                None => Ok(()),
                Some(path) => match tokio::fs::try_exists(&path).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(AssetError::NotFound(name.clone())),
                    Err(e) => Err(AssetError::Decode {
                        name: name.clone(),
                        reason: e.to_string(),
                    }),
                },
            };
            if let Err(e) = &result {
                tracing::warn!(%name, "graphic unavailable, using fallback: {}", e);
            }
            notifier.notify(result);
        });
    }
}
