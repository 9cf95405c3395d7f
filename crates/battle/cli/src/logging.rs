//! Log setup for the battle binary.

use std::path::PathBuf;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a file layer under `<log_dir>/<session>/battle.log` and a compact
/// stderr layer for warnings.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the whole run.
pub fn setup_logging(session_id: Option<&str>, log_dir: Option<PathBuf>) -> Result<WorkerGuard> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let log_dir = log_dir.unwrap_or_else(default_log_dir);

    let session_id = match session_id {
        Some(id) => id.to_owned(),
        None => {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default();
            format!("session_{}", timestamp)
        }
    };

    let session_log_dir = log_dir.join(&session_id);
    std::fs::create_dir_all(&session_log_dir)?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "battle.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    tracing::info!("Logging initialized: session={}", session_id);
    tracing::info!("Log file: {}/battle.log", session_log_dir.display());

    Ok(guard)
}

/// Platform cache directory for logs.
///
/// - macOS: `~/Library/Caches/battle/logs`
/// - Linux: `~/.cache/battle/logs` (or `$XDG_CACHE_HOME/battle/logs`)
/// - Windows: `%LOCALAPPDATA%\battle\logs`
/// - Fallback: `/tmp/battle/logs`
fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "battle")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/battle"))
        .join("logs")
}
