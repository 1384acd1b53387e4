//! Per-process logging: stderr plus a timestamped file under `logs/`.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_DIR: &str = "logs";

/// `logs/<role>_<YYYYmmdd_HHMMSS>.log`
pub fn log_path(role: &str) -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(LOG_DIR).join(format!("{}_{}.log", role, ts))
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
pub fn init(role: &str, verbose: bool) -> Result<PathBuf> {
    fs::create_dir_all(LOG_DIR).with_context(|| format!("failed to create {}", LOG_DIR))?;
    let path = log_path(role);
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .try_init()
        .context("failed to install log subscriber")?;

    eprintln!("Log: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_format() {
        let path = log_path("receiver");
        assert!(path.starts_with(LOG_DIR));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("receiver_"));
        assert!(name.ends_with(".log"));
        // receiver_YYYYmmdd_HHMMSS.log
        assert_eq!(name.len(), "receiver_".len() + 15 + ".log".len());
    }
}
