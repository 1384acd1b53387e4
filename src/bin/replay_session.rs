use anyhow::{anyhow, Result};
use tracing::{error, info};

use pose_retarget::config::{Config, DEFAULT_CONFIG_PATH};
use pose_retarget::logging;
use pose_retarget::session;

/// Usage: replay_session [config.toml] [session.json]
fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    let positional: Vec<&str> = args
        .iter()
        .filter(|a| !a.starts_with('-'))
        .map(String::as_str)
        .collect();
    let config_path = positional.first().copied().unwrap_or(DEFAULT_CONFIG_PATH);

    logging::init("replay", verbose)?;
    let config = Config::load_or_default(config_path);

    let session_path = positional
        .get(1)
        .map(|s| s.to_string())
        .or_else(|| config.sender.session_path.clone())
        .ok_or_else(|| anyhow!("no session file given and sender.session_path is unset"))?;

    info!("Session Replay ({})", env!("GIT_VERSION"));
    info!("Receiver: {}", config.sender.addr);

    if let Err(e) = session::replay_file(&session_path, &config.sender.addr) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
