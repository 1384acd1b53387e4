use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing::{error, info};

use pose_retarget::config::{Config, DEFAULT_CONFIG_PATH};
use pose_retarget::logging;
use pose_retarget::retarget::Retargeter;
use pose_retarget::stream::{run_sender, AngleStreamer};
use pose_retarget::vision::JsonLinesSource;

fn open_landmarks(path: &str) -> Result<Box<dyn BufRead>> {
    if path == "-" {
        return Ok(Box::new(std::io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("failed to open landmarks {}", path))?;
    Ok(Box::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    let config_path = args
        .iter()
        .find(|a| !a.starts_with('-'))
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);

    logging::init("sender", verbose)?;
    let config = Config::load_or_default(config_path);

    info!("Retarget Sender ({})", env!("GIT_VERSION"));
    info!("Receiver: {}", config.sender.addr);
    info!("Landmarks: {}", config.sender.landmarks);
    info!("Smooth: alpha={}", config.smooth.alpha);
    info!(
        "Extract: elbows={}, hands={}",
        config.extract.elbows, config.extract.hands
    );

    let mut retargeter = Retargeter::from_config(&config)?;
    let mut source = JsonLinesSource::new(open_landmarks(&config.sender.landmarks)?);
    let recording = config.sender.session_path.is_some();
    let mut streamer = AngleStreamer::connect(&config.sender.addr, recording)?;

    let warmup = Duration::try_from_secs_f64(config.sender.warmup_secs.max(0.0))
        .with_context(|| format!("invalid warmup_secs {}", config.sender.warmup_secs))?;
    let stats = run_sender(&mut source, &mut retargeter, &mut streamer, warmup)?;
    let record = streamer.close();
    info!(
        "Frames: {} read, {} incomplete, {} warmup, {} sent",
        stats.frames, stats.incomplete, stats.warmup, stats.sent
    );

    if let (Some(path), Some(record)) = (config.sender.session_path.as_deref(), record) {
        match record.save(path) {
            Ok(()) => info!("Session saved: {} ({} frames)", path, record.len()),
            Err(e) => error!("{:#}", e),
        }
    }

    Ok(())
}
