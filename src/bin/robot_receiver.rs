use anyhow::Result;
use tracing::info;

use pose_retarget::actuation;
use pose_retarget::config::{Config, DEFAULT_CONFIG_PATH};
use pose_retarget::logging;
use pose_retarget::receiver::Receiver;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    let config_path = args
        .iter()
        .find(|a| !a.starts_with('-'))
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);

    logging::init("receiver", verbose)?;
    let config = Config::load_or_default(config_path);

    info!("Robot Receiver ({})", env!("GIT_VERSION"));
    info!("Listen: {}", config.receiver.listen_addr);
    info!(
        "Posture: {} @ {}, speed fraction {}",
        config.receiver.posture, config.receiver.posture_speed, config.receiver.speed_fraction
    );

    // nothing is engaged if the robot is unreachable
    let mut actuator = actuation::connect(&config.actuation)?;

    let mut receiver = Receiver::new(config.receiver.clone());
    let listener = receiver.bind()?;
    let stats = receiver.serve(&listener, &mut actuator)?;
    info!(
        "Lines: {}, applied: {}, malformed: {}, actuation errors: {}",
        stats.lines, stats.applied, stats.malformed, stats.actuation_errors
    );

    Ok(())
}
