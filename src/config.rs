use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "retarget.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default)]
    pub smooth: SmoothConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub receiver: ReceiverConfig,
    #[serde(default)]
    pub actuation: ActuationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SenderConfig {
    /// Receiver address
    #[serde(default = "default_receiver_addr")]
    pub addr: String,
    /// Frames before this many seconds of streaming are not sent
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: f64,
    /// Where to write the recorded session. No recording when unset.
    #[serde(default)]
    pub session_path: Option<String>,
    /// Landmark JSON-lines file, "-" for stdin
    #[serde(default = "default_landmarks")]
    pub landmarks: String,
}

fn default_receiver_addr() -> String { "127.0.0.1:6000".to_string() }
fn default_warmup_secs() -> f64 { 2.0 }
fn default_landmarks() -> String { "-".to_string() }

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            addr: default_receiver_addr(),
            warmup_secs: default_warmup_secs(),
            session_path: None,
            landmarks: default_landmarks(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmoothConfig {
    /// EMA weight of the newest sample, (0, 1]
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_alpha() -> f64 { crate::retarget::smooth::DEFAULT_ALPHA }

impl Default for SmoothConfig {
    fn default() -> Self {
        Self { alpha: default_alpha() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    #[serde(default = "default_true")]
    pub elbows: bool,
    #[serde(default = "default_true")]
    pub hands: bool,
}

fn default_true() -> bool { true }

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { elbows: true, hands: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    #[serde(default = "default_receiver_addr")]
    pub listen_addr: String,
    /// Fraction of max joint speed passed to setAngles
    #[serde(default = "default_speed_fraction")]
    pub speed_fraction: f64,
    #[serde(default = "default_stiffness_scope")]
    pub stiffness_scope: String,
    #[serde(default = "default_posture")]
    pub posture: String,
    #[serde(default = "default_posture_speed")]
    pub posture_speed: f64,
    /// Give up on a silent peer after this long. Unset blocks forever.
    #[serde(default)]
    pub read_timeout_secs: Option<f64>,
}

fn default_speed_fraction() -> f64 { 0.3 }
fn default_stiffness_scope() -> String { "Body".to_string() }
fn default_posture() -> String { "StandInit".to_string() }
fn default_posture_speed() -> f64 { 0.5 }

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_receiver_addr(),
            speed_fraction: default_speed_fraction(),
            stiffness_scope: default_stiffness_scope(),
            posture: default_posture(),
            posture_speed: default_posture_speed(),
            read_timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActuationConfig {
    /// Robot bridge address
    #[serde(default = "default_actuation_addr")]
    pub addr: String,
    /// Log commands instead of moving the robot
    #[serde(default)]
    pub dry_run: bool,
}

fn default_actuation_addr() -> String { "127.0.0.1:9559".to_string() }

impl Default for ActuationConfig {
    fn default() -> Self {
        Self {
            addr: default_actuation_addr(),
            dry_run: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Missing file silently yields defaults; a broken one is reported first.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }
}
