use std::collections::HashMap;

use anyhow::{bail, Result};

use super::channel::JointAngleSet;
use crate::config::SmoothConfig;

pub const DEFAULT_ALPHA: f64 = 0.2;

/// Per-channel EMA over joint angles.
///
/// The first value seen for a channel passes through unchanged. State lives
/// as long as the instance, so create one per streaming session.
pub struct Smoother {
    alpha: f64,
    previous: HashMap<String, f64>,
}

impl Smoother {
    /// `alpha` must lie in (0, 1].
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            bail!("smoothing alpha must be in (0, 1], got {}", alpha);
        }
        Ok(Self {
            alpha,
            previous: HashMap::new(),
        })
    }

    pub fn from_config(config: &SmoothConfig) -> Result<Self> {
        Self::new(config.alpha)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn smooth(&mut self, angles: &JointAngleSet) -> JointAngleSet {
        let a = self.alpha;
        let previous = &mut self.previous;
        angles.map_values(|key, raw| {
            let value = match previous.get(key) {
                Some(prev) => a * raw + (1.0 - a) * prev,
                None => raw,
            };
            previous.insert(key.to_string(), value);
            value
        })
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }
}
