//! Boundary with the robot actuation endpoint.
//!
//! The robot itself is driven by an external bridge process. `BridgeActuator`
//! talks to it with one JSON request per line and expects one JSON reply per
//! line; `LogActuator` only records what would have been sent.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ActuationConfig;
use crate::retarget::RobotJoint;

/// Bridge default address, separate from the angle stream port
pub const ACTUATION_DEFAULT_ADDR: &str = "127.0.0.1:9559";

pub trait Actuator {
    /// `level` in [0, 1] for every joint in `scope` (e.g. "Body").
    fn set_stiffness(&mut self, scope: &str, level: f64) -> Result<()>;
    fn go_to_posture(&mut self, name: &str, speed: f64) -> Result<()>;
    /// Body joint targets in radians, non-blocking on the robot side.
    fn set_angles(
        &mut self,
        joints: &[RobotJoint],
        targets: &[f64],
        speed_fraction: f64,
    ) -> Result<()>;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn set_stiffness(&mut self, scope: &str, level: f64) -> Result<()> {
        (**self).set_stiffness(scope, level)
    }

    fn go_to_posture(&mut self, name: &str, speed: f64) -> Result<()> {
        (**self).go_to_posture(name, speed)
    }

    fn set_angles(
        &mut self,
        joints: &[RobotJoint],
        targets: &[f64],
        speed_fraction: f64,
    ) -> Result<()> {
        (**self).set_angles(joints, targets, speed_fraction)
    }
}

/// Request line sent to the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BridgeRequest {
    SetStiffness { scope: String, level: f64 },
    GoToPosture { name: String, speed: f64 },
    SetAngles { names: Vec<String>, angles: Vec<f64>, speed: f64 },
}

/// Reply line from the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeReply {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

pub struct BridgeActuator {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
    line: String,
}

impl BridgeActuator {
    pub fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .with_context(|| format!("failed to connect to actuation bridge at {}", addr))?;
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            writer: stream,
            reader,
            line: String::new(),
        })
    }

    fn call(&mut self, request: &BridgeRequest) -> Result<()> {
        let mut payload = serde_json::to_string(request)?;
        payload.push('\n');
        self.writer.write_all(payload.as_bytes())?;
        self.writer.flush()?;

        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Err(anyhow!("actuation bridge closed the connection"));
        }
        let reply: BridgeReply = serde_json::from_str(self.line.trim())
            .with_context(|| format!("invalid bridge reply: {}", self.line.trim()))?;
        if reply.ok {
            Ok(())
        } else {
            Err(anyhow!(
                "actuation bridge error: {}",
                reply.error.unwrap_or_else(|| "unknown".to_string())
            ))
        }
    }
}

impl Actuator for BridgeActuator {
    fn set_stiffness(&mut self, scope: &str, level: f64) -> Result<()> {
        self.call(&BridgeRequest::SetStiffness {
            scope: scope.to_string(),
            level,
        })
    }

    fn go_to_posture(&mut self, name: &str, speed: f64) -> Result<()> {
        self.call(&BridgeRequest::GoToPosture {
            name: name.to_string(),
            speed,
        })
    }

    fn set_angles(
        &mut self,
        joints: &[RobotJoint],
        targets: &[f64],
        speed_fraction: f64,
    ) -> Result<()> {
        self.call(&BridgeRequest::SetAngles {
            names: joints.iter().map(|j| j.name().to_string()).collect(),
            angles: targets.to_vec(),
            speed: speed_fraction,
        })
    }
}

/// Dry-run actuator: logs every command, never fails.
#[derive(Debug, Default)]
pub struct LogActuator {
    pub calls: usize,
}

impl Actuator for LogActuator {
    fn set_stiffness(&mut self, scope: &str, level: f64) -> Result<()> {
        self.calls += 1;
        info!("[dry-run] setStiffness({}, {:.2})", scope, level);
        Ok(())
    }

    fn go_to_posture(&mut self, name: &str, speed: f64) -> Result<()> {
        self.calls += 1;
        info!("[dry-run] goToPosture({}, {:.2})", name, speed);
        Ok(())
    }

    fn set_angles(
        &mut self,
        joints: &[RobotJoint],
        targets: &[f64],
        speed_fraction: f64,
    ) -> Result<()> {
        self.calls += 1;
        let pairs: Vec<String> = joints
            .iter()
            .zip(targets)
            .map(|(j, t)| format!("{}={:.3}", j, t))
            .collect();
        info!("[dry-run] setAngles([{}], {:.2})", pairs.join(", "), speed_fraction);
        Ok(())
    }
}

/// Actuator selected by config. Fails when the bridge is unreachable.
pub fn connect(config: &ActuationConfig) -> Result<Box<dyn Actuator>> {
    if config.dry_run {
        info!("Actuation: dry run");
        return Ok(Box::new(LogActuator::default()));
    }
    let bridge = BridgeActuator::connect(&config.addr)?;
    info!("Actuation bridge connected: {}", config.addr);
    Ok(Box::new(bridge))
}
