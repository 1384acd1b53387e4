//! Line-delimited JSON protocol between the angle sender and the robot receiver.
//!
//! One message per video frame: a flat JSON object of joint name → degrees
//! followed by `\n`. No length prefix, no version field, no acknowledgement.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

use crate::retarget::channel::{JointAngleSet, RobotJoint};
use crate::retarget::limits::clamp_joint;

/// Encode one angle set as a single terminated line.
pub fn encode_line(angles: &JointAngleSet) -> Result<String> {
    let mut line = serde_json::to_string(angles)?;
    line.push('\n');
    Ok(line)
}

/// Decode one line into a flat name → number map.
pub fn decode_line(line: &str) -> Result<JointAngleSet> {
    let text = line.trim();
    if text.is_empty() {
        bail!("empty line");
    }
    let angles: JointAngleSet =
        serde_json::from_str(text).with_context(|| format!("invalid angle message: {}", text))?;
    Ok(angles)
}

/// Write one message with a single `write_all`, then flush.
pub fn send_angles<W: Write>(writer: &mut W, angles: &JointAngleSet) -> Result<()> {
    let line = encode_line(angles)?;
    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read the next raw line. `Ok(None)` at end of stream.
pub fn recv_line<R: BufRead>(reader: &mut R, buf: &mut String) -> Result<Option<usize>> {
    buf.clear();
    let n = reader.read_line(buf)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(n))
}

/// A decoded message restricted to known robot joints.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleCommand {
    /// Known joints in `RobotJoint` order, values clamped to mechanical limits (degrees)
    pub joints: Vec<(RobotJoint, f64)>,
    /// Keys that did not name a robot joint
    pub ignored: Vec<String>,
}

impl AngleCommand {
    pub fn from_angles(angles: &JointAngleSet) -> Self {
        let mut joints = Vec::new();
        let mut ignored = Vec::new();
        for (name, value) in angles.iter() {
            match RobotJoint::from_name(name) {
                Some(joint) => joints.push((joint, clamp_joint(name, value))),
                None => ignored.push(name.to_string()),
            }
        }
        joints.sort_by_key(|(joint, _)| *joint);
        Self { joints, ignored }
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Body joints and their targets in radians. Hand channels are not
    /// positional joints and are left out.
    pub fn to_targets(&self) -> (Vec<RobotJoint>, Vec<f64>) {
        self.joints
            .iter()
            .filter(|(joint, _)| !joint.is_hand())
            .map(|&(joint, value)| (joint, value.to_radians()))
            .unzip()
    }
}
