use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Robot joint channels accepted at the protocol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RobotJoint {
    LShoulderPitch,
    RShoulderPitch,
    LShoulderRoll,
    RShoulderRoll,
    LElbowRoll,
    RElbowRoll,
    LWristYaw,
    RWristYaw,
    LHipPitch,
    RHipPitch,
    LKneePitch,
    RKneePitch,
    HipYawPitch,
    HeadPitch,
    HeadYaw,
    LHand,
    RHand,
}

impl RobotJoint {
    pub const ALL: [RobotJoint; 17] = [
        Self::LShoulderPitch,
        Self::RShoulderPitch,
        Self::LShoulderRoll,
        Self::RShoulderRoll,
        Self::LElbowRoll,
        Self::RElbowRoll,
        Self::LWristYaw,
        Self::RWristYaw,
        Self::LHipPitch,
        Self::RHipPitch,
        Self::LKneePitch,
        Self::RKneePitch,
        Self::HipYawPitch,
        Self::HeadPitch,
        Self::HeadYaw,
        Self::LHand,
        Self::RHand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::LShoulderPitch => "LShoulderPitch",
            Self::RShoulderPitch => "RShoulderPitch",
            Self::LShoulderRoll => "LShoulderRoll",
            Self::RShoulderRoll => "RShoulderRoll",
            Self::LElbowRoll => "LElbowRoll",
            Self::RElbowRoll => "RElbowRoll",
            Self::LWristYaw => "LWristYaw",
            Self::RWristYaw => "RWristYaw",
            Self::LHipPitch => "LHipPitch",
            Self::RHipPitch => "RHipPitch",
            Self::LKneePitch => "LKneePitch",
            Self::RKneePitch => "RKneePitch",
            Self::HipYawPitch => "HipYawPitch",
            Self::HeadPitch => "HeadPitch",
            Self::HeadYaw => "HeadYaw",
            Self::LHand => "LHand",
            Self::RHand => "RHand",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|j| j.name() == name)
    }

    /// Hand channels carry an opening fraction (0 closed, 1 open) instead of degrees.
    pub fn is_hand(self) -> bool {
        matches!(self, Self::LHand | Self::RHand)
    }

    /// Mechanically safe range in degrees, where the robot publishes one.
    pub fn limits(self) -> Option<(f64, f64)> {
        match self {
            Self::RShoulderPitch | Self::LShoulderPitch => Some((-119.5, 119.5)),
            Self::RShoulderRoll => Some((-18.0, 76.0)),
            Self::LShoulderRoll => Some((-76.0, 18.0)),
            Self::RElbowRoll => Some((-88.5, -2.0)),
            Self::LElbowRoll => Some((2.0, 88.5)),
            _ => None,
        }
    }
}

impl fmt::Display for RobotJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Joint name → angle in degrees (hand channels 0/1), one per frame.
///
/// Keys are kept as strings so the extended joint set used by the coarse
/// clamp table can travel through the same pipeline; the receiver
/// validates them against `RobotJoint`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointAngleSet(BTreeMap<String, f64>);

impl JointAngleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, degrees: f64) {
        self.0.insert(name.into(), degrees);
    }

    pub fn insert_joint(&mut self, joint: RobotJoint, degrees: f64) {
        self.0.insert(joint.name().to_string(), degrees);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn get_joint(&self, joint: RobotJoint) -> Option<f64> {
        self.get(joint.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Same keys, every value passed through `f`.
    pub fn map_values(&self, mut f: impl FnMut(&str, f64) -> f64) -> JointAngleSet {
        JointAngleSet(self.0.iter().map(|(k, v)| (k.clone(), f(k, *v))).collect())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for JointAngleSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        JointAngleSet(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
