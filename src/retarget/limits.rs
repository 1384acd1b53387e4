//! Mechanical joint limits. Out-of-range values are saturated, never rejected.

use super::channel::{JointAngleSet, RobotJoint};

pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(value))
}

/// How a coarse rule matches a channel name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Suffix(&'static str),
    Exact(&'static str),
}

impl NameMatch {
    fn matches(self, name: &str) -> bool {
        match self {
            NameMatch::Suffix(s) => name.ends_with(s),
            NameMatch::Exact(s) => name == s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampRule {
    pub pattern: NameMatch,
    pub lo: f64,
    pub hi: f64,
}

impl ClampRule {
    pub const fn new(pattern: NameMatch, lo: f64, hi: f64) -> Self {
        Self { pattern, lo, hi }
    }
}

/// Coarse limits for the extended joint set, first match wins.
pub const COARSE_RULES: [ClampRule; 6] = [
    ClampRule::new(NameMatch::Suffix("KNEE_PITCH"), 0.0, 120.0),
    ClampRule::new(NameMatch::Suffix("HIP_PITCH"), -45.0, 30.0),
    ClampRule::new(NameMatch::Suffix("ELBOW_ROLL"), -88.0, -2.0),
    ClampRule::new(NameMatch::Suffix("SHOULDER_PITCH"), -90.0, 90.0),
    ClampRule::new(NameMatch::Exact("HEAD_PITCH"), -40.0, 30.0),
    ClampRule::new(NameMatch::Exact("HEAD_YAW"), -120.0, 120.0),
];

/// Clamp one channel to its mechanical range. Channels without one pass through.
pub fn clamp_joint(name: &str, degrees: f64) -> f64 {
    match RobotJoint::from_name(name).and_then(RobotJoint::limits) {
        Some((lo, hi)) => clamp(degrees, lo, hi),
        None => degrees,
    }
}

/// Clamp one channel with the coarse suffix table.
pub fn clamp_coarse(name: &str, degrees: f64) -> f64 {
    match COARSE_RULES.iter().find(|r| r.pattern.matches(name)) {
        Some(rule) => clamp(degrees, rule.lo, rule.hi),
        None => degrees,
    }
}

pub fn clamp_mechanical(angles: &JointAngleSet) -> JointAngleSet {
    angles.map_values(clamp_joint)
}

pub fn clamp_extended(angles: &JointAngleSet) -> JointAngleSet {
    angles.map_values(clamp_coarse)
}

/// Mechanical table first, then the coarse table.
pub fn clamp_all(angles: &JointAngleSet) -> JointAngleSet {
    angles.map_values(|name, v| clamp_coarse(name, clamp_joint(name, v)))
}
