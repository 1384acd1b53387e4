//! Joint angle extraction in the torso-anchored (GA-LVVJ) frame.
//!
//! x follows the shoulder line (pointing from the right shoulder to the
//! left), z follows the torso from spine-mid to the shoulder and y completes
//! the frame as z × x. Pitch and roll are measured against y and x; left
//! and right differ only by the signs in `SideConvention`.

use nalgebra::Vector3;

use super::channel::{JointAngleSet, RobotJoint};
use super::geometry::{angle_between, normalize, project_onto_plane, vector, Vec3};
use crate::body::{BodyFrame, JointType};

/// Below this the elbow reference axis is considered degenerate
const ELBOW_REF_EPSILON: f64 = 1e-3;

fn global_up() -> Vec3 {
    Vector3::new(0.0, 1.0, 0.0)
}

fn global_right() -> Vec3 {
    Vector3::new(1.0, 0.0, 0.0)
}

fn global_down() -> Vec3 {
    Vector3::new(0.0, -1.0, 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Sign multipliers for the mirrored anatomy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideConvention {
    /// Applied to the final pitch
    pub pitch: f64,
    /// Roll is negated when `roll * dot(upper, y) > 0`
    pub roll: f64,
    /// Elbow flexion is negated when `elbow * dot(forearm, down) < 0`
    pub elbow: f64,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Right, Side::Left];

    pub fn convention(self) -> SideConvention {
        match self {
            Side::Right => SideConvention {
                pitch: 1.0,
                roll: 1.0,
                elbow: 1.0,
            },
            Side::Left => SideConvention {
                pitch: -1.0,
                roll: -1.0,
                elbow: -1.0,
            },
        }
    }

    fn shoulder(self) -> JointType {
        match self {
            Side::Left => JointType::LeftShoulder,
            Side::Right => JointType::RightShoulder,
        }
    }

    fn elbow(self) -> JointType {
        match self {
            Side::Left => JointType::LeftElbow,
            Side::Right => JointType::RightElbow,
        }
    }

    fn wrist(self) -> JointType {
        match self {
            Side::Left => JointType::LeftWrist,
            Side::Right => JointType::RightWrist,
        }
    }

    pub fn shoulder_pitch_channel(self) -> RobotJoint {
        match self {
            Side::Left => RobotJoint::LShoulderPitch,
            Side::Right => RobotJoint::RShoulderPitch,
        }
    }

    pub fn shoulder_roll_channel(self) -> RobotJoint {
        match self {
            Side::Left => RobotJoint::LShoulderRoll,
            Side::Right => RobotJoint::RShoulderRoll,
        }
    }

    pub fn elbow_channel(self) -> RobotJoint {
        match self {
            Side::Left => RobotJoint::LElbowRoll,
            Side::Right => RobotJoint::RElbowRoll,
        }
    }

    pub fn hand_channel(self) -> RobotJoint {
        match self {
            Side::Left => RobotJoint::LHand,
            Side::Right => RobotJoint::RHand,
        }
    }
}

/// Output channels beyond the shoulders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionOptions {
    pub elbows: bool,
    pub hands: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            elbows: true,
            hands: true,
        }
    }
}

/// Orthonormal-ish torso frame for one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsoFrame {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl TorsoFrame {
    pub fn build(frame: &BodyFrame, side: Side) -> Self {
        let shoulder = frame.point(side.shoulder());
        let shoulder_line = vector(
            &frame.point(JointType::LeftShoulder),
            &frame.point(JointType::RightShoulder),
        );
        let torso_up = vector(&frame.point(JointType::SpineMid), &shoulder);

        let x = -normalize(shoulder_line);
        let z = normalize(torso_up);
        let y = normalize(z.cross(&x));
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShoulderAngles {
    pub pitch: f64,
    pub roll: f64,
}

/// Shoulder pitch and roll in degrees.
pub fn shoulder_angles(frame: &BodyFrame, side: Side) -> ShoulderAngles {
    let conv = side.convention();
    let torso = TorsoFrame::build(frame, side);
    let upper = vector(&frame.point(side.shoulder()), &frame.point(side.elbow()));

    let proj_pitch = normalize(project_onto_plane(upper, torso.x));
    let mut pitch = angle_between(proj_pitch, torso.y).to_degrees();
    if upper.dot(&torso.z) < 0.0 {
        pitch = -pitch;
    }
    pitch *= conv.pitch;

    let proj_roll = project_onto_plane(upper, torso.y);
    let mut roll = angle_between(proj_roll, torso.x).to_degrees();
    if conv.roll * upper.dot(&torso.y) > 0.0 {
        roll = -roll;
    }

    ShoulderAngles { pitch, roll }
}

/// Elbow flexion (single DOF) in degrees.
pub fn elbow_flexion(frame: &BodyFrame, side: Side) -> f64 {
    let conv = side.convention();
    let shoulder = frame.point(side.shoulder());
    let elbow = frame.point(side.elbow());
    let wrist = frame.point(side.wrist());

    let axis = normalize(vector(&shoulder, &elbow));
    let forearm = vector(&elbow, &wrist);
    let proj = project_onto_plane(forearm, axis);

    let mut reference = normalize(axis.cross(&global_up()));
    if reference.norm() < ELBOW_REF_EPSILON {
        // arm parallel to the vertical
        reference = normalize(axis.cross(&global_right()));
    }

    let mut theta = angle_between(proj, reference).to_degrees();
    if conv.elbow * forearm.dot(&global_down()) < 0.0 {
        theta = -theta;
    }
    theta
}

/// Raw (unclamped) angles for a fully detected frame.
///
/// Callers gate on `BodyFrame::is_fully_detected`; missing joints would
/// otherwise read as the origin.
pub fn extract_angles(frame: &BodyFrame, options: &ExtractionOptions) -> JointAngleSet {
    let mut angles = JointAngleSet::new();
    for side in Side::BOTH {
        let shoulder = shoulder_angles(frame, side);
        angles.insert_joint(side.shoulder_pitch_channel(), shoulder.pitch);
        angles.insert_joint(side.shoulder_roll_channel(), shoulder.roll);

        if options.elbows {
            angles.insert_joint(side.elbow_channel(), elbow_flexion(frame, side));
        }
        if options.hands {
            let open = match side {
                Side::Left => frame.left_hand_open,
                Side::Right => frame.right_hand_open,
            };
            angles.insert_joint(side.hand_channel(), if open { 1.0 } else { 0.0 });
        }
    }
    angles
}
