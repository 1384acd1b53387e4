use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Body joints tracked per frame.
///
/// Landmark-backed joints use the MediaPipe pose layout (33 points);
/// `SpineMid` and `SpineShoulder` are derived and have no landmark index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointType {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftFootIndex,
    RightFootIndex,
    SpineMid,
    SpineShoulder,
}

impl JointType {
    /// Joints loaded straight from pose landmarks.
    pub const LANDMARK_JOINTS: [JointType; 19] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Joints that must all be present before angles are extracted.
    pub const REQUIRED: [JointType; 15] = [
        Self::LeftShoulder,
        Self::LeftElbow,
        Self::LeftWrist,
        Self::RightShoulder,
        Self::RightElbow,
        Self::RightWrist,
        Self::LeftHip,
        Self::LeftKnee,
        Self::LeftAnkle,
        Self::RightHip,
        Self::RightKnee,
        Self::RightAnkle,
        Self::SpineMid,
        Self::SpineShoulder,
        Self::Nose,
    ];

    pub fn from_landmark_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            2 => Some(Self::LeftEye),
            5 => Some(Self::RightEye),
            7 => Some(Self::LeftEar),
            8 => Some(Self::RightEar),
            11 => Some(Self::LeftShoulder),
            12 => Some(Self::RightShoulder),
            13 => Some(Self::LeftElbow),
            14 => Some(Self::RightElbow),
            15 => Some(Self::LeftWrist),
            16 => Some(Self::RightWrist),
            23 => Some(Self::LeftHip),
            24 => Some(Self::RightHip),
            25 => Some(Self::LeftKnee),
            26 => Some(Self::RightKnee),
            27 => Some(Self::LeftAnkle),
            28 => Some(Self::RightAnkle),
            31 => Some(Self::LeftFootIndex),
            32 => Some(Self::RightFootIndex),
            _ => None,
        }
    }

    pub fn landmark_index(self) -> Option<usize> {
        match self {
            Self::Nose => Some(0),
            Self::LeftEye => Some(2),
            Self::RightEye => Some(5),
            Self::LeftEar => Some(7),
            Self::RightEar => Some(8),
            Self::LeftShoulder => Some(11),
            Self::RightShoulder => Some(12),
            Self::LeftElbow => Some(13),
            Self::RightElbow => Some(14),
            Self::LeftWrist => Some(15),
            Self::RightWrist => Some(16),
            Self::LeftHip => Some(23),
            Self::RightHip => Some(24),
            Self::LeftKnee => Some(25),
            Self::RightKnee => Some(26),
            Self::LeftAnkle => Some(27),
            Self::RightAnkle => Some(28),
            Self::LeftFootIndex => Some(31),
            Self::RightFootIndex => Some(32),
            Self::SpineMid | Self::SpineShoulder => None,
        }
    }
}

/// A single 3D point in camera-normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl JointPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn distance(&self, other: &JointPoint) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    /// Componentwise mean
    pub fn midpoint(a: &JointPoint, b: &JointPoint) -> JointPoint {
        JointPoint::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
    }
}
