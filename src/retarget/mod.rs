pub mod angles;
pub mod channel;
pub mod geometry;
pub mod limits;
pub mod smooth;

pub use angles::{extract_angles, ExtractionOptions, Side};
pub use channel::{JointAngleSet, RobotJoint};
pub use smooth::Smoother;

use anyhow::Result;

use crate::body::BodyFrame;
use crate::config::Config;

/// Per-session frame pipeline: extract → clamp → smooth.
pub struct Retargeter {
    options: ExtractionOptions,
    smoother: Smoother,
}

impl Retargeter {
    pub fn new(options: ExtractionOptions, smoother: Smoother) -> Self {
        Self { options, smoother }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let options = ExtractionOptions {
            elbows: config.extract.elbows,
            hands: config.extract.hands,
        };
        Ok(Self::new(options, Smoother::from_config(&config.smooth)?))
    }

    /// Clamped angles before smoothing, or `None` for a partially detected body.
    pub fn clamped(&self, frame: &BodyFrame) -> Option<JointAngleSet> {
        if !frame.is_fully_detected() {
            return None;
        }
        let raw = extract_angles(frame, &self.options);
        Some(limits::clamp_all(&raw))
    }

    /// Full pipeline for one frame. Skipped frames leave the smoother untouched.
    pub fn process(&mut self, frame: &BodyFrame) -> Option<JointAngleSet> {
        let clamped = self.clamped(frame)?;
        Some(self.smoother.smooth(&clamped))
    }

    pub fn reset(&mut self) {
        self.smoother.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{JointPoint, JointType};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    /// Upright body, both arms hanging, hips below the shoulders.
    fn standing_frame() -> BodyFrame {
        let mut f = BodyFrame::new();
        let pts = [
            (JointType::Nose, (0.5, 0.5, 0.0)),
            (JointType::LeftShoulder, (0.0, 0.0, 0.0)),
            (JointType::RightShoulder, (1.0, 0.0, 0.0)),
            (JointType::LeftElbow, (0.0, -1.0, 0.0)),
            (JointType::RightElbow, (1.0, -1.0, 0.0)),
            (JointType::LeftWrist, (0.0, -2.0, 0.0)),
            (JointType::RightWrist, (1.0, -2.0, 0.0)),
            (JointType::LeftHip, (0.25, -1.0, 0.0)),
            (JointType::RightHip, (0.75, -1.0, 0.0)),
            (JointType::LeftKnee, (0.25, -2.0, 0.0)),
            (JointType::RightKnee, (0.75, -2.0, 0.0)),
            (JointType::LeftAnkle, (0.25, -3.0, 0.0)),
            (JointType::RightAnkle, (0.75, -3.0, 0.0)),
        ];
        for (joint, (x, y, z)) in pts {
            f.set(joint, JointPoint::new(x, y, z));
        }
        f
    }

    fn retargeter(alpha: f64) -> Retargeter {
        Retargeter::new(ExtractionOptions::default(), Smoother::new(alpha).unwrap())
    }

    #[test]
    fn test_hanging_arm_pipeline_before_smoothing() {
        let r = retargeter(0.2);
        let angles = r.clamped(&standing_frame()).unwrap();
        // arm along -z of the torso: pitch ±90 depending on side, within limits
        assert!(approx_eq(angles.get_joint(RobotJoint::LShoulderPitch).unwrap(), 90.0, 1e-6));
        assert!(approx_eq(angles.get_joint(RobotJoint::RShoulderPitch).unwrap(), -90.0, 1e-6));
        // roll of 90 saturates at the mechanical limit
        assert_eq!(angles.get_joint(RobotJoint::LShoulderRoll), Some(18.0));
        assert_eq!(angles.get_joint(RobotJoint::RShoulderRoll), Some(76.0));
        // straight arm: flexion clamps to the near-straight stop
        assert_eq!(angles.get_joint(RobotJoint::RElbowRoll), Some(-2.0));
        assert_eq!(angles.get_joint(RobotJoint::LElbowRoll), Some(2.0));
        assert_eq!(angles.get_joint(RobotJoint::LHand), Some(0.0));
    }

    #[test]
    fn test_arm_forward_pipeline_zero_pitch() {
        let mut frame = standing_frame();
        frame.set(JointType::LeftElbow, JointPoint::new(0.0, 0.0, 1.0));
        frame.set(JointType::LeftWrist, JointPoint::new(0.0, 0.0, 2.0));
        let angles = retargeter(0.2).clamped(&frame).unwrap();
        assert!(approx_eq(angles.get_joint(RobotJoint::LShoulderPitch).unwrap(), 0.0, 1e-6));
    }

    #[test]
    fn test_partial_body_skipped() {
        let mut frame = BodyFrame::new();
        frame.set(JointType::LeftShoulder, JointPoint::new(0.0, 0.0, 0.0));
        frame.set(JointType::RightShoulder, JointPoint::new(1.0, 0.0, 0.0));
        let mut r = retargeter(0.2);
        assert!(r.process(&frame).is_none());
    }

    #[test]
    fn test_process_smooths_across_frames() {
        let mut r = retargeter(0.5);
        let first = r.process(&standing_frame()).unwrap();

        let mut raised = standing_frame();
        raised.set(JointType::LeftElbow, JointPoint::new(0.0, 0.0, 1.0));
        raised.set(JointType::LeftWrist, JointPoint::new(0.0, 0.0, 2.0));
        let second = r.process(&raised).unwrap();

        let p0 = first.get_joint(RobotJoint::LShoulderPitch).unwrap();
        let p1 = second.get_joint(RobotJoint::LShoulderPitch).unwrap();
        assert!(approx_eq(p0, 90.0, 1e-6));
        assert!(approx_eq(p1, 45.0, 1e-6));
    }
}
