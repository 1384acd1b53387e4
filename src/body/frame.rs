use std::collections::HashMap;

use super::joint::{JointPoint, JointType};
use crate::vision::{LandmarkFrame, HAND_INDEX_TIP, HAND_THUMB_TIP};

/// Thumb-to-index distance above which a hand counts as open
pub const HAND_OPEN_THRESHOLD: f64 = 0.05;

/// Named joints of one frame plus hand state.
#[derive(Debug, Clone, Default)]
pub struct BodyFrame {
    joints: HashMap<JointType, JointPoint>,
    pub left_hand_open: bool,
    pub right_hand_open: bool,
}

impl BodyFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from the landmark provider's output.
    pub fn from_landmarks(landmarks: &LandmarkFrame) -> Self {
        let mut frame = Self::new();
        for (&index, point) in &landmarks.pose {
            if let Some(joint) = JointType::from_landmark_index(index) {
                frame.joints.insert(joint, *point);
            }
        }
        frame.derive_spine();
        frame.left_hand_open = is_hand_open(landmarks.left_hand.as_deref());
        frame.right_hand_open = is_hand_open(landmarks.right_hand.as_deref());
        frame
    }

    /// Set a joint. Setting a shoulder or hip recomputes the spine points.
    pub fn set(&mut self, joint: JointType, point: JointPoint) {
        self.joints.insert(joint, point);
        if matches!(
            joint,
            JointType::LeftShoulder
                | JointType::RightShoulder
                | JointType::LeftHip
                | JointType::RightHip
        ) {
            self.derive_spine();
        }
    }

    pub fn get(&self, joint: JointType) -> Option<&JointPoint> {
        self.joints.get(&joint)
    }

    pub fn contains(&self, joint: JointType) -> bool {
        self.joints.contains_key(&joint)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// True when every joint in `JointType::REQUIRED` is present.
    pub fn is_fully_detected(&self) -> bool {
        JointType::REQUIRED.iter().all(|j| self.joints.contains_key(j))
    }

    /// Joint lookup for frames already gated by `is_fully_detected`.
    pub(crate) fn point(&self, joint: JointType) -> JointPoint {
        self.joints.get(&joint).copied().unwrap_or_default()
    }

    fn derive_spine(&mut self) {
        Self::derive_midpoint(
            &mut self.joints,
            JointType::SpineShoulder,
            JointType::LeftShoulder,
            JointType::RightShoulder,
        );
        Self::derive_midpoint(
            &mut self.joints,
            JointType::SpineMid,
            JointType::LeftHip,
            JointType::RightHip,
        );
    }

    fn derive_midpoint(
        joints: &mut HashMap<JointType, JointPoint>,
        target: JointType,
        a: JointType,
        b: JointType,
    ) {
        let mid = match (joints.get(&a), joints.get(&b)) {
            (Some(pa), Some(pb)) => Some(JointPoint::midpoint(pa, pb)),
            _ => None,
        };
        match mid {
            Some(mid) => {
                joints.insert(target, mid);
            }
            None => {
                joints.remove(&target);
            }
        }
    }
}

/// Thumb tip and index fingertip further apart than the threshold.
pub fn is_hand_open(hand: Option<&[JointPoint]>) -> bool {
    let Some(hand) = hand else {
        return false;
    };
    match (hand.get(HAND_THUMB_TIP), hand.get(HAND_INDEX_TIP)) {
        (Some(thumb), Some(index)) => thumb.distance(index) > HAND_OPEN_THRESHOLD,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn hand_with_tips(thumb: JointPoint, index: JointPoint) -> Vec<JointPoint> {
        let mut hand = vec![JointPoint::default(); 21];
        hand[HAND_THUMB_TIP] = thumb;
        hand[HAND_INDEX_TIP] = index;
        hand
    }

    fn full_landmarks() -> LandmarkFrame {
        let mut pose = BTreeMap::new();
        for joint in JointType::LANDMARK_JOINTS {
            let idx = joint.landmark_index().unwrap();
            pose.insert(idx, JointPoint::new(idx as f64 * 0.01, idx as f64 * 0.02, 0.0));
        }
        LandmarkFrame {
            pose,
            left_hand: None,
            right_hand: None,
        }
    }

    #[test]
    fn test_spine_points_are_midpoints() {
        let mut frame = BodyFrame::new();
        frame.set(JointType::LeftShoulder, JointPoint::new(0.0, 0.0, 0.0));
        frame.set(JointType::RightShoulder, JointPoint::new(1.0, 0.0, 0.2));
        frame.set(JointType::LeftHip, JointPoint::new(0.2, -1.0, 0.0));
        frame.set(JointType::RightHip, JointPoint::new(0.8, -1.0, 0.0));

        assert_eq!(frame.get(JointType::SpineShoulder), Some(&JointPoint::new(0.5, 0.0, 0.1)));
        assert_eq!(frame.get(JointType::SpineMid), Some(&JointPoint::new(0.5, -1.0, 0.0)));
    }

    #[test]
    fn test_spine_absent_without_pair() {
        let mut frame = BodyFrame::new();
        frame.set(JointType::LeftShoulder, JointPoint::new(0.0, 0.0, 0.0));
        frame.set(JointType::LeftHip, JointPoint::new(0.0, -1.0, 0.0));
        assert!(!frame.contains(JointType::SpineShoulder));
        assert!(!frame.contains(JointType::SpineMid));
    }

    #[test]
    fn test_from_landmarks_fully_detected() {
        let frame = BodyFrame::from_landmarks(&full_landmarks());
        assert!(frame.is_fully_detected());
        assert!(frame.contains(JointType::SpineMid));
        assert!(frame.contains(JointType::SpineShoulder));
        assert!(!frame.left_hand_open);
        assert!(!frame.right_hand_open);
    }

    #[test]
    fn test_missing_joint_not_fully_detected() {
        let mut landmarks = full_landmarks();
        landmarks.pose.remove(&JointType::RightAnkle.landmark_index().unwrap());
        let frame = BodyFrame::from_landmarks(&landmarks);
        assert!(!frame.contains(JointType::RightAnkle));
        assert!(!frame.is_fully_detected());
    }

    #[test]
    fn test_missing_hip_drops_spine_mid() {
        let mut landmarks = full_landmarks();
        landmarks.pose.remove(&JointType::LeftHip.landmark_index().unwrap());
        let frame = BodyFrame::from_landmarks(&landmarks);
        assert!(!frame.contains(JointType::SpineMid));
        assert!(!frame.is_fully_detected());
    }

    #[test]
    fn test_unknown_landmark_indices_ignored() {
        let mut landmarks = full_landmarks();
        landmarks.pose.insert(19, JointPoint::new(9.0, 9.0, 9.0));
        landmarks.pose.insert(99, JointPoint::new(9.0, 9.0, 9.0));
        let frame = BodyFrame::from_landmarks(&landmarks);
        // 19 landmarks + 2 derived spine points
        assert_eq!(frame.len(), 21);
    }

    #[test]
    fn test_hand_open_far_apart() {
        let hand = hand_with_tips(JointPoint::new(0.0, 0.0, 0.0), JointPoint::new(0.10, 0.0, 0.0));
        assert!(is_hand_open(Some(&hand)));
    }

    #[test]
    fn test_hand_closed_near() {
        let hand = hand_with_tips(JointPoint::new(0.0, 0.0, 0.0), JointPoint::new(0.0, 0.02, 0.0));
        assert!(!is_hand_open(Some(&hand)));
    }

    #[test]
    fn test_hand_missing_is_closed() {
        assert!(!is_hand_open(None));
        let short = vec![JointPoint::default(); 5];
        assert!(!is_hand_open(Some(&short)));
    }

    #[test]
    fn test_hand_state_from_landmarks() {
        let mut landmarks = full_landmarks();
        landmarks.left_hand = Some(hand_with_tips(
            JointPoint::new(0.0, 0.0, 0.0),
            JointPoint::new(0.0, 0.0, 0.10),
        ));
        landmarks.right_hand = Some(hand_with_tips(
            JointPoint::new(0.0, 0.0, 0.0),
            JointPoint::new(0.01, 0.01, 0.0),
        ));
        let frame = BodyFrame::from_landmarks(&landmarks);
        assert!(frame.left_hand_open);
        assert!(!frame.right_hand_open);
    }
}
