pub mod frame;
pub mod joint;

pub use frame::{is_hand_open, BodyFrame, HAND_OPEN_THRESHOLD};
pub use joint::{JointPoint, JointType};
