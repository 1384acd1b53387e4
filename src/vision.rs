//! Boundary with the external pose/hand landmark provider.
//!
//! The provider runs out of process and hands over one `LandmarkFrame` per
//! captured video frame. The shipped source reads them as JSON lines.

use std::collections::BTreeMap;
use std::io::BufRead;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::body::JointPoint;

/// Thumb tip within the 21-point hand layout
pub const HAND_THUMB_TIP: usize = 4;
/// Index fingertip within the 21-point hand layout
pub const HAND_INDEX_TIP: usize = 8;

/// Landmarks for one captured frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Body landmark index → point. Undetected landmarks are omitted.
    #[serde(default)]
    pub pose: BTreeMap<usize, JointPoint>,
    #[serde(default)]
    pub left_hand: Option<Vec<JointPoint>>,
    #[serde(default)]
    pub right_hand: Option<Vec<JointPoint>>,
}

/// Yields landmark frames in capture order.
pub trait LandmarkSource {
    /// Blocks until the next frame. `Ok(None)` means the stream ended.
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>>;
}

/// Reads one JSON `LandmarkFrame` per line.
pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    line: String,
    line_no: u64,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .context("failed to read landmark stream")?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            match serde_json::from_str::<LandmarkFrame>(text) {
                Ok(frame) => return Ok(Some(frame)),
                Err(e) => {
                    warn!(line = self.line_no, "skipping malformed landmark frame: {}", e);
                }
            }
        }
    }
}
