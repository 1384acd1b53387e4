//! Session recording and timed replay.

use std::fs;
use std::io::Write;
use std::net::TcpStream;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::protocol;
use crate::retarget::JointAngleSet;

/// One transmitted frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    /// Seconds since stream start, 3 decimals
    pub timestamp: f64,
    pub angles: JointAngleSet,
}

/// Frames of one streaming session, in transmission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord {
    entries: Vec<SessionEntry>,
}

impl SessionRecord {
    pub fn new(entries: Vec<SessionEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Timestamp of the last frame
    pub fn duration_secs(&self) -> f64 {
        self.entries.last().map(|e| e.timestamp).unwrap_or(0.0)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write session file {}", path.display()))?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        let record: SessionRecord = serde_json::from_str(&content)
            .with_context(|| format!("invalid session file {}", path.display()))?;
        record
            .validate()
            .with_context(|| format!("invalid session file {}", path.display()))?;
        Ok(record)
    }

    /// Every timestamp must be a replayable offset.
    pub fn validate(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            replay_offset(entry.timestamp).with_context(|| format!("entry {}", i))?;
        }
        Ok(())
    }
}

fn replay_offset(timestamp: f64) -> Result<Duration> {
    if !(timestamp >= 0.0) {
        bail!("timestamp {} is not a non-negative number", timestamp);
    }
    Duration::try_from_secs_f64(timestamp)
        .with_context(|| format!("timestamp {} out of range", timestamp))
}

/// Round to millisecond precision for storage.
pub fn round_timestamp(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Append-only recorder owned by one streaming session.
#[derive(Debug, Default)]
pub struct SessionRecorder {
    entries: Vec<SessionEntry>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, elapsed: Duration, angles: &JointAngleSet) {
        self.entries.push(SessionEntry {
            timestamp: round_timestamp(elapsed.as_secs_f64()),
            angles: angles.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> SessionRecord {
        SessionRecord::new(self.entries)
    }
}

/// Send every entry over `writer`, paced by the recorded timestamps.
///
/// Each entry waits until `timestamp` seconds after replay start, so
/// irregular gaps in the original session are reproduced.
pub fn replay_to<W: Write>(record: &SessionRecord, writer: &mut W) -> Result<usize> {
    let start = Instant::now();
    for (i, entry) in record.entries().iter().enumerate() {
        let target = replay_offset(entry.timestamp)
            .with_context(|| format!("replay aborted at frame {}", i))?;
        let wait = target.saturating_sub(start.elapsed());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        protocol::send_angles(writer, &entry.angles)
            .with_context(|| format!("replay aborted at frame {}", i))?;
        debug!(frame = i, timestamp = entry.timestamp, "replayed");
    }
    Ok(record.len())
}

/// Connect to the receiver and replay a stored session.
pub fn replay_file<P: AsRef<Path>>(path: P, addr: &str) -> Result<usize> {
    let record = SessionRecord::load(&path)?;
    info!(
        "Replaying {} frames ({:.3}s) from {}",
        record.len(),
        record.duration_secs(),
        path.as_ref().display()
    );

    let mut stream =
        TcpStream::connect(addr).with_context(|| format!("failed to connect to {}", addr))?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", addr);

    let sent = replay_to(&record, &mut stream)?;
    info!("Replay complete: {} frames", sent);
    Ok(sent)
}
