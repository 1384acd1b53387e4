//! Sender side: per-frame pipeline output streamed to the robot receiver.

use std::io::Write;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::{debug, error, info, warn};

use crate::body::BodyFrame;
use crate::protocol;
use crate::retarget::{JointAngleSet, Retargeter};
use crate::session::{SessionRecord, SessionRecorder};
use crate::vision::LandmarkSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connected,
    Streaming,
    Closed,
}

/// Writes one angle line per frame, optionally recording what was sent.
pub struct AngleStreamer<W: Write> {
    writer: Option<W>,
    state: StreamState,
    started: Option<Instant>,
    recorder: Option<SessionRecorder>,
    sent: usize,
}

impl AngleStreamer<TcpStream> {
    pub fn connect(addr: &str, record: bool) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .with_context(|| format!("failed to connect to receiver at {}", addr))?;
        stream.set_nodelay(true)?;
        info!("Connected to receiver {}", addr);
        let mut streamer = Self::new(record);
        streamer.attach(stream)?;
        Ok(streamer)
    }
}

impl<W: Write> AngleStreamer<W> {
    pub fn new(record: bool) -> Self {
        Self {
            writer: None,
            state: StreamState::Idle,
            started: None,
            recorder: record.then(SessionRecorder::new),
            sent: 0,
        }
    }

    pub fn attach(&mut self, writer: W) -> Result<()> {
        if self.state != StreamState::Idle {
            bail!("stream already attached ({:?})", self.state);
        }
        self.writer = Some(writer);
        self.state = StreamState::Connected;
        Ok(())
    }

    /// Enter streaming; session timestamps count from here.
    pub fn start(&mut self) -> Result<()> {
        if self.state != StreamState::Connected {
            bail!("cannot start streaming from {:?}", self.state);
        }
        self.started = Some(Instant::now());
        self.state = StreamState::Streaming;
        Ok(())
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn elapsed(&self) -> Duration {
        self.started.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Send one frame. A write failure closes the stream.
    pub fn send(&mut self, angles: &JointAngleSet) -> Result<()> {
        if self.state != StreamState::Streaming {
            bail!("cannot send while {:?}", self.state);
        }
        let elapsed = self.elapsed();
        let Some(writer) = self.writer.as_mut() else {
            bail!("stream has no writer");
        };

        if let Err(e) = protocol::send_angles(writer, angles) {
            self.writer = None;
            self.state = StreamState::Closed;
            return Err(e.context("angle stream write failed"));
        }
        self.sent += 1;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(elapsed, angles);
        }
        debug!(frame = self.sent, "sent");
        Ok(())
    }

    /// Close the connection. Dropping the socket tells the receiver to
    /// release stiffness. Returns the recorded session, if recording.
    pub fn close(&mut self) -> Option<SessionRecord> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Final flush failed: {}", e);
            }
        }
        if self.state != StreamState::Closed {
            info!("Stream closed after {} frames", self.sent);
        }
        self.state = StreamState::Closed;
        self.recorder.take().map(SessionRecorder::finish)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderStats {
    pub frames: usize,
    pub incomplete: usize,
    pub warmup: usize,
    pub sent: usize,
}

/// Capture → extract → clamp → smooth → send until the source ends or a
/// write fails. Frames arriving before `warmup` are dropped untouched.
pub fn run_sender<S, W>(
    source: &mut S,
    retargeter: &mut Retargeter,
    streamer: &mut AngleStreamer<W>,
    warmup: Duration,
) -> Result<SenderStats>
where
    S: LandmarkSource,
    W: Write,
{
    streamer.start()?;
    let mut stats = SenderStats::default();

    loop {
        let landmarks = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Landmark source ended");
                break;
            }
            Err(e) => {
                error!("Landmark source failed: {:#}", e);
                break;
            }
        };
        stats.frames += 1;

        let body = BodyFrame::from_landmarks(&landmarks);
        if !body.is_fully_detected() {
            stats.incomplete += 1;
            debug!("Body not fully detected, frame skipped");
            continue;
        }
        if streamer.elapsed() < warmup {
            stats.warmup += 1;
            continue;
        }

        let Some(angles) = retargeter.process(&body) else {
            continue;
        };
        if let Err(e) = streamer.send(&angles) {
            error!("{:#}", e);
            break;
        }
        stats.sent += 1;
    }

    Ok(stats)
}
