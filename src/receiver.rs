//! Robot-side receive loop: one client, one angle message per line.

use std::io::{self, BufRead, BufReader, ErrorKind};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::actuation::Actuator;
use crate::config::ReceiverConfig;
use crate::protocol::{self, AngleCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Listening,
    Accepted,
    Reading,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub lines: usize,
    pub applied: usize,
    pub malformed: usize,
    pub actuation_errors: usize,
}

/// Stiffness held by the receiver. Released once, on `release` or on drop.
struct Engaged<'a, A: Actuator> {
    actuator: &'a mut A,
    scope: String,
    released: bool,
}

impl<'a, A: Actuator> Engaged<'a, A> {
    fn new(actuator: &'a mut A, scope: &str) -> Self {
        Self {
            actuator,
            scope: scope.to_string(),
            released: false,
        }
    }

    fn actuator(&mut self) -> &mut A {
        &mut *self.actuator
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.actuator.set_stiffness(&self.scope, 0.0) {
            Ok(()) => info!("Connection closed, robot at rest"),
            Err(e) => error!("failed to release stiffness: {:#}", e),
        }
    }
}

impl<'a, A: Actuator> Drop for Engaged<'a, A> {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct Receiver {
    config: ReceiverConfig,
    state: ReceiverState,
}

impl Receiver {
    pub fn new(config: ReceiverConfig) -> Self {
        Self {
            config,
            state: ReceiverState::Listening,
        }
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Bind the listening socket on the configured loopback address.
    pub fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .with_context(|| format!("failed to bind {}", self.config.listen_addr))?;
        Ok(listener)
    }

    /// Engage the robot, serve exactly one client, then release stiffness.
    ///
    /// Stiffness is released on every exit path, including startup errors
    /// after engagement.
    pub fn serve<A: Actuator>(
        &mut self,
        listener: &TcpListener,
        actuator: &mut A,
    ) -> Result<ReceiverStats> {
        let scope = self.config.stiffness_scope.clone();
        let mut engaged = Engaged::new(actuator, &scope);

        let result = self.engage_and_serve(listener, engaged.actuator());
        engaged.release();
        self.state = ReceiverState::Closed;
        result
    }

    fn engage_and_serve<A: Actuator>(
        &mut self,
        listener: &TcpListener,
        actuator: &mut A,
    ) -> Result<ReceiverStats> {
        actuator
            .set_stiffness(&self.config.stiffness_scope, 1.0)
            .context("failed to engage stiffness")?;
        actuator
            .go_to_posture(&self.config.posture, self.config.posture_speed)
            .with_context(|| format!("failed to reach posture {}", self.config.posture))?;

        self.state = ReceiverState::Listening;
        info!("Waiting for connection on {}...", listener.local_addr()?);
        let (stream, addr) = listener.accept()?;
        self.state = ReceiverState::Accepted;
        info!("Connected from {}", addr);

        self.configure_stream(&stream)?;
        self.read_loop(BufReader::new(stream), actuator)
    }

    fn configure_stream(&self, stream: &TcpStream) -> Result<()> {
        let timeout = match self.config.read_timeout_secs.filter(|s| *s > 0.0) {
            Some(secs) => Some(
                Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("invalid read_timeout_secs {}", secs))?,
            ),
            None => None,
        };
        stream.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Read lines until the peer closes, the read times out or fails.
    pub fn read_loop<R: BufRead, A: Actuator>(
        &mut self,
        mut reader: R,
        actuator: &mut A,
    ) -> Result<ReceiverStats> {
        self.state = ReceiverState::Reading;
        let mut stats = ReceiverStats::default();
        let mut line = String::new();

        loop {
            match protocol::recv_line(&mut reader, &mut line) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    info!("Peer closed the stream");
                    break;
                }
                Err(e) => match e.downcast_ref::<io::Error>().map(io::Error::kind) {
                    Some(ErrorKind::InvalidData) => {
                        stats.lines += 1;
                        stats.malformed += 1;
                        warn!("Invalid UTF-8 line received, skipping");
                        continue;
                    }
                    Some(ErrorKind::WouldBlock) | Some(ErrorKind::TimedOut) => {
                        warn!("No data within read timeout, closing");
                        break;
                    }
                    Some(ErrorKind::Interrupted) => continue,
                    _ => {
                        error!("Read failed: {:#}", e);
                        break;
                    }
                },
            }

            stats.lines += 1;
            self.handle_line(&line, actuator, &mut stats);
        }

        self.state = ReceiverState::Closed;
        info!(
            "Session summary: {} lines, {} applied, {} malformed, {} actuation errors",
            stats.lines, stats.applied, stats.malformed, stats.actuation_errors
        );
        Ok(stats)
    }

    fn handle_line<A: Actuator>(&self, line: &str, actuator: &mut A, stats: &mut ReceiverStats) {
        let angles = match protocol::decode_line(line) {
            Ok(angles) => angles,
            Err(e) => {
                stats.malformed += 1;
                warn!("Invalid JSON data received: {:#}", e);
                return;
            }
        };
        debug!(?angles, "received");

        let command = AngleCommand::from_angles(&angles);
        if !command.ignored.is_empty() {
            debug!("ignoring unknown joints: {:?}", command.ignored);
        }
        if command.is_empty() {
            return;
        }

        let (joints, targets) = command.to_targets();
        if joints.is_empty() {
            return;
        }
        match actuator.set_angles(&joints, &targets, self.config.speed_fraction) {
            Ok(()) => stats.applied += 1,
            Err(e) => {
                stats.actuation_errors += 1;
                error!("Error moving joints: {:#}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retarget::RobotJoint;
    use anyhow::bail;
    use std::io::{Cursor, Write};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Stiffness(String, f64),
        Posture(String, f64),
        Angles(Vec<RobotJoint>, Vec<f64>, f64),
    }

    #[derive(Default)]
    struct MockActuator {
        calls: Vec<Call>,
        fail_angles_once: bool,
        fail_posture: bool,
    }

    impl Actuator for MockActuator {
        fn set_stiffness(&mut self, scope: &str, level: f64) -> Result<()> {
            self.calls.push(Call::Stiffness(scope.to_string(), level));
            Ok(())
        }

        fn go_to_posture(&mut self, name: &str, speed: f64) -> Result<()> {
            self.calls.push(Call::Posture(name.to_string(), speed));
            if self.fail_posture {
                bail!("robot fell");
            }
            Ok(())
        }

        fn set_angles(
            &mut self,
            joints: &[RobotJoint],
            targets: &[f64],
            speed: f64,
        ) -> Result<()> {
            self.calls.push(Call::Angles(joints.to_vec(), targets.to_vec(), speed));
            if self.fail_angles_once {
                self.fail_angles_once = false;
                bail!("out of range");
            }
            Ok(())
        }
    }

    impl MockActuator {
        fn angle_calls(&self) -> Vec<&Call> {
            self.calls.iter().filter(|c| matches!(c, Call::Angles(..))).collect()
        }

        fn releases(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Stiffness(_, level) if *level == 0.0))
                .count()
        }
    }

    fn local_config() -> ReceiverConfig {
        ReceiverConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            ..ReceiverConfig::default()
        }
    }

    #[test]
    fn test_malformed_line_does_not_stop_loop() {
        let input = "not-json\n{\"HeadYaw\": 10}\n";
        let mut act = MockActuator::default();
        let mut rx = Receiver::new(local_config());
        let stats = rx.read_loop(Cursor::new(input), &mut act).unwrap();

        assert_eq!(stats.lines, 2);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.applied, 1);
        assert_eq!(act.angle_calls().len(), 1);
        assert_eq!(rx.state(), ReceiverState::Closed);
    }

    #[test]
    fn test_out_of_range_clamped_before_actuation() {
        let mut act = MockActuator::default();
        let mut rx = Receiver::new(local_config());
        rx.read_loop(Cursor::new("{\"RShoulderPitch\": 999}\n"), &mut act).unwrap();

        let expected = 119.5_f64.to_radians();
        match act.angle_calls()[0] {
            Call::Angles(joints, targets, speed) => {
                assert_eq!(joints, &vec![RobotJoint::RShoulderPitch]);
                assert!((targets[0] - expected).abs() < 1e-12);
                assert_eq!(*speed, 0.3);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_actuation_failure_continues() {
        let input = "{\"HeadYaw\": 10}\n{\"HeadYaw\": 20}\n";
        let mut act = MockActuator {
            fail_angles_once: true,
            ..MockActuator::default()
        };
        let mut rx = Receiver::new(local_config());
        let stats = rx.read_loop(Cursor::new(input), &mut act).unwrap();
        assert_eq!(stats.actuation_errors, 1);
        assert_eq!(stats.applied, 1);
        assert_eq!(act.angle_calls().len(), 2);
    }

    #[test]
    fn test_unknown_joints_not_forwarded() {
        let input = "{\"Tail\": 10, \"L_KNEE_PITCH\": 3}\n{}\n";
        let mut act = MockActuator::default();
        let mut rx = Receiver::new(local_config());
        let stats = rx.read_loop(Cursor::new(input), &mut act).unwrap();
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.malformed, 0);
        assert!(act.angle_calls().is_empty());
    }

    #[test]
    fn test_hand_channels_not_actuated() {
        let input = "{\"LHand\": 1, \"RHand\": 0, \"RShoulderPitch\": 10}\n{\"LHand\": 1}\n";
        let mut act = MockActuator::default();
        let mut rx = Receiver::new(local_config());
        let stats = rx.read_loop(Cursor::new(input), &mut act).unwrap();

        assert_eq!(stats.lines, 2);
        assert_eq!(stats.applied, 1);
        let calls = act.angle_calls();
        assert_eq!(calls.len(), 1);
        match calls[0] {
            Call::Angles(joints, targets, _) => {
                assert_eq!(joints, &vec![RobotJoint::RShoulderPitch]);
                assert!((targets[0] - 10.0_f64.to_radians()).abs() < 1e-12);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_skipped() {
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"{\"HeadPitch\": 1}\n");
        let mut act = MockActuator::default();
        let mut rx = Receiver::new(local_config());
        let stats = rx.read_loop(Cursor::new(input), &mut act).unwrap();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.applied, 1);
    }

    #[test]
    fn test_serve_engages_and_releases_once() {
        let mut rx = Receiver::new(local_config());
        let listener = rx.bind().unwrap();
        let addr = listener.local_addr().unwrap();

        let client = std::thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"{\"LShoulderPitch\": 45}\n").unwrap();
            stream.write_all(b"not-json\n").unwrap();
        });

        let mut act = MockActuator::default();
        let stats = rx.serve(&listener, &mut act).unwrap();
        client.join().unwrap();

        assert_eq!(stats.applied, 1);
        assert_eq!(act.calls[0], Call::Stiffness("Body".to_string(), 1.0));
        assert_eq!(act.calls[1], Call::Posture("StandInit".to_string(), 0.5));
        assert_eq!(act.calls.last(), Some(&Call::Stiffness("Body".to_string(), 0.0)));
        assert_eq!(act.releases(), 1);
        assert_eq!(rx.state(), ReceiverState::Closed);
    }

    #[test]
    fn test_release_after_startup_failure() {
        let mut rx = Receiver::new(local_config());
        let listener = rx.bind().unwrap();
        let mut act = MockActuator {
            fail_posture: true,
            ..MockActuator::default()
        };
        assert!(rx.serve(&listener, &mut act).is_err());
        assert_eq!(act.releases(), 1);
        assert!(act.angle_calls().is_empty());
    }

    #[test]
    fn test_read_timeout_closes_silent_peer() {
        let config = ReceiverConfig {
            read_timeout_secs: Some(0.1),
            ..local_config()
        };
        let mut rx = Receiver::new(config);
        let listener = rx.bind().unwrap();
        let addr = listener.local_addr().unwrap();

        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        let client = std::thread::spawn(move || {
            let _stream = TcpStream::connect(addr).unwrap();
            // keep the connection open and silent until the receiver gives up
            let _ = done_rx.recv_timeout(Duration::from_secs(5));
        });

        let mut act = MockActuator::default();
        let stats = rx.serve(&listener, &mut act).unwrap();
        done_tx.send(()).unwrap();
        client.join().unwrap();

        assert_eq!(stats.lines, 0);
        assert_eq!(act.releases(), 1);
    }
}
