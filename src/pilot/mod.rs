//! The pilot loop: one task owning every piece of mutable protocol state
//!
//! Two periodic activities share the loop: the decision tick
//! (policy -> encode -> serial write -> ack read -> reconcile) and the
//! fixed-rate world tick that decays the frightened timer. The ack read
//! blocks the loop for up to the serial timeout, so world ticks are
//! deferred while a slow robot holds the line.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::agent::{AgentState, Distiller};
use crate::config::Config;
use crate::feed::protocol::{GameSnapshot, Telemetry};
use crate::link::RobotLink;
use crate::map::Map;
use crate::motion::MotionModel;
use crate::policy::Policy;
use crate::protocol::{encode_command, Action, Mode, SequenceCounter};

/// Control handle for a running pilot
#[derive(Clone)]
pub struct PilotHandle {
    frequency: watch::Sender<u32>,
    shutdown: watch::Sender<bool>,
}

impl PilotHandle {
    /// Change the decision-tick rate at runtime; 0 disables decision ticks
    /// while the rest of the loop keeps running
    pub fn set_frequency(&self, hz: u32) {
        let _ = self.frequency.send(hz);
    }

    /// Stop the loop after the current cycle
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// The single-owner actor driving the robot
pub struct Pilot<L: RobotLink, P: Policy> {
    distiller: Distiller,
    motion: MotionModel,
    sequence: SequenceCounter,
    link: L,
    policy: P,

    snapshots: mpsc::Receiver<GameSnapshot>,
    telemetry: mpsc::Sender<Telemetry>,

    frequency: watch::Receiver<u32>,
    shutdown: watch::Receiver<bool>,
    world_hz: u32,

    latest: Option<AgentState>,
}

impl<L: RobotLink, P: Policy> Pilot<L, P> {
    pub fn new(
        config: &Config,
        map: Arc<Map>,
        link: L,
        policy: P,
        snapshots: mpsc::Receiver<GameSnapshot>,
        telemetry: mpsc::Sender<Telemetry>,
    ) -> (Self, PilotHandle) {
        let (frequency_tx, frequency_rx) = watch::channel(config.decision_hz);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = PilotHandle {
            frequency: frequency_tx,
            shutdown: shutdown_tx,
        };

        let pilot = Self {
            distiller: Distiller::new(map.clone()),
            motion: MotionModel::new(map),
            sequence: SequenceCounter::new(),
            link,
            policy,
            snapshots,
            telemetry,
            frequency: frequency_rx,
            shutdown: shutdown_rx,
            world_hz: config.world_hz,
            latest: None,
        };

        (pilot, handle)
    }

    /// Run the loop until shutdown or until the snapshot feed closes
    pub async fn run(mut self) {
        info!(world_hz = self.world_hz, "Pilot loop started");

        let mut world_tick = interval(Duration::from_micros(
            1_000_000 / self.world_hz as u64,
        ));
        world_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut decision_tick = make_decision_interval(*self.frequency.borrow());

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }

                _ = world_tick.tick() => {
                    self.distiller.world_tick();
                }

                _ = tick_or_never(&mut decision_tick) => {
                    self.decision_tick();
                }

                changed = self.frequency.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let hz = *self.frequency.borrow();
                    info!(decision_hz = hz, "Decision frequency changed");
                    decision_tick = make_decision_interval(hz);
                }

                snapshot = self.snapshots.recv() => {
                    match snapshot {
                        Some(snap) => self.ingest(&snap),
                        None => {
                            info!("Snapshot feed closed, stopping pilot");
                            break;
                        }
                    }
                }
            }
        }

        info!("Pilot loop stopped");
    }

    /// Fold one snapshot into the local model
    fn ingest(&mut self, snap: &GameSnapshot) {
        let outcome = self.distiller.on_snapshot(snap);
        // The camera saw the robot move: an out-of-band movement ack.
        if outcome.position_changed {
            self.sequence.advance();
        }
        self.latest = Some(outcome.state);
    }

    /// One decision cycle: policy, motion, command out, ack back
    fn decision_tick(&mut self) {
        let Some(state) = self.latest.clone() else {
            return;
        };

        let (action, distance) = self.policy.get_action(&state);

        if state.mode == Mode::Paused {
            self.motion.reset();
        } else if let Action::Move(dir) = action {
            self.motion.steer(dir, state.pac);
        }

        let encoded = encode_command(
            action,
            distance,
            self.sequence.peek(),
            state.mode,
            self.distiller.orientation(),
        );

        debug!(
            seq = self.sequence.peek(),
            action = ?action,
            distance = distance,
            "Sending command"
        );

        if let Err(e) = self.link.send(&encoded.bytes) {
            warn!(error = %e, "Command write failed, skipping cycle");
            return;
        }

        match self.link.recv_ack() {
            Ok(ack) => {
                if self.sequence.reconcile(ack.seq, true) {
                    if let Some(dir) = encoded.pending_orientation {
                        self.distiller.set_orientation(dir);
                    }
                } else {
                    debug!(
                        ack_seq = ack.seq,
                        seq = self.sequence.peek(),
                        "Stale ack, command will be retried"
                    );
                }
            }
            Err(e) => {
                warn!(error = %e, "No ack this cycle, command will be retried");
            }
        }

        let (x, y) = self.motion.position();
        let pose = Telemetry {
            x,
            y,
            direction: self.motion.direction(),
        };
        if self.telemetry.try_send(pose).is_err() {
            debug!("Telemetry channel full or closed, dropping pose");
        }
    }
}

fn make_decision_interval(hz: u32) -> Option<Interval> {
    if hz == 0 {
        return None;
    }
    let mut tick = interval(Duration::from_micros(1_000_000 / hz as u64));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    Some(tick)
}

async fn tick_or_never(tick: &mut Option<Interval>) {
    match tick {
        Some(tick) => {
            tick.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkError;
    use crate::map::{Dir, START_POS};
    use crate::protocol::{decode_command, AckFrame, FrameError};
    use bytes::Bytes;
    use std::collections::VecDeque;

    struct FakeLink {
        sent: Vec<Bytes>,
        acks: VecDeque<Result<AckFrame, LinkError>>,
    }

    impl FakeLink {
        fn new() -> Self {
            Self {
                sent: Vec::new(),
                acks: VecDeque::new(),
            }
        }

        fn ack_next_with(&mut self, seq: u32) {
            self.acks.push_back(Ok(AckFrame { seq }));
        }
    }

    impl RobotLink for FakeLink {
        fn send(&mut self, frame: &[u8]) -> Result<(), LinkError> {
            self.sent.push(Bytes::copy_from_slice(frame));
            Ok(())
        }

        fn recv_ack(&mut self) -> Result<AckFrame, LinkError> {
            self.acks.pop_front().unwrap_or(Err(LinkError::Framing(
                FrameError::Length { got: 0, want: 7 },
            )))
        }
    }

    struct FixedPolicy(Action, u8);

    impl Policy for FixedPolicy {
        fn get_action(&mut self, _state: &AgentState) -> (Action, u8) {
            (self.0, self.1)
        }
    }

    fn snapshot(score: u32, lives: u32, mode: Mode, pac: (i16, i16)) -> GameSnapshot {
        use crate::feed::protocol::{Ghost, GhostState, GridPos};
        let ghost = Ghost {
            x: 13,
            y: 16,
            state: GhostState::Scatter,
        };
        GameSnapshot {
            score,
            lives,
            mode,
            pacman: GridPos { x: pac.0, y: pac.1 },
            red_ghost: ghost,
            pink_ghost: ghost,
            orange_ghost: ghost,
            blue_ghost: ghost,
        }
    }

    fn pilot(
        action: Action,
        distance: u8,
    ) -> (
        Pilot<FakeLink, FixedPolicy>,
        PilotHandle,
        mpsc::Sender<GameSnapshot>,
        mpsc::Receiver<Telemetry>,
    ) {
        let config = Config {
            engine_addr: String::new(),
            log_level: "info".to_string(),
            serial_device: String::new(),
            serial_baud: 115_200,
            serial_timeout: Duration::from_millis(10),
            decision_hz: 32,
            world_hz: 24,
        };
        let (snapshot_tx, snapshot_rx) = mpsc::channel(16);
        let (telemetry_tx, telemetry_rx) = mpsc::channel(16);
        let (pilot, handle) = Pilot::new(
            &config,
            Arc::new(Map::new()),
            FakeLink::new(),
            FixedPolicy(action, distance),
            snapshot_rx,
            telemetry_tx,
        );
        (pilot, handle, snapshot_tx, telemetry_rx)
    }

    #[test]
    fn committed_ack_advances_sequence_and_orientation() {
        let (mut pilot, _handle, _tx, mut telemetry) = pilot(Action::Move(Dir::Left), 1);

        pilot.ingest(&snapshot(1, 3, Mode::Running, START_POS));
        let seq = pilot.sequence.peek();
        pilot.link.ack_next_with(seq);

        pilot.decision_tick();

        assert!(pilot.sequence.peek() > seq);
        assert_eq!(pilot.distiller.orientation(), Dir::Left);

        let pose = telemetry.try_recv().unwrap();
        assert_eq!((pose.x, pose.y), (START_POS.0 - 1, START_POS.1));
        assert_eq!(pose.direction, Dir::Left);

        let frame = decode_command(&pilot.link.sent[0]).unwrap();
        assert_eq!(frame.seq, seq);
        assert_eq!(frame.mode, Mode::Running);
    }

    #[test]
    fn failed_ack_retries_same_sequence_next_tick() {
        let (mut pilot, _handle, _tx, _telemetry) = pilot(Action::Move(Dir::Left), 1);

        pilot.ingest(&snapshot(1, 3, Mode::Running, START_POS));
        let seq = pilot.sequence.peek();

        // No scripted ack: the link reports a framing failure.
        pilot.decision_tick();
        assert_eq!(pilot.sequence.peek(), seq);

        let orientation_before = pilot.distiller.orientation();
        assert_eq!(orientation_before, Dir::Up);

        // Next tick gets a good ack and commits exactly one step.
        pilot.link.ack_next_with(seq);
        pilot.decision_tick();
        assert!(pilot.sequence.peek() > seq);

        // Both frames carried the same counter.
        let first = decode_command(&pilot.link.sent[0]).unwrap();
        let second = decode_command(&pilot.link.sent[1]).unwrap();
        assert_eq!(first.seq, second.seq);
    }

    #[test]
    fn paused_mode_resets_position_and_sends_zero_distance() {
        let (mut pilot, _handle, _tx, mut telemetry) = pilot(Action::Move(Dir::Left), 4);

        pilot.ingest(&snapshot(1, 3, Mode::Running, START_POS));
        pilot.link.ack_next_with(pilot.sequence.peek());
        pilot.decision_tick();
        assert_ne!(pilot.motion.position(), START_POS);
        let _ = telemetry.try_recv();

        pilot.ingest(&snapshot(1, 3, Mode::Paused, START_POS));
        pilot.link.ack_next_with(pilot.sequence.peek());
        pilot.decision_tick();

        assert_eq!(pilot.motion.position(), START_POS);
        let frame = decode_command(pilot.link.sent.last().unwrap()).unwrap();
        assert_eq!(frame.mode, Mode::Paused);
        assert_eq!(frame.distance, 0);
    }

    #[test]
    fn snapshot_position_change_advances_sequence_out_of_band() {
        let (mut pilot, _handle, _tx, _telemetry) = pilot(Action::Stay, 0);

        let seq = pilot.sequence.peek();
        pilot.ingest(&snapshot(1, 3, Mode::Running, (13, 7)));
        assert!(pilot.sequence.peek() > seq);

        // Same tracked position: no further advance.
        let seq = pilot.sequence.peek();
        pilot.ingest(&snapshot(1, 3, Mode::Running, (13, 7)));
        assert_eq!(pilot.sequence.peek(), seq);
    }

    #[test]
    fn stay_commits_no_orientation_change() {
        let (mut pilot, _handle, _tx, _telemetry) = pilot(Action::Stay, 0);

        pilot.ingest(&snapshot(1, 3, Mode::Running, START_POS));
        pilot.link.ack_next_with(pilot.sequence.peek());
        pilot.decision_tick();

        assert_eq!(pilot.distiller.orientation(), Dir::Up);
        assert_eq!(pilot.motion.position(), START_POS);
    }

    #[tokio::test]
    async fn zero_frequency_disables_decision_ticks_only() {
        let (pilot, handle, tx, _telemetry) = pilot(Action::Move(Dir::Left), 1);
        handle.set_frequency(0);

        let task = tokio::spawn(pilot.run());

        tx.send(snapshot(1, 3, Mode::Running, START_POS))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        handle.shutdown();
        task.await.unwrap();
    }
}
