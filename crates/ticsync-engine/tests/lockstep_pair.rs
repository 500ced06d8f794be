//! Two replicas connected by an in-process link, driven alternately.
//!
//! Each round advances both clocks by one frame period and drives one
//! frame on each side. Stalls are expected early on (the first replica
//! waits for the second) and are simply retried.

use ticsync_core::{CommandRecord, ParticipantId, SessionError};
use ticsync_demo::DemoPlayer;
use ticsync_engine::{FrameIo, FrameReport, Policy, Session, SessionConfig};
use ticsync_test_utils::{ManualClock, MockNetwork, MockWorld, ScriptedInput};

const FRAME_MS: u64 = 29;
const RING: usize = 32;

struct Replica {
    session: Session,
    clock: ManualClock,
    input: ScriptedInput,
    net: MockNetwork,
    world: MockWorld,
}

impl Replica {
    fn new(policy: Policy, local: u8, net: MockNetwork, world: MockWorld) -> Self {
        let config = SessionConfig {
            policy,
            local_index: local,
            participants: [true, true, false, false],
            networked: true,
            ring_capacity: RING,
            ..SessionConfig::default()
        };
        Self::with_config(config, net, world)
    }

    fn with_config(config: SessionConfig, net: MockNetwork, world: MockWorld) -> Self {
        Self {
            session: Session::begin(config, 0).unwrap(),
            clock: ManualClock::new(),
            input: ScriptedInput::walking(25, 10_000),
            net,
            world,
        }
    }

    fn frame(&mut self) -> Result<FrameReport, SessionError> {
        self.clock.advance(FRAME_MS);
        self.session.drive_one_frame(&mut FrameIo {
            clock: &mut self.clock,
            input: &mut self.input,
            network: &mut self.net,
            executor: &mut self.world,
        })
    }
}

fn pair(policy: Policy, world_a: MockWorld, world_b: MockWorld) -> (Replica, Replica) {
    let (net_a, net_b) = MockNetwork::pair(ParticipantId(0), ParticipantId(1));
    (
        Replica::new(policy, 0, net_a, world_a),
        Replica::new(policy, 1, net_b, world_b),
    )
}

fn assert_same_prefix(a: &MockWorld, b: &MockWorld) {
    let n = a.executed().len().min(b.executed().len());
    assert!(n > 0);
    assert_eq!(&a.executed()[..n], &b.executed()[..n]);
}

#[test]
fn bounded_replicas_execute_identical_streams() {
    let (mut a, mut b) = pair(Policy::Bounded, MockWorld::new(), MockWorld::new());
    for _ in 0..200 {
        a.frame().unwrap();
        b.frame().unwrap();
    }

    assert!(a.session.next_to_consume() > 150);
    assert!(b.session.next_to_consume() > 150);
    assert_same_prefix(&a.world, &b.world);
    // Several ring cycles were audited without a mismatch.
    assert!(a.session.metrics().audited_steps > 3 * RING as u64);
    assert!(a.world.desyncs().is_empty());
    assert!(b.world.desyncs().is_empty());
    for batch in a.world.executed() {
        assert_eq!(batch.in_game, [true, true, false, false]);
    }
}

#[test]
fn divergence_is_detected_one_ring_cycle_later() {
    const DIVERGE_AT: u64 = 10;
    let (mut a, mut b) = pair(
        Policy::Bounded,
        MockWorld::new(),
        MockWorld::new().diverge_at(DIVERGE_AT as usize, ParticipantId(1), 1),
    );

    let mut failure = None;
    for _ in 0..500 {
        if let Err(e) = a.frame() {
            failure = Some(e);
            break;
        }
        b.frame().unwrap();
    }

    let report = match failure {
        Some(SessionError::ConsistencyFailure(report)) => report,
        other => panic!("expected a consistency failure, got {other:?}"),
    };
    assert_eq!(report.participant, ParticipantId(1));
    assert!(report.step.0 >= DIVERGE_AT);
    assert_eq!(report.step.0, DIVERGE_AT + RING as u64);
    assert_eq!(report.found, report.expected.wrapping_add(1));

    // The executor heard about it exactly once, and the failing unit did
    // not run.
    assert_eq!(a.world.desyncs(), &[report]);
    assert_eq!(a.session.next_to_consume(), DIVERGE_AT + RING as u64);
    assert!(a.session.is_terminated());
    assert_eq!(a.frame().unwrap_err(), SessionError::Terminated);
}

#[test]
fn departed_participant_stops_holding_back_the_survivor() {
    let (mut a, mut b) = pair(Policy::Bounded, MockWorld::new(), MockWorld::new());
    for _ in 0..20 {
        a.frame().unwrap();
        b.frame().unwrap();
    }

    a.net.depart(ParticipantId(1));
    let before = a.session.next_to_consume();
    for _ in 0..40 {
        a.frame().unwrap();
    }

    assert!(a.session.next_to_consume() > before + 20);
    let last = a.world.executed().last().unwrap();
    assert_eq!(last.in_game, [true, false, false, false]);
}

#[test]
fn legacy_replicas_stay_in_sync() {
    let (mut a, mut b) = pair(Policy::LegacyAdaptive, MockWorld::new(), MockWorld::new());
    for _ in 0..200 {
        a.frame().unwrap();
        b.frame().unwrap();
    }

    assert!(a.session.next_to_consume() > 100);
    assert!(b.session.next_to_consume() > 100);
    assert_same_prefix(&a.world, &b.world);
    assert!(a.world.desyncs().is_empty());
    // Slot 0 is the reference participant and never adapts.
    assert_eq!(a.session.metrics().slow_down_nudges, 0);
    assert_eq!(a.session.metrics().skipped_production_steps, 0);
}

#[test]
fn out_of_order_delivery_is_fatal() {
    let config = SessionConfig {
        participants: [true, true, false, false],
        networked: true,
        ..SessionConfig::default()
    };
    let mut session = Session::begin(config, 0).unwrap();
    let mut net = MockNetwork::detached();
    net.push(
        ParticipantId(1),
        ticsync_core::StepId(5),
        ticsync_core::CommandRecord::default(),
    );

    let err = session
        .drive_one_frame(&mut FrameIo {
            clock: &mut ManualClock::new(),
            input: &mut ScriptedInput::default(),
            network: &mut net,
            executor: &mut MockWorld::new(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidDelivery { reason: "out of order", .. }
    ));
}

#[test]
fn recording_replica_executes_what_its_peer_sent() {
    // Turn deltas the standard demo cannot store, and a forward move equal
    // to the end marker.
    let cmd = CommandRecord {
        forward_move: i8::MIN,
        angle_turn: 100,
        ..CommandRecord::default()
    };
    let (mut a, mut b) = pair(Policy::Bounded, MockWorld::new(), MockWorld::new());
    a.input = ScriptedInput::new(vec![cmd; 10_000]);
    b.input = ScriptedInput::new(vec![cmd; 10_000]);
    a.session.begin_recording();

    for _ in 0..60 {
        a.frame().unwrap();
        b.frame().unwrap();
    }

    assert_same_prefix(&a.world, &b.world);
    assert!(a.world.desyncs().is_empty());
    assert!(b.world.desyncs().is_empty());

    // The peer's slot runs untouched on both sides.
    let executed = a.world.executed();
    assert!(executed.len() > 40);
    for batch in executed {
        assert_eq!(batch.commands[1].angle_turn, 100);
        assert_eq!(batch.commands[1].forward_move, i8::MIN);
    }

    // The recorder's own slot was produced in storable form.
    let demo = a.session.end_recording().unwrap();
    let mut player = DemoPlayer::new(demo).unwrap();
    for batch in executed {
        let stored = player.next_tic().unwrap().unwrap();
        assert_eq!(stored.commands[0].angle_turn, batch.commands[0].angle_turn);
        assert_eq!(stored.commands[0].forward_move, batch.commands[0].forward_move);
        assert_eq!(batch.commands[0].angle_turn & 0xff, 0);
        assert_eq!(batch.commands[0].forward_move, -127);
    }
    assert_eq!(player.next_tic().unwrap(), None);
}

#[test]
fn drone_runs_its_peer_without_producing() {
    let participants = [false, true, false, false];
    let (net_drone, net_peer) = MockNetwork::pair(ParticipantId(0), ParticipantId(1));
    let mut drone = Replica::with_config(
        SessionConfig {
            local_index: 0,
            participants,
            networked: true,
            drone: true,
            ring_capacity: RING,
            ..SessionConfig::default()
        },
        net_drone,
        MockWorld::new(),
    );
    let mut peer = Replica::with_config(
        SessionConfig {
            local_index: 1,
            participants,
            networked: true,
            ring_capacity: RING,
            ..SessionConfig::default()
        },
        net_peer,
        MockWorld::new(),
    );

    for _ in 0..100 {
        peer.frame().unwrap();
        drone.frame().unwrap();
    }

    assert!(drone.input.sampled().is_empty());
    assert!(drone.net.sent().is_empty());
    assert!(drone.input.services() > 50);
    assert!(drone.world.executed().len() > 50);
    assert_same_prefix(&drone.world, &peer.world);
    assert!(drone.world.desyncs().is_empty());
    for batch in drone.world.executed() {
        assert_eq!(batch.in_game, participants);
        assert_eq!(batch.commands[1].forward_move, 25);
    }
}
