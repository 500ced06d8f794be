//! Benchmark profiles and fixtures for ticsync.
//!
//! - [`offline_profile`]: single participant, no network
//! - [`loopback_profile`]: two participants where the remote slot is fed
//!   by the local link's own sends
//! - [`recorded_demo`]: a demo of a given length built from a random
//!   input script

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ticsync_core::{Offline, ParticipantId};
use ticsync_engine::{FrameIo, Session, SessionConfig};
use ticsync_test_utils::{ManualClock, MockWorld, ScriptedInput};

/// Frame period used by the session benchmarks: just over one tic.
pub const FRAME_MS: u64 = 29;

/// Default offline configuration.
pub fn offline_profile() -> SessionConfig {
    SessionConfig::default()
}

/// Networked two-participant configuration. Pair it with
/// `MockNetwork::loopback(ParticipantId(1))` so the remote slot fills as
/// fast as the local one.
pub fn loopback_profile() -> SessionConfig {
    SessionConfig {
        participants: [true, true, false, false],
        networked: true,
        ..SessionConfig::default()
    }
}

/// The remote participant in [`loopback_profile`].
pub const LOOPBACK_REMOTE: ParticipantId = ParticipantId(1);

/// Record an offline session until it holds at least `tics` steps and
/// return the finished demo.
///
/// `long_tics` selects the expanded record format.
pub fn recorded_demo(seed: u64, tics: usize, long_tics: bool) -> Vec<u8> {
    let config = SessionConfig {
        long_tics,
        ..offline_profile()
    };
    let mut session = Session::begin(config, 0).expect("offline profile is valid");
    let mut clock = ManualClock::new();
    let mut input = ScriptedInput::random(seed, tics + 64);
    let mut world = MockWorld::new();

    session.begin_recording();
    while (session.next_to_consume() as usize) < tics {
        clock.advance(FRAME_MS);
        let frame = session.drive_one_frame(&mut FrameIo {
            clock: &mut clock,
            input: &mut input,
            network: &mut Offline,
            executor: &mut world,
        });
        if frame.is_err() {
            break;
        }
    }
    session.end_recording().unwrap_or_default()
}
