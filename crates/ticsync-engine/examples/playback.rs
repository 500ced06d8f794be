//! Record a short offline session, then play the demo back.
//!
//! Logs at debug level so session and demo events are visible:
//!
//! ```text
//! cargo run -p ticsync-engine --example playback
//! ```

use ticsync_core::{Offline, ParticipantId};
use ticsync_engine::{FrameIo, FrameOutcome, Session, SessionConfig};
use ticsync_test_utils::{ManualClock, MockWorld, ScriptedInput};

const FRAME_MS: u64 = 29;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    // Live run.
    let mut session = Session::begin(SessionConfig::default(), 0)?;
    let mut clock = ManualClock::new();
    let mut input = ScriptedInput::random(2024, 256);
    let mut live = MockWorld::new();

    session.begin_recording();
    for _ in 0..70 {
        clock.advance(FRAME_MS);
        session.drive_one_frame(&mut FrameIo {
            clock: &mut clock,
            input: &mut input,
            network: &mut Offline,
            executor: &mut live,
        })?;
    }
    let demo = session
        .end_recording()
        .ok_or("recording was not active")?;
    println!(
        "recorded {} steps into {} bytes",
        live.executed().len(),
        demo.len()
    );

    // Playback.
    let mut session = Session::begin(SessionConfig::default(), 0)?;
    let header = session.begin_playback(demo)?;
    println!(
        "playing version {} demo, map E{}M{}",
        header.version, header.params.episode, header.params.map
    );

    let mut clock = ManualClock::new();
    let mut replayed = MockWorld::new();
    loop {
        clock.advance(FRAME_MS);
        let report = session.drive_one_frame(&mut FrameIo {
            clock: &mut clock,
            input: &mut ScriptedInput::default(),
            network: &mut Offline,
            executor: &mut replayed,
        })?;
        if report.outcome == FrameOutcome::PlaybackEnded {
            break;
        }
    }

    let p0 = ParticipantId(0);
    println!(
        "replayed {} steps; final position live={:?} replay={:?}",
        replayed.executed().len(),
        live.position(p0),
        replayed.position(p0)
    );
    if replayed.executed() != live.executed() {
        return Err("playback diverged from the live run".into());
    }
    println!("playback matches");
    Ok(())
}
