//! Property tests over random frame timing and delivery patterns.

use proptest::prelude::*;
use ticsync_core::{CommandRecord, Offline, ParticipantId, StepId};
use ticsync_engine::{FrameIo, FrameOutcome, Session, SessionConfig};
use ticsync_test_utils::{ManualClock, MockNetwork, MockWorld, ScriptedInput};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn networked_cursors_stay_ordered(
        frames in prop::collection::vec((0u64..80, 0usize..4), 1..120),
    ) {
        let config = SessionConfig {
            participants: [true, true, false, false],
            networked: true,
            ring_capacity: 16,
            ..SessionConfig::default()
        };
        let cap = config.lookahead_cap();
        let capacity = config.ring_capacity as u64;
        let mut session = Session::begin(config, 0).unwrap();
        let mut clock = ManualClock::new();
        let mut input = ScriptedInput::walking(3, 10_000);
        let mut net = MockNetwork::detached();
        let mut world = MockWorld::new();
        let mut delivered = 0u64;

        for (advance, burst) in frames {
            let before_produce = session.next_to_produce();
            let before_consume = session.next_to_consume();

            for _ in 0..burst {
                if delivered >= session.next_to_consume() + capacity {
                    break;
                }
                net.push(ParticipantId(1), StepId(delivered), CommandRecord::default());
                delivered += 1;
            }

            clock.advance(advance);
            let report = session
                .drive_one_frame(&mut FrameIo {
                    clock: &mut clock,
                    input: &mut input,
                    network: &mut net,
                    executor: &mut world,
                })
                .unwrap();

            let produced = session.next_to_produce();
            let consumed = session.next_to_consume();
            prop_assert!(produced >= before_produce);
            prop_assert!(consumed >= before_consume);
            prop_assert!(produced - consumed <= cap);
            prop_assert!(consumed <= session.lowest_available());
            prop_assert!(session.lowest_available() <= produced);
            prop_assert!(consumed <= delivered);
            prop_assert_eq!(report.steps_executed, consumed - before_consume);
            if report.outcome == FrameOutcome::Stalled {
                prop_assert_eq!(report.steps_executed, 0);
            }
        }
        prop_assert_eq!(world.executed().len() as u64, session.next_to_consume());
    }

    #[test]
    fn offline_duplication_runs_whole_units(
        step_dup in 1u32..=3,
        advances in prop::collection::vec(0u64..120, 1..80),
    ) {
        let config = SessionConfig {
            step_dup,
            ..SessionConfig::default()
        };
        let cap = config.lookahead_cap();
        let mut session = Session::begin(config, 0).unwrap();
        let mut clock = ManualClock::new();
        let mut input = ScriptedInput::walking(1, 10_000);
        let mut world = MockWorld::new();

        for advance in advances {
            clock.advance(advance);
            let report = session
                .drive_one_frame(&mut FrameIo {
                    clock: &mut clock,
                    input: &mut input,
                    network: &mut Offline,
                    executor: &mut world,
                })
                .unwrap();

            prop_assert_ne!(report.outcome, FrameOutcome::PlaybackEnded);
            prop_assert_eq!(report.steps_executed % step_dup as u64, 0);
            let consumed = session.next_to_consume();
            prop_assert_eq!(consumed % step_dup as u64, 0);
            prop_assert!(session.next_to_produce() - consumed / step_dup as u64 <= cap);
        }
    }
}
