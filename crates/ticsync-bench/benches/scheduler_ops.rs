//! Criterion benchmarks for driving sessions frame by frame.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ticsync_bench::{loopback_profile, offline_profile, recorded_demo, FRAME_MS, LOOPBACK_REMOTE};
use ticsync_core::{NetworkLink, Offline};
use ticsync_engine::{squash, FrameIo, Session, SessionConfig};
use ticsync_test_utils::{ManualClock, MockNetwork, MockWorld, ScriptedInput};

fn run_frames(config: SessionConfig, network: &mut dyn NetworkLink, frames: usize) -> u64 {
    let mut session = Session::begin(config, 0).unwrap();
    let mut clock = ManualClock::new();
    let mut input = ScriptedInput::random(7, frames * 2);
    let mut world = MockWorld::new();
    for _ in 0..frames {
        clock.advance(FRAME_MS);
        session
            .drive_one_frame(&mut FrameIo {
                clock: &mut clock,
                input: &mut input,
                network: &mut *network,
                executor: &mut world,
            })
            .unwrap();
    }
    session.next_to_consume()
}

fn bench_offline_frames(c: &mut Criterion) {
    c.bench_function("offline_1000_frames", |b| {
        b.iter(|| black_box(run_frames(offline_profile(), &mut Offline, 1000)));
    });
}

fn bench_loopback_frames(c: &mut Criterion) {
    c.bench_function("loopback_1000_frames", |b| {
        b.iter(|| {
            let mut net = MockNetwork::loopback(LOOPBACK_REMOTE);
            black_box(run_frames(loopback_profile(), &mut net, 1000))
        });
    });
}

fn bench_duplicated_frames(c: &mut Criterion) {
    let config = SessionConfig {
        step_dup: 3,
        ..offline_profile()
    };
    c.bench_function("offline_dup3_1000_frames", |b| {
        b.iter(|| black_box(run_frames(config.clone(), &mut Offline, 1000)));
    });
}

fn bench_playback(c: &mut Criterion) {
    let demo = recorded_demo(42, 2000, true);

    c.bench_function("playback_2000_tics", |b| {
        b.iter(|| {
            let mut session = Session::begin(offline_profile(), 0).unwrap();
            session.begin_playback(demo.clone()).unwrap();
            let mut clock = ManualClock::new();
            let mut world = MockWorld::new();
            while !session.playback_ended() {
                clock.advance(FRAME_MS);
                session
                    .drive_one_frame(&mut FrameIo {
                        clock: &mut clock,
                        input: &mut ScriptedInput::default(),
                        network: &mut Offline,
                        executor: &mut world,
                    })
                    .unwrap();
            }
            black_box(world.executed().len());
        });
    });
}

fn bench_squash(c: &mut Criterion) {
    let mut batch = ticsync_core::CommandBatch::default();
    batch.in_game = [true; 4];
    for cmd in batch.commands.iter_mut() {
        cmd.chat_char = b'x';
    }

    c.bench_function("squash_4p", |b| {
        b.iter(|| {
            let mut copy = batch;
            black_box(squash(&mut copy));
        });
    });
}

criterion_group!(
    benches,
    bench_offline_frames,
    bench_loopback_frames,
    bench_duplicated_frames,
    bench_playback,
    bench_squash
);
criterion_main!(benches);
