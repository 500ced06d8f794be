//! Criterion micro-benchmarks for the demo codec and recorder.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ticsync_bench::recorded_demo;
use ticsync_core::{CommandBatch, CommandRecord};
use ticsync_demo::codec::{decode_record, encode_record, Decoded};
use ticsync_demo::{DemoHeader, DemoPlayer, DemoRecorder, GameParams, TurnResolution};

/// One minute of play at 35 Hz.
const MINUTE_TICS: usize = 35 * 60;

fn sample_command(i: usize) -> CommandRecord {
    CommandRecord {
        forward_move: (i % 100) as i8,
        side_move: -((i % 50) as i8),
        angle_turn: (i as i16).wrapping_mul(97),
        ..CommandRecord::default()
    }
}

fn bench_encode_records(c: &mut Criterion) {
    let commands: Vec<_> = (0..1024).map(sample_command).collect();

    for resolution in [TurnResolution::Standard, TurnResolution::Expanded] {
        c.bench_function(&format!("encode_1024_records_{resolution:?}"), |b| {
            b.iter(|| {
                let mut buf = Vec::with_capacity(1024 * resolution.record_size());
                for cmd in &commands {
                    encode_record(&mut buf, cmd, resolution);
                }
                black_box(&buf);
            });
        });
    }
}

fn bench_decode_records(c: &mut Criterion) {
    let mut encoded = Vec::new();
    for i in 0..1024 {
        encode_record(&mut encoded, &sample_command(i), TurnResolution::Standard);
    }

    c.bench_function("decode_1024_records", |b| {
        b.iter(|| {
            let mut offset = 0;
            while let Ok(Decoded::Record(cmd)) =
                decode_record(&encoded, &mut offset, TurnResolution::Standard)
            {
                black_box(cmd);
            }
        });
    });
}

fn bench_record_minute(c: &mut Criterion) {
    let header = DemoHeader::for_recording(
        TurnResolution::Standard,
        GameParams::default(),
        0,
        [true, true, true, true],
    );
    let mut template = CommandBatch {
        in_game: [true; 4],
        ..CommandBatch::default()
    };
    for (slot, cmd) in template.commands.iter_mut().enumerate() {
        *cmd = sample_command(slot * 7);
    }

    c.bench_function("record_minute_4p", |b| {
        b.iter(|| {
            let mut recorder = DemoRecorder::new(header);
            for _ in 0..MINUTE_TICS {
                let mut batch = template;
                recorder.record_tic(&mut batch).unwrap();
            }
            black_box(recorder.finish());
        });
    });
}

fn bench_play_minute(c: &mut Criterion) {
    let demo = recorded_demo(42, MINUTE_TICS, false);

    c.bench_function("play_minute_1p", |b| {
        b.iter(|| {
            let player = DemoPlayer::new(demo.clone()).unwrap();
            for tic in player.tics() {
                black_box(tic.unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_encode_records,
    bench_decode_records,
    bench_record_minute,
    bench_play_minute
);
criterion_main!(benches);
