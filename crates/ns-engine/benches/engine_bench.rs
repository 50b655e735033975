//! Benchmarks for the engine hot path
//!
//! Run with: cargo bench --bench engine_bench -p ns-engine

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ns_engine::{Controller, EngineConfig, MixMode, Sequence, Tuning};
use ns_ir::{Adsr, InstrumentBank, InstrumentRecord, InstrumentRegion, RegionKind, Sample, SharedBytes, SongData};
use std::hint::black_box;

/// Poly track cycling a C major chord every 12 ticks, forever.
fn chord_loop() -> Vec<u8> {
    let mut program = vec![0xC7, 0x00];
    for key in [60u8, 64, 67, 72] {
        program.extend_from_slice(&[key, 0x64, 0x0C]);
    }
    program.extend_from_slice(&[0x80, 0x0C, 0x94, 0x00, 0x00, 0x00]);
    program
}

fn song(kind: RegionKind) -> SongData {
    let region = InstrumentRegion {
        kind,
        sample_id: if kind == RegionKind::PsgPulse { 3 } else { 0 },
        wave_archive: 0,
        base_note: 60,
        adsr: Adsr::new(120, 100, 100, 110),
        pan: 64,
    };
    let instrument = match kind {
        RegionKind::Sample => InstrumentRecord::SingleSample(region),
        RegionKind::PsgPulse => InstrumentRecord::PsgPulse(region),
        RegionKind::PsgNoise => InstrumentRecord::PsgNoise(region),
    };
    let wave: Vec<f32> = (0..1024).map(|i| (i as f32 / 1024.0 * std::f32::consts::TAU).sin()).collect();
    let mut song = SongData {
        program: SharedBytes::from(chord_loop()),
        bank: InstrumentBank::new(vec![instrument]),
        ..Default::default()
    };
    song.wave_archives[0] = Some(vec![Some(Sample::new(wave, 32768, 0, true, 0))]);
    song
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frames");

    for (name, kind) in [("sample", RegionKind::Sample), ("square", RegionKind::PsgPulse), ("noise", RegionKind::PsgNoise)] {
        let mut controller = Controller::new(EngineConfig { rng_seed: Some(0), ..Default::default() });
        controller.load(song(kind));
        group.bench_with_input(BenchmarkId::from_parameter(name), &kind, |b, _| {
            b.iter(|| {
                for _ in 0..1024 {
                    black_box(controller.render_frame().ok());
                }
            });
        });
    }

    group.finish();
}

fn bench_tuning(c: &mut Criterion) {
    let mut group = c.benchmark_group("tuning");

    for (name, tuning) in [("hardware", Tuning::HardwareAccurate), ("equal", Tuning::EqualTemperament)] {
        let config = EngineConfig { tuning, mixing: MixMode::Direct, rng_seed: Some(0), ..Default::default() };
        let mut controller = Controller::new(config);
        controller.load(song(RegionKind::Sample));
        group.bench_function(name, |b| {
            b.iter(|| {
                for _ in 0..1024 {
                    black_box(controller.render_frame().ok());
                }
            });
        });
    }

    group.finish();
}

fn bench_sequence_ticks(c: &mut Criterion) {
    let program = SharedBytes::from(chord_loop());

    c.bench_function("sequence_1000_ticks", |b| {
        b.iter(|| {
            let mut sequence = Sequence::new(program.clone(), 0, 0);
            for _ in 0..1000 {
                if sequence.tick().is_err() {
                    break;
                }
                while sequence.drain_message().is_some() {}
            }
            black_box(sequence.ticks_elapsed());
        });
    });
}

criterion_group!(benches, bench_render, bench_tuning, bench_sequence_ticks);
criterion_main!(benches);
