//! Allocation-free render path tests.
//!
//! These tests verify that `Controller::render_frame()` does not allocate
//! once a song is loaded. They play synthetic archives for several seconds
//! to catch allocations triggered by note stealing, ties, sweeps, LFOs,
//! variables or track starts.
//!
//! Runs under a plain `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use ns_fixtures::*;
use ns_engine::{Controller, EngineConfig, MixMode, Tuning};
use ns_formats::SoundArchive;
use ns_ir::{SongData, SongId};

const SAMPLE_RATE: u32 = 32768;

fn load(program: &[u8]) -> SongData {
    let mut b = SdatBuilder::new();
    let swar = b.add_wave_archive(&[Wave::pcm8(256, 64).looped(0), Wave::pcm8(128, -48)]);
    let bank = b.add_bank(
        "BANK",
        &[
            Instrument::Single(Region::sample(0, 0, 60)),
            Instrument::Multi {
                ends: vec![59, 127],
                regions: vec![Region::sample(1, 0, 48), Region::sample(0, 0, 72)],
            },
            Instrument::Pulse(Region::sample(4, 0, 69)),
            Instrument::Noise(Region::sample(0, 0, 60)),
        ],
        [swar, 0xFFFF, 0xFFFF, 0xFFFF],
    );
    b.add_sequence("SEQ", program, bank);
    let archive = SoundArchive::try_parse(b.build()).unwrap();
    archive.load_song(SongId::Sequence(0)).unwrap()
}

/// Render a song for `duration_frames`, aborting on any heap allocation.
fn assert_render_alloc_free(program: &[u8], config: EngineConfig, duration_frames: usize) {
    let mut controller = Controller::new(config);
    controller.load(load(program));

    assert_no_alloc(|| {
        for _ in 0..duration_frames {
            let _ = controller.render_frame();
        }
    });
    assert!(controller.fault().is_none());
}

fn config() -> EngineConfig {
    EngineConfig { sample_rate: SAMPLE_RATE, rng_seed: Some(3), ..Default::default() }
}

#[test]
fn polyphonic_chords_alloc_free() {
    // poly; 20 notes per pass steal voices; rest 6; loop
    let mut program = vec![0xC7, 0x00];
    for key in 40..60u8 {
        program.extend_from_slice(&[key, 0x60, 0x40]);
    }
    program.extend_from_slice(&[0x80, 0x06, 0x94, 0x00, 0x00, 0x00]);
    assert_render_alloc_free(&program, config(), SAMPLE_RATE as usize * 5);
}

#[test]
fn sweeps_lfo_and_ties_alloc_free() {
    let program = [
        0xCA, 0x40, // lfo depth
        0xCB, 0x20, // lfo speed
        0xCE, 0x01, // portamento on
        0xCF, 0x10, // portamento time
        0xE3, 0x40, 0x00, // sweep pitch
        0x3C, 0x7F, 0x10, //
        0x81, 0x01, // multi-sample program
        0x30, 0x7F, 0x10, //
        0x48, 0x7F, 0x10, //
        0xC8, 0x01, // tie on
        0x3C, 0x7F, 0x08, 0x40, 0x7F, 0x08, //
        0xC8, 0x00, // tie off
        0xC4, 0x20, // pitch bend
        0x81, 0x02, // square
        0x45, 0x7F, 0x10, //
        0x81, 0x03, // noise
        0x45, 0x7F, 0x10, //
        0x81, 0x00, //
        0xC4, 0x00, //
        0x94, 0x00, 0x00, 0x00,
    ];
    assert_render_alloc_free(&program, config(), SAMPLE_RATE as usize * 5);
    let direct = EngineConfig { mixing: MixMode::Direct, tuning: Tuning::EqualTemperament, ..config() };
    assert_render_alloc_free(&program, direct, SAMPLE_RATE as usize * 2);
}

#[test]
fn variables_random_and_open_tracks_alloc_free() {
    let program = [
        0x93, 0x01, 0x09, 0x00, 0x00, // 0x00: open track 1 at 0x09
        0x94, 0x12, 0x00, 0x00, // 0x05: jump to 0x12
        0x81, 0x02, // 0x09: track 1, square
        0x43, 0x50, 0x0C, //
        0x94, 0x09, 0x00, 0x00, // loop track 1
        0xB0, 0x00, 0x05, 0x00, // 0x12: v0 = 5
        0xA0, 0x3C, 0x7F, 0x04, 0x00, 0x10, 0x00, // 0x16: note with random length
        0x94, 0x16, 0x00, 0x00, // loop track 0
    ];
    assert_render_alloc_free(&program, config(), SAMPLE_RATE as usize * 5);
}
