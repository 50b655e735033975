//! End-to-end playback of synthetic archives through `EngineHandle`.
//!
//! Everything here renders offline; no audio device is needed.

use ns_fixtures::*;
use ns_master::{EngineConfig, EngineHandle, MasterError, RenderOptions, SongId, StopReason};

const END_TRACK: u8 = 0xFF;

/// note 60 for 48 ticks, end
const ONE_NOTE: [u8; 4] = [0x3C, 0x7F, 0x30, END_TRACK];
/// note for 24 ticks, rest 24, jump back to the start
const LOOPING: [u8; 9] = [0x3C, 0x7F, 0x18, 0x80, 0x18, 0x94, 0x00, 0x00, 0x00];
/// note 60 with a random duration of 8..=32 ticks, forever
const RANDOM_LOOP: [u8; 11] = [0xA0, 0x3C, 0x7F, 8, 0, 32, 0, 0x94, 0x00, 0x00, 0x00];

fn archive() -> Vec<u8> {
    let mut b = SdatBuilder::new();
    let swar = b.add_wave_archive(&[Wave::pcm8(64, 96).looped(0), Wave::pcm8(64, -64).looped(0)]);
    let bank = b.add_bank(
        "BANK_MAIN",
        &[
            Instrument::Single(Region::sample(0, 0, 60)),
            Instrument::Single(Region::sample(1, 0, 60).with_adsr(127, 127, 127, 127)),
        ],
        [swar, 0xFFFF, 0xFFFF, 0xFFFF],
    );
    b.add_sequence("SEQ_ONE_NOTE", &ONE_NOTE, bank);
    b.add_sequence("SEQ_LOOP", &LOOPING, bank);
    b.add_sequence("SEQ_RANDOM", &RANDOM_LOOP, bank);
    // same instrument, but the bank names no wave archive
    let bare = b.add_bank("BANK_BARE", &[Instrument::Single(Region::sample(0, 0, 60))], [0xFFFF; 4]);
    b.add_sequence("SEQ_BARE", &ONE_NOTE, bare);
    // sub-sequence 1 switches to program 1 before its note
    b.add_archive("SAR_SE", &[(0, bank), (1, bank)], &["SE_A", "SE_B"], &[END_TRACK, 0x81, 0x01, 0x3C, 0x7F, 0x10, END_TRACK]);
    b.add_stream("STRM_BGM", strm_file(&[&[16, 32, 48, 64]], 32768, false, 0));
    b.build()
}

fn handle(song: SongId) -> EngineHandle {
    let mut handle = EngineHandle::new(EngineConfig { rng_seed: Some(7), ..Default::default() });
    handle.load_archive(archive()).unwrap();
    handle.select(song).unwrap();
    handle
}

fn peak(frames: &[ns_master::Frame]) -> f32 {
    frames.iter().fold(0.0f32, |p, f| p.max(f.left.abs()).max(f.right.abs()))
}

#[test]
fn single_note_renders_and_finishes() {
    let handle = handle(SongId::Sequence(0));
    let estimate = handle.estimate_length(&RenderOptions::default()).unwrap();
    assert_eq!(estimate.reason, StopReason::Finished);
    // 48 ticks at 120 bpm, plus the release tail
    assert!(estimate.seconds() > 0.4 && estimate.seconds() < 3.0, "{}", estimate.seconds());

    let frames = handle.render_frames(&RenderOptions::default()).unwrap();
    assert_eq!(frames.len() as u64, estimate.frames + estimate.fade_frames);
    assert!(peak(&frames) > 0.05);
    assert!(frames.iter().all(|f| f.left.is_finite() && f.right.is_finite()));
}

#[test]
fn looping_song_stops_after_requested_loops() {
    let handle = handle(SongId::Sequence(1));
    let one = handle.estimate_length(&RenderOptions { loops: 1, ..Default::default() }).unwrap();
    let three = handle.estimate_length(&RenderOptions { loops: 3, ..Default::default() }).unwrap();
    assert_eq!(one.reason, StopReason::Looped);
    assert_eq!(three.reason, StopReason::Looped);
    assert!(three.ticks > 2 * one.ticks, "{} vs {}", three.ticks, one.ticks);
    assert_eq!(one.fade_frames, 2 * 32768);
}

#[test]
fn fixed_seed_renders_identically() {
    let handle = handle(SongId::Sequence(2));
    let options = RenderOptions { loops: 6, ..Default::default() };
    let a = handle.render_frames(&options).unwrap();
    let b = handle.render_frames(&options).unwrap();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn muted_tracks_render_silence() {
    let mut handle = handle(SongId::Sequence(0));
    handle.set_track_enabled(0, false);
    let frames = handle.render_frames(&RenderOptions::default()).unwrap();
    assert!(!frames.is_empty());
    assert_eq!(peak(&frames), 0.0);

    handle.set_track_enabled(0, true);
    handle.set_master_gain(0.5);
    let half = handle.render_frames(&RenderOptions::default()).unwrap();
    handle.set_master_gain(1.0);
    let full = handle.render_frames(&RenderOptions::default()).unwrap();
    assert!((peak(&half) * 2.0 - peak(&full)).abs() < 1e-4);
}

#[test]
fn archived_sequence_uses_its_own_start() {
    let handle = handle(SongId::Archive { archive: 0, sub: 1 });
    let frames = handle.render_frames(&RenderOptions::default()).unwrap();
    // program 1 plays the negative wave
    assert!(frames.iter().any(|f| f.left < -0.05));
    assert!(frames.iter().all(|f| f.left <= 0.0));

    let silent = self::handle(SongId::Archive { archive: 0, sub: 0 });
    let estimate = silent.estimate_length(&RenderOptions::default()).unwrap();
    assert_eq!(estimate.reason, StopReason::Finished);
}

#[test]
fn wav_export_has_header_and_all_frames() {
    let handle = handle(SongId::Sequence(0));
    let frames = handle.render_frames(&RenderOptions::default()).unwrap();
    let wav = handle.render_to_wav(&RenderOptions::default()).unwrap();
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");
    assert_eq!(wav.len(), 44 + frames.len() * 4);
}

#[test]
fn archive_embedded_in_rom_is_found() {
    let mut rom = vec![0u8; 0x200];
    rom.extend_from_slice(&archive());
    rom.extend_from_slice(&[0xAA; 64]);
    let mut handle = EngineHandle::default();
    let archive = handle.load_archive(rom).unwrap();
    assert_eq!(archive.sequence_id("SEQ_LOOP"), Some(1));
}

#[test]
fn operations_without_a_song_fail_cleanly() {
    let mut handle = EngineHandle::default();
    assert!(matches!(handle.select(SongId::Sequence(0)), Err(MasterError::NoArchive)));
    assert!(matches!(handle.load_archive(vec![0u8; 128]), Err(MasterError::NoSoundArchive)));

    handle.load_archive(archive()).unwrap();
    assert!(matches!(handle.render_frames(&RenderOptions::default()), Err(MasterError::NoSongLoaded)));
    assert!(matches!(handle.estimate_length(&RenderOptions::default()), Err(MasterError::NoSongLoaded)));
    assert!(matches!(handle.play(), Err(MasterError::NoSongLoaded)));
    assert!(matches!(handle.select(SongId::Sequence(40)), Err(MasterError::Format(_))));
    assert!(!handle.is_playing());
}

#[test]
fn transport_state_without_a_device() {
    let mut handle = handle(SongId::Sequence(0));
    handle.pause();
    assert!(handle.is_paused());
    handle.resume();
    assert!(!handle.is_paused());
    handle.stop();
    assert!(!handle.is_playing());
    assert_eq!(handle.telemetry().ticks, 0);

    handle.set_seed(Some(99));
    assert_eq!(handle.config().rng_seed, Some(99));
    handle.set_tuning(ns_master::Tuning::EqualTemperament);
    assert_eq!(handle.config().tuning, ns_master::Tuning::EqualTemperament);
    assert_eq!(handle.selected(), Some(SongId::Sequence(0)));
    assert!(matches!(handle.play_stream(7), Err(MasterError::Format(_))));
}

#[test]
fn carry_over_lends_wave_archives_to_the_next_song() {
    let mut carry = EngineHandle::new(EngineConfig { carry_over_wave_archives: true, ..Default::default() });
    carry.load_archive(archive()).unwrap();
    carry.select(SongId::Sequence(0)).unwrap();
    carry.select(SongId::Sequence(3)).unwrap();
    let frames = carry.render_frames(&RenderOptions::default()).unwrap();
    assert!(peak(&frames) > 0.05);

    let plain = handle(SongId::Sequence(3));
    let frames = plain.render_frames(&RenderOptions::default()).unwrap();
    assert_eq!(peak(&frames), 0.0);
}
