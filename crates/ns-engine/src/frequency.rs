//! Note-to-frequency conversion for the oscillators.
//!
//! Two models: a floating-point Hz curve (equal temperament or
//! Pythagorean "pure" tuning) and the console's fixed-point timer
//! conversion, which reproduces the hardware's pitch quantization.

use ns_ir::tables::PITCH_TABLE;

use crate::config::Tuning;

/// Entries per octave in the BIOS pitch table (64 steps per semitone).
const PITCH_STEPS: i64 = 768;

/// Shortest and longest channel timer periods.
const TIMER_MIN: u64 = 0x10;
const TIMER_MAX: u64 = 0xFFFF;

const PYTHAGOREAN_RATIOS: [f64; 12] = [
    1.0,
    256.0 / 243.0,
    9.0 / 8.0,
    32.0 / 27.0,
    81.0 / 64.0,
    4.0 / 3.0,
    729.0 / 512.0,
    3.0 / 2.0,
    128.0 / 81.0,
    27.0 / 16.0,
    16.0 / 9.0,
    243.0 / 128.0,
];

/// Frequency in Hz of a (possibly fractional) MIDI note.
///
/// `Pure` tuning rounds the note, picks the Pythagorean ratio for its
/// degree above the tonic, and carries the rounding error as a pitch
/// offset on the root. Every other mode is equal-tempered A440.
pub fn midi_note_to_hz(note: f64, tuning: Tuning) -> f64 {
    match tuning {
        Tuning::Pure { tonic } => {
            let rounded = libm::floor(note + 0.5);
            let error = note - rounded;
            let relative = rounded as i64 - 69 - tonic as i64;
            let octave = relative.div_euclid(12);
            let degree = relative.rem_euclid(12) as usize;
            let root = 440.0 * libm::pow(2.0, (tonic as f64 + error) / 12.0 + octave as f64);
            root * PYTHAGOREAN_RATIOS[degree]
        }
        _ => 440.0 * libm::pow(2.0, (note - 69.0) / 12.0),
    }
}

/// Adjust a channel timer for a note offset, the way the sound driver does.
///
/// `note` is relative to the sample's base note and `finetune` is in
/// semitones (resolved to 1/64 steps). The result is clamped to
/// `[0x10, 0xFFFF]`; left shifts that would overflow saturate to 0xFFFF.
pub fn note_to_timer(timer: u32, note: i32, finetune: f64) -> u16 {
    let pitch = note as i64 * 64 + libm::floor(finetune * 64.0) as i64;
    let octave = (-pitch).div_euclid(PITCH_STEPS);
    let index = (-pitch).rem_euclid(PITCH_STEPS) as usize;

    let mut result = (PITCH_TABLE[index] as u64 + 0x10000) * timer as u64;
    let shift = octave - 16;
    if shift <= 0 {
        let shift = -shift;
        result = if shift >= 64 { 0 } else { result >> shift };
    } else if shift < 32 {
        if result & (u64::MAX << (32 - shift)) != 0 {
            return TIMER_MAX as u16;
        }
        result <<= shift;
    } else {
        return TIMER_MAX as u16;
    }

    result.clamp(TIMER_MIN, TIMER_MAX) as u16
}
