//! Voice: the oscillator behind one hardware channel.

use ns_ir::{RegionKind, Sample, SampleKey, ARM7_CLOCK};

use crate::config::Tuning;
use crate::frequency::{midi_note_to_hz, note_to_timer};
use crate::note::NoteId;

/// Noise shift register seed.
pub const NOISE_SEED: u16 = 0x7FFF;

/// Step the PSG noise shift register, returning the output level.
pub fn noise_step(state: &mut u16) -> f32 {
    if *state & 1 != 0 {
        *state = (*state >> 1) ^ 0x6000;
        1.0
    } else {
        *state >>= 1;
        -1.0
    }
}

/// A single channel producing audio from a sample, square or noise.
#[derive(Clone, Debug)]
pub struct Voice {
    pub kind: RegionKind,
    /// Sample or square table in the controller's bank; unused for noise
    pub sample_key: Option<SampleKey>,
    pub playing: bool,
    /// Note currently owning this voice
    pub note_id: NoteId,
    /// Linear channel gain
    pub volume: f32,
    /// Last produced value
    pub output: f32,
    /// Note relative to the region's base note (PSG: absolute)
    pub midi_note: i32,
    /// Track pitch bend in semitones
    pub finetune: f64,
    /// Sweep and pitch-LFO offset in semitones
    pub finetune_lfo: f64,
    pub frequency: f64,
    freq_ratio: f64,
    /// Position in sample frames
    pub phase: f64,
    noise_state: u16,
    sample_timer: u32,
    sample_rate: f64,
    derived_rate: f64,
    sample_len: usize,
    looping: bool,
    /// Frequency the sample plays back at unchanged
    reference_hz: f64,
    out_rate: f64,
    tuning: Tuning,
}

impl Voice {
    /// Create an idle voice rendering at `out_rate` Hz.
    pub fn new(out_rate: u32, tuning: Tuning) -> Self {
        Self {
            kind: RegionKind::Sample,
            sample_key: None,
            playing: false,
            note_id: 0,
            volume: 0.0,
            output: 0.0,
            midi_note: 0,
            finetune: 0.0,
            finetune_lfo: 0.0,
            frequency: 0.0,
            freq_ratio: 0.0,
            phase: 0.0,
            noise_state: NOISE_SEED,
            sample_timer: 0,
            sample_rate: 0.0,
            derived_rate: 0.0,
            sample_len: 0,
            looping: false,
            reference_hz: 1.0,
            out_rate: out_rate.max(1) as f64,
            tuning,
        }
    }

    /// Begin playing `sample` (absent for noise) at `midi_note`.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &mut self,
        kind: RegionKind,
        sample_key: Option<SampleKey>,
        sample: Option<&Sample>,
        midi_note: i32,
        finetune: f64,
        volume: f32,
        note_id: NoteId,
    ) {
        self.kind = kind;
        self.sample_key = sample_key;
        self.note_id = note_id;
        self.volume = volume;
        self.output = 0.0;
        self.phase = 0.0;
        self.noise_state = NOISE_SEED;
        self.finetune_lfo = 0.0;
        self.finetune = finetune;
        match sample {
            Some(sample) => {
                self.sample_timer = sample.timer;
                self.sample_rate = sample.sample_rate;
                self.derived_rate = sample.derived_rate;
                self.sample_len = sample.len();
                self.looping = sample.looping;
            }
            None => {
                self.sample_timer = 0;
                self.sample_rate = 0.0;
                self.derived_rate = 0.0;
                self.sample_len = 0;
                self.looping = true;
            }
        }
        self.reference_hz = match kind {
            RegionKind::Sample => midi_note_to_hz(0.0, self.tuning),
            _ => 1.0,
        };
        self.playing = true;
        self.set_note(midi_note);
    }

    /// Stop producing audio.
    pub fn cut(&mut self) {
        self.playing = false;
        self.output = 0.0;
    }

    /// Produce the next output value.
    pub fn advance(&mut self, sample: Option<&Sample>) -> f32 {
        if !self.playing {
            return 0.0;
        }
        match self.kind {
            RegionKind::PsgNoise => {
                self.phase += self.frequency * 8.0 / self.out_rate;
                while self.phase >= 1.0 {
                    self.output = noise_step(&mut self.noise_state) * self.volume;
                    self.phase -= 1.0;
                }
            }
            _ => {
                self.phase += self.freq_ratio * self.sample_rate / self.out_rate;
                let value = sample.map_or(0.0, |s| s.value_at(libm::floor(self.phase) as usize));
                self.output = value * self.volume;
            }
        }
        self.output
    }

    /// A one-shot sample has played past its last frame.
    pub fn has_ended(&self) -> bool {
        self.kind == RegionKind::Sample && !self.looping && self.phase > self.sample_len as f64
    }

    pub fn set_note(&mut self, midi_note: i32) {
        self.midi_note = midi_note;
        self.update_frequency();
    }

    /// Set the track pitch bend, in semitones.
    pub fn set_finetune(&mut self, semitones: f64) {
        self.finetune = semitones;
        self.update_frequency();
    }

    /// Set the per-note sweep/LFO offset, in semitones.
    pub fn set_finetune_lfo(&mut self, semitones: f64) {
        self.finetune_lfo = semitones;
        self.update_frequency();
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
        if self.kind == RegionKind::Sample {
            self.reference_hz = midi_note_to_hz(0.0, tuning);
        }
        self.update_frequency();
    }

    /// Recompute the playback rate from note, bend and offsets.
    ///
    /// Hardware-accurate tuning routes sample voices through the channel
    /// timer; squares and noise always use the Hz curve.
    pub fn update_frequency(&mut self) {
        let offset = self.finetune + self.finetune_lfo;
        if self.tuning == Tuning::HardwareAccurate && self.kind == RegionKind::Sample {
            let timer = note_to_timer(self.sample_timer, self.midi_note, offset).max(1);
            let rate = if self.derived_rate > 0.0 { self.derived_rate } else { 1.0 };
            self.frequency = ARM7_CLOCK as f64 / (2.0 * timer as f64) / rate;
            self.freq_ratio = self.frequency;
        } else {
            self.frequency = midi_note_to_hz(self.midi_note as f64 + offset, self.tuning);
            if self.kind != RegionKind::PsgNoise {
                self.freq_ratio = self.frequency / self.reference_hz;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn ramp() -> Sample {
        Sample::new((0..100).map(|i| i as f32 / 100.0).collect(), 32768, 0, false, 0)
    }

    #[test]
    fn noise_register_sequence() {
        let mut state = NOISE_SEED;
        let first: Vec<f32> = (0..3).map(|_| noise_step(&mut state)).collect();
        assert_eq!(first, vec![1.0, 1.0, 1.0]);
        let mut state = 0x0002;
        assert_eq!(noise_step(&mut state), -1.0);
        assert_eq!(state, 0x0001);
        assert_eq!(noise_step(&mut state), 1.0);
        assert_eq!(state, 0x6000);
    }

    #[test]
    fn base_note_plays_at_recorded_rate() {
        let sample = ramp();
        for tuning in [Tuning::HardwareAccurate, Tuning::EqualTemperament] {
            let mut voice = Voice::new(32768, tuning);
            voice.start(RegionKind::Sample, None, Some(&sample), 0, 0.0, 1.0, 1);
            for _ in 0..10 {
                voice.advance(Some(&sample));
            }
            assert!((voice.phase - 10.0).abs() < 0.05, "{:?}: {}", tuning, voice.phase);
        }
    }

    #[test]
    fn octave_up_doubles_speed() {
        let sample = ramp();
        let mut voice = Voice::new(32768, Tuning::EqualTemperament);
        voice.start(RegionKind::Sample, None, Some(&sample), 12, 0.0, 1.0, 1);
        voice.advance(Some(&sample));
        assert!((voice.phase - 2.0).abs() < 1e-9);
    }

    #[test]
    fn one_shot_ends_past_last_frame() {
        let sample = ramp();
        let mut voice = Voice::new(32768, Tuning::EqualTemperament);
        voice.start(RegionKind::Sample, None, Some(&sample), 0, 0.0, 1.0, 1);
        for _ in 0..100 {
            voice.advance(Some(&sample));
        }
        assert!(!voice.has_ended());
        voice.advance(Some(&sample));
        assert!(voice.has_ended());
        assert_eq!(voice.output, 0.0);
    }

    #[test]
    fn square_plays_eight_steps_per_cycle() {
        let square = ns_ir::psg_square(3);
        let mut voice = Voice::new(32768, Tuning::HardwareAccurate);
        // A4 above the PSG reference note
        voice.start(RegionKind::PsgPulse, None, Some(&square), 69, 0.0, 1.0, 1);
        assert!((voice.frequency - 440.0).abs() < 1e-9);
        voice.advance(Some(&square));
        assert!((voice.phase - 440.0 * 8.0 / 32768.0).abs() < 1e-9);
        assert!(!voice.has_ended());
    }

    #[test]
    fn noise_steps_at_eight_times_frequency() {
        let mut voice = Voice::new(32768, Tuning::EqualTemperament);
        // C8: just over one register step per output sample
        voice.start(RegionKind::PsgNoise, None, None, 108, 0.0, 0.5, 1);
        let out = voice.advance(None);
        assert_eq!(out, 0.5);
        assert!(voice.phase < 1.0);
    }

    #[test]
    fn finetune_raises_pitch() {
        let sample = ramp();
        let mut voice = Voice::new(32768, Tuning::EqualTemperament);
        voice.start(RegionKind::Sample, None, Some(&sample), 0, 0.0, 1.0, 1);
        let base = voice.frequency;
        voice.set_finetune(1.0);
        voice.set_finetune_lfo(1.0);
        let up = voice.frequency;
        voice.set_finetune(0.0);
        voice.set_finetune_lfo(0.0);
        assert!((up / base - libm::pow(2.0, 2.0 / 12.0)).abs() < 1e-9);
        assert_eq!(voice.frequency, base);
    }
}
