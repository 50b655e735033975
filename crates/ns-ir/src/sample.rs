//! Decoded sample data.

use alloc::vec::Vec;

slotmap::new_key_type! {
    /// Key for referencing samples in the controller's sample bank.
    pub struct SampleKey;
}

/// ARM7 bus clock in Hz. Hardware timers count at half this rate.
pub const ARM7_CLOCK: u32 = 33_513_982;

/// Largest accepted mismatch between the nominal and timer-derived rate.
const RATE_TOLERANCE: f64 = 44300.0 / 44100.0;

/// A decoded waveform in the range [-1, 1].
///
/// Immutable once built; voices refer to it by [`SampleKey`].
#[derive(Clone, Debug)]
pub struct Sample {
    /// Normalized sample data
    pub data: Vec<f32>,
    /// Sample rate used for playback (Hz)
    pub sample_rate: f64,
    /// Hardware timer register value
    pub timer: u32,
    /// Sample rate derived from `timer`
    pub derived_rate: f64,
    /// Whether playback wraps back to `loop_start`
    pub looping: bool,
    /// Loop start in samples
    pub loop_start: usize,
}

impl Sample {
    /// Build a sample from its header fields.
    ///
    /// A zero timer is synthesized from `sample_rate`. Otherwise the
    /// nominal rate is replaced by the timer-derived rate when the two
    /// disagree by more than 44300/44100.
    pub fn new(data: Vec<f32>, sample_rate: u32, timer: u16, looping: bool, loop_start: usize) -> Self {
        let nominal = sample_rate as f64;
        let half_clock = ARM7_CLOCK as f64 / 2.0;

        let (timer, derived_rate, sample_rate) = if timer == 0 {
            let timer = if sample_rate == 0 { 0 } else { (half_clock / nominal) as u32 };
            (timer, nominal, nominal)
        } else {
            let derived = half_clock / timer as f64;
            let ratio = derived / nominal;
            let rate = if ratio > RATE_TOLERANCE || ratio < 1.0 / RATE_TOLERANCE {
                derived
            } else {
                nominal
            };
            (timer as u32, derived, rate)
        };

        Self {
            data,
            sample_rate,
            timer,
            derived_rate,
            looping,
            loop_start,
        }
    }

    /// Number of sample frames.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sample has no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample value at integer position `t`.
    ///
    /// Looping samples wrap `(t - loop) mod (len - loop) + loop`; one-shot
    /// samples read silence past the end.
    pub fn value_at(&self, t: usize) -> f32 {
        let len = self.data.len();
        let mut t = t;
        if t >= len && self.looping && self.loop_start < len {
            let loop_len = len - self.loop_start;
            t = (t - self.loop_start) % loop_len + self.loop_start;
        }
        self.data.get(t).copied().unwrap_or(0.0)
    }
}

/// One of the eight PSG duty-cycle waveforms.
///
/// Duty `d` is high for `d + 1` of 8 steps; duty 7 is silent-low.
pub fn psg_square(duty: usize) -> Sample {
    let high = match duty {
        0..=6 => duty + 1,
        _ => 0,
    };
    let data = (0..8).map(|i| if i >= 8 - high { 1.0 } else { -1.0 }).collect();
    Sample::new(data, 8, 0, true, 0)
}
