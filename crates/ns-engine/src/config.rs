//! Engine configuration.

/// Pitch model used by the oscillators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tuning {
    /// Fixed-point timer conversion through the BIOS pitch table.
    /// PSG voices still use equal temperament.
    #[default]
    HardwareAccurate,
    /// `440 * 2^((note - 69) / 12)`
    EqualTemperament,
    /// Pythagorean ratios relative to a tonic, in semitones above A.
    Pure { tonic: i32 },
}

/// Final stereo mixing strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MixMode {
    /// Clamp the sum to +-2, halve it, and glide pitch bends.
    #[default]
    Accurate,
    /// Plain sum with immediate pitch bends.
    Direct,
}

/// Construction-time settings for a [`Controller`](crate::Controller).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Output rate in Hz
    pub sample_rate: u32,
    pub tuning: Tuning,
    pub mixing: MixMode,
    /// Initial sequence RNG state. `None` leaves the choice to the host;
    /// the engine itself falls back to 0.
    pub rng_seed: Option<u32>,
    /// Let a new song reuse wave-archive slots its own bank leaves empty.
    /// Hosts apply it with [`SongData::carry_over_wave_archives`](ns_ir::SongData::carry_over_wave_archives).
    pub carry_over_wave_archives: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 32768,
            tuning: Tuning::default(),
            mixing: MixMode::default(),
            rng_seed: None,
            carry_over_wave_archives: false,
        }
    }
}
