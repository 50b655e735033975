//! Hardware ADSR coefficient math.

use crate::tables::{ATTACK_COEFF_TABLE, DECIBEL_SQUARE_TABLE};

/// Envelope timer floor: the level at which a releasing voice is silent.
pub const ENVELOPE_FLOOR: i32 = -92544;

/// Raw rate byte meaning "no override" in a track's ADSR registers.
pub const NO_OVERRIDE: u8 = 0xFF;

/// Attack multiplier for a raw attack rate (0..=127).
pub fn attack_coefficient(attack: u8) -> i32 {
    if attack < 109 {
        255 - attack as i32
    } else {
        ATTACK_COEFF_TABLE[(127 - attack.min(127)) as usize] as i32
    }
}

/// Per-tick decrement for a raw decay or release rate (0..=127).
pub fn decay_coefficient(rate: u8) -> i32 {
    match rate {
        127..=u8::MAX => 0xFFFF,
        126 => 0x3C00,
        0..=49 => (rate as i32 * 2 + 1) & 0xFFFF,
        _ => (0x1E00 / (126 - rate as i32)) & 0xFFFF,
    }
}

/// Envelope timer level held during sustain.
pub fn sustain_level(sustain: u8) -> i32 {
    (DECIBEL_SQUARE_TABLE[sustain.min(127) as usize] as i32) << 7
}

/// Raw envelope bytes plus their precomputed coefficients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Adsr {
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
    pub attack_coeff: i32,
    pub decay_coeff: i32,
    pub sustain_level: i32,
    pub release_coeff: i32,
}

impl Adsr {
    pub fn new(attack: u8, decay: u8, sustain: u8, release: u8) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
            attack_coeff: attack_coefficient(attack),
            decay_coeff: decay_coefficient(decay),
            sustain_level: sustain_level(sustain),
            release_coeff: decay_coefficient(release),
        }
    }

    /// Replace each component whose override byte is not [`NO_OVERRIDE`].
    pub fn with_overrides(mut self, attack: u8, decay: u8, sustain: u8, release: u8) -> Self {
        if attack != NO_OVERRIDE {
            self.attack = attack;
            self.attack_coeff = attack_coefficient(attack);
        }
        if decay != NO_OVERRIDE {
            self.decay = decay;
            self.decay_coeff = decay_coefficient(decay);
        }
        if sustain != NO_OVERRIDE {
            self.sustain = sustain;
            self.sustain_level = sustain_level(sustain);
        }
        if release != NO_OVERRIDE {
            self.release = release;
            self.release_coeff = decay_coefficient(release);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_switches_to_table_at_109() {
        assert_eq!(attack_coefficient(0), 255);
        assert_eq!(attack_coefficient(108), 147);
        assert_eq!(attack_coefficient(109), 143);
        assert_eq!(attack_coefficient(126), 1);
        assert_eq!(attack_coefficient(127), 0);
    }

    #[test]
    fn decay_coefficient_regions() {
        assert_eq!(decay_coefficient(127), 0xFFFF);
        assert_eq!(decay_coefficient(126), 0x3C00);
        assert_eq!(decay_coefficient(0), 1);
        assert_eq!(decay_coefficient(49), 99);
        assert_eq!(decay_coefficient(50), 0x1E00 / 76);
        assert_eq!(decay_coefficient(125), 0x1E00);
    }

    #[test]
    fn sustain_level_is_scaled_decibels() {
        assert_eq!(sustain_level(127), 0);
        assert_eq!(sustain_level(0), -32768 << 7);
        assert_eq!(sustain_level(64), -119 << 7);
    }

    #[test]
    fn overrides_only_replace_set_components() {
        let base = Adsr::new(127, 100, 100, 100);
        let over = base.with_overrides(0, NO_OVERRIDE, NO_OVERRIDE, 127);
        assert_eq!(over.attack_coeff, 255);
        assert_eq!(over.decay_coeff, base.decay_coeff);
        assert_eq!(over.sustain_level, base.sustain_level);
        assert_eq!(over.release_coeff, 0xFFFF);
    }
}
