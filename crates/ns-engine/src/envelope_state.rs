//! Runtime ADSR envelope.
//!
//! The timer is a negative fixed-point attenuation: 0 is full level and
//! [`ENVELOPE_FLOOR`] is silence. It feeds the volume law via `>> 7`.

use ns_ir::{Adsr, ENVELOPE_FLOOR};

/// Envelope phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdsrState {
    #[default]
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Envelope state for one note.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub state: AdsrState,
    pub timer: i32,
    pub attack_coeff: i32,
    pub decay_coeff: i32,
    pub sustain_level: i32,
    pub release_coeff: i32,
}

impl Envelope {
    /// Start in Attack at the floor.
    pub fn new(adsr: &Adsr) -> Self {
        Self {
            state: AdsrState::Attack,
            timer: ENVELOPE_FLOOR,
            attack_coeff: adsr.attack_coeff,
            decay_coeff: adsr.decay_coeff,
            sustain_level: adsr.sustain_level,
            release_coeff: adsr.release_coeff,
        }
    }

    /// Swap in new coefficients without touching the phase or timer.
    pub fn set_rates(&mut self, adsr: &Adsr) {
        self.attack_coeff = adsr.attack_coeff;
        self.decay_coeff = adsr.decay_coeff;
        self.sustain_level = adsr.sustain_level;
        self.release_coeff = adsr.release_coeff;
    }

    /// Enter Release. Returns false if already releasing.
    pub fn release(&mut self) -> bool {
        if self.state == AdsrState::Release {
            return false;
        }
        self.state = AdsrState::Release;
        true
    }

    pub fn is_releasing(&self) -> bool {
        self.state == AdsrState::Release
    }

    /// Step one engine tick. Returns false once a released envelope has
    /// reached the floor and the voice should be cut.
    pub fn advance(&mut self) -> bool {
        match self.state {
            AdsrState::Attack => {
                self.timer = -((-self.attack_coeff * self.timer) >> 8);
                if self.timer == 0 {
                    self.state = AdsrState::Decay;
                }
            }
            AdsrState::Decay => {
                self.timer -= self.decay_coeff;
                if self.timer <= self.sustain_level {
                    self.timer = self.sustain_level;
                    self.state = AdsrState::Sustain;
                }
            }
            AdsrState::Sustain => {}
            AdsrState::Release => {
                if self.timer <= ENVELOPE_FLOOR {
                    return false;
                }
                self.timer -= self.release_coeff;
            }
        }
        true
    }
}
