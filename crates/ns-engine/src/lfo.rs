//! Per-note low-frequency oscillator.

use ns_ir::tables::LFO_SIN_TABLE;

/// What the LFO modulates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LfoTarget {
    Pitch,
    Volume,
    Pan,
    /// Unrecognized type byte: the value is computed but applied nowhere.
    Other(u8),
}

impl From<u8> for LfoTarget {
    fn from(value: u8) -> Self {
        match value {
            0 => LfoTarget::Pitch,
            1 => LfoTarget::Volume,
            2 => LfoTarget::Pan,
            other => LfoTarget::Other(other),
        }
    }
}

/// Track-level LFO settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LfoParams {
    pub target: LfoTarget,
    pub depth: u8,
    pub speed: u8,
    pub range: u8,
    /// Ticks before modulation starts
    pub delay: u16,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self { target: LfoTarget::Pitch, depth: 0, speed: 16, range: 1, delay: 0 }
    }
}

/// Sine lookup over a 128-step period built from a quarter-wave table.
pub fn sin_idx(x: u32) -> i32 {
    let x = (x & 0x7F) as usize;
    match x {
        0x00..=0x1F => LFO_SIN_TABLE[x] as i32,
        0x20..=0x3F => LFO_SIN_TABLE[0x40 - x] as i32,
        0x40..=0x5F => -(LFO_SIN_TABLE[x - 0x40] as i32),
        _ => -(LFO_SIN_TABLE[0x20 - (x - 0x60)] as i32),
    }
}

/// Phase state of one note's LFO.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lfo {
    /// 8.8 fixed-point phase; the integer part stays below 0x80
    counter: u32,
    /// Gates the output value
    value_delay: u16,
    /// Gates phase advance
    phase_delay: u16,
}

impl Lfo {
    /// Compute this tick's modulation value, then step the phase.
    ///
    /// Volume output is in decibel units; pitch and pan outputs are in
    /// 1/64 steps.
    pub fn advance(&mut self, params: &LfoParams) -> i32 {
        let mut value: i64 = 0;
        if params.depth != 0 {
            let gated = self.value_delay < params.delay;
            self.value_delay = self.value_delay.saturating_add(1);
            if !gated {
                value = sin_idx(self.counter >> 8) as i64 * params.depth as i64 * params.range as i64;
            }
        }

        if value != 0 {
            value = match params.target {
                LfoTarget::Volume => value * 60,
                LfoTarget::Pitch | LfoTarget::Pan => value << 6,
                LfoTarget::Other(_) => value,
            };
            value >>= 14;
        }

        if self.phase_delay < params.delay {
            self.phase_delay += 1;
        } else {
            let step = self.counter + ((params.speed as u32) << 6);
            let whole = (step >> 8) % 0x80;
            self.counter = (step & 0xFF) | (whole << 8);
        }

        value as i32
    }

    pub fn phase(&self) -> u32 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_quadrants_mirror_and_negate() {
        assert_eq!(sin_idx(0), 0);
        assert_eq!(sin_idx(0x20), 127);
        assert_eq!(sin_idx(0x10), sin_idx(0x30));
        assert_eq!(sin_idx(0x50), -sin_idx(0x10));
        assert_eq!(sin_idx(0x70), -sin_idx(0x30));
        assert_eq!(sin_idx(0x60), -127);
    }

    #[test]
    fn zero_depth_is_silent_but_phase_moves() {
        let mut lfo = Lfo::default();
        let params = LfoParams::default();
        assert_eq!(lfo.advance(&params), 0);
        assert_eq!(lfo.phase(), 16 << 6);
    }

    #[test]
    fn delay_holds_value_and_phase() {
        let params = LfoParams { depth: 127, delay: 2, speed: 64, ..Default::default() };
        let mut lfo = Lfo::default();
        assert_eq!(lfo.advance(&params), 0);
        assert_eq!(lfo.advance(&params), 0);
        assert_eq!(lfo.phase(), 0);
        lfo.advance(&params);
        assert_eq!(lfo.phase(), 64 << 6);
    }

    #[test]
    fn pitch_value_is_scaled_sine() {
        let params = LfoParams { depth: 128, range: 1, speed: 0x80, ..Default::default() };
        let mut lfo = Lfo::default();
        // phase index advances by 0x20 per tick at this speed
        assert_eq!(lfo.advance(&params), 0);
        assert_eq!(lfo.advance(&params), (127 * 128) << 6 >> 14);
    }

    #[test]
    fn volume_value_uses_decibel_scale() {
        let params = LfoParams { target: LfoTarget::Volume, depth: 128, range: 1, speed: 0x80, delay: 0 };
        let mut lfo = Lfo::default();
        lfo.advance(&params);
        assert_eq!(lfo.advance(&params), (127 * 128 * 60) >> 14);
    }

    #[test]
    fn phase_wraps_within_period() {
        let params = LfoParams { speed: 0xFF, ..Default::default() };
        let mut lfo = Lfo::default();
        for _ in 0..1000 {
            lfo.advance(&params);
            assert!(lfo.phase() >> 8 < 0x80);
        }
    }
}
