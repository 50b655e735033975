//! Hardware volume and pan laws.
//!
//! Volume is accumulated in decibel-square units and converted through
//! the BIOS volume table; the coarse shifts by band reproduce the
//! channel's volume divider.

use ns_ir::tables::{DECIBEL_SQUARE_TABLE, VOLUME_TABLE};

/// Quietest representable channel level.
const VOLUME_DB_MIN: i32 = -723;

/// Channel amplitude in `[0, 1]`.
///
/// Sums the velocity's decibel value, the envelope timer (`>> 7`) and
/// the track decay. The LFO contribution only applies when the sum is
/// above the -0x8000 silence marker.
pub fn channel_volume(velocity: u8, envelope: i32, decay: i32, lfo: i32) -> f32 {
    let mut db = DECIBEL_SQUARE_TABLE[velocity.min(127) as usize] as i32;
    db += envelope >> 7;
    db += decay;
    if db > -0x8000 {
        db += lfo;
    }
    let db = db.clamp(VOLUME_DB_MIN, 0);

    let raw = VOLUME_TABLE[(db - VOLUME_DB_MIN) as usize] as f32;
    let divided = if db < -240 {
        raw / 16.0
    } else if db < -120 {
        raw / 4.0
    } else if db < -60 {
        raw / 2.0
    } else {
        raw
    };
    divided / 127.0
}

/// Pan position in `[0, 1]` from a 0..=128 track pan plus LFO offset.
pub fn channel_pan(pan: i32, lfo: i32) -> f32 {
    ((pan + lfo) as f32 / 128.0).clamp(0.0, 1.0)
}

/// Track attenuation in decibel units from volume and expression.
pub fn channel_decay(volume: u8, expression: u8) -> i32 {
    let decay = DECIBEL_SQUARE_TABLE[volume.min(127) as usize] as i32
        + DECIBEL_SQUARE_TABLE[expression.min(127) as usize] as i32;
    decay.max(-0x8000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_velocity_full_envelope_is_unity() {
        assert_eq!(channel_volume(127, 0, 0, 0), 1.0);
    }

    #[test]
    fn silence_floor() {
        assert_eq!(channel_volume(0, 0, 0, 0), 0.0);
        assert_eq!(channel_volume(127, ns_ir::ENVELOPE_FLOOR, 0, 0), 0.0);
    }

    #[test]
    fn quieter_inputs_never_get_louder() {
        let mut last = f32::MAX;
        for velocity in (0..=127u8).rev() {
            let v = channel_volume(velocity, 0, 0, 0);
            assert!(v <= last, "velocity {} louder than {}", velocity, velocity + 1);
            last = v;
        }
    }

    #[test]
    fn lfo_ignored_at_silence_marker() {
        let silent_decay = channel_decay(0, 127);
        assert_eq!(silent_decay, -0x8000);
        assert_eq!(channel_volume(127, 0, silent_decay, 1000), 0.0);
        assert!(channel_volume(127, 0, -200, 100) > channel_volume(127, 0, -200, 0));
    }

    #[test]
    fn pan_is_clamped() {
        assert_eq!(channel_pan(64, 0), 0.5);
        assert_eq!(channel_pan(128, 64), 1.0);
        assert_eq!(channel_pan(0, -10), 0.0);
    }

    #[test]
    fn decay_sums_volume_and_expression() {
        assert_eq!(channel_decay(127, 127), 0);
        assert_eq!(channel_decay(64, 127), -119);
        assert_eq!(channel_decay(0, 0), -0x8000);
    }
}
