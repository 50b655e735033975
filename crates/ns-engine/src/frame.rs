//! Audio frame type.

/// A stereo audio frame (normalized float).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: f32) -> Self {
        Self { left: value, right: value }
    }

    /// Mix another frame into this one.
    pub fn mix(&mut self, other: Frame) {
        self.left += other.left;
        self.right += other.right;
    }

    /// Multiply both channels by `gain`.
    pub fn scale(self, gain: f32) -> Self {
        Self { left: self.left * gain, right: self.right * gain }
    }

    /// Clamp both channels to `[-limit, limit]`.
    pub fn clamp(self, limit: f32) -> Self {
        Self {
            left: self.left.clamp(-limit, limit),
            right: self.right.clamp(-limit, limit),
        }
    }

    /// Decay a running peak by `decay`, then raise it to this frame's level.
    pub fn track_peak(&self, peak: &mut Frame, decay: f32) {
        peak.left = (peak.left * decay).max(libm::fabsf(self.left));
        peak.right = (peak.right * decay).max(libm::fabsf(self.right));
    }

    /// Convert to signed 16-bit PCM, clamping out-of-range values.
    pub fn to_i16(self) -> (i16, i16) {
        let conv = |v: f32| (v.clamp(-1.0, 1.0) * 32767.0) as i16;
        (conv(self.left), conv(self.right))
    }
}
