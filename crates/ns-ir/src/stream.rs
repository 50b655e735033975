//! Decoded STRM audio.

use alloc::vec::Vec;

/// A pre-rendered stereo stream.
///
/// Mono streams carry the same data in both channels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stream {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    /// Playback rate in Hz
    pub sample_rate: u32,
    /// Channel count declared by the file
    pub channels: u8,
    pub looping: bool,
    /// Loop start in samples
    pub loop_point: usize,
}

impl Stream {
    /// Number of sample frames.
    pub fn len(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
