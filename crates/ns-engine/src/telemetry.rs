//! Read-only playback snapshot for meters and length estimation.

use crate::error::EngineError;
use crate::frame::Frame;
use crate::sequence::{SequenceStatus, TRACK_COUNT};

/// Per-sample decay applied to peak meters.
pub const PEAK_DECAY: f32 = 0.9999;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Telemetry {
    /// Bit `n` set while key `n` sounds on that track
    pub notes_on: [u128; TRACK_COUNT],
    pub track_peaks: [Frame; TRACK_COUNT],
    pub master_peak: Frame,
    /// Sequence ticks since the song started
    pub ticks: u64,
    /// Jumps and infinite loop ends taken
    pub jumps: u32,
    pub status: SequenceStatus,
    pub warnings: u32,
    pub fault: Option<EngineError>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            notes_on: [0; TRACK_COUNT],
            track_peaks: [Frame::silence(); TRACK_COUNT],
            master_peak: Frame::silence(),
            ticks: 0,
            jumps: 0,
            status: SequenceStatus::Normal,
            warnings: 0,
            fault: None,
        }
    }
}

impl Telemetry {
    /// Whether key `note` is sounding on `track`.
    pub fn note_on(&self, track: usize, note: u8) -> bool {
        self.notes_on
            .get(track)
            .is_some_and(|bits| note < 128 && bits & (1u128 << note) != 0)
    }
}
