//! Events emitted by sequence tracks.

/// What a message reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// params: note, velocity, duration, previous portamento key
    PlayNote,
    /// params: program
    InstrumentChange,
    /// params: source pc, destination pc
    Jump,
    TrackEnded,
    /// params: volume, expression
    VolumeChange,
    /// params: pan (0..=128)
    PanChange,
    /// params: bend, bend range
    PitchBend,
    /// params: tie flag (0 or 1)
    TieChange,
}

/// An immutable event record produced by one track instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    /// Originating track (0-15)
    pub track: u8,
    pub params: [i32; 4],
    /// Sequence tick the consumer observed the message at
    pub timestamp: u64,
}

impl Message {
    /// Create a message with no parameters.
    pub fn new(kind: MessageKind, track: u8) -> Self {
        Self {
            kind,
            track,
            params: [0; 4],
            timestamp: 0,
        }
    }

    /// Create a message with parameters.
    pub fn with_params(kind: MessageKind, track: u8, params: [i32; 4]) -> Self {
        Self {
            kind,
            track,
            params,
            timestamp: 0,
        }
    }
}
