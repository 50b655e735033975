//! Engine fault type.

/// Resource exhaustion inside the sequence VM. Any of these aborts the
/// current song.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("track {track}: call stack overflow")]
    StackOverflow { track: u8 },
    #[error("track {track}: loop stack overflow")]
    LoopStackOverflow { track: u8 },
    #[error("sequence message buffer overflow")]
    MessageBufferOverflow,
    /// A track executed too many instructions without resting.
    #[error("track {track} never rests")]
    RunawayTrack { track: u8 },
}
