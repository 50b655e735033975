//! Error type for the control surface.

use ns_audio::AudioError;
use ns_engine::EngineError;
use ns_formats::FormatError;

#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    /// The input holds no parseable sound archive
    #[error("no sound archive found")]
    NoSoundArchive,
    /// An operation needs an archive but none is loaded
    #[error("no archive loaded")]
    NoArchive,
    /// Playback or rendering was requested before selecting a song
    #[error("no song loaded")]
    NoSongLoaded,
}
