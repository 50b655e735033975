//! Sequence VM and voice engine for nitrosynth.
//!
//! [`Sequence`] interprets SSEQ bytecode on 16 tracks and emits
//! [`Message`](ns_ir::Message)s; [`Controller`] turns those into voices,
//! runs their envelopes, LFOs and sweeps, and mixes stereo output.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod config;
mod controller;
mod envelope_state;
mod error;
mod frame;
mod frequency;
mod lfo;
mod note;
pub mod sequence;
mod stream_player;
mod telemetry;
mod voice;
mod voice_pool;
mod volume;

pub use config::{EngineConfig, MixMode, Tuning};
pub use controller::{Controller, MAX_NOTES};
pub use envelope_state::{AdsrState, Envelope};
pub use error::EngineError;
pub use frame::Frame;
pub use frequency::{midi_note_to_hz, note_to_timer};
pub use lfo::{sin_idx, Lfo, LfoParams, LfoTarget};
pub use note::{ActiveNote, NoteId};
pub use sequence::{MessageHandler, Sequence, SequenceStatus, SequenceTrack, TRACK_COUNT};
pub use stream_player::StreamPlayer;
pub use telemetry::{Telemetry, PEAK_DECAY};
pub use voice::{noise_step, Voice, NOISE_SEED};
pub use voice_pool::{VoiceId, VoicePool, VOICES_PER_TRACK};
pub use volume::{channel_decay, channel_pan, channel_volume};
