//! Core types for the nitrosynth DS sound engine.
//!
//! This crate defines the data model shared by the container parser,
//! the sequence engine and the playback layer: decoded samples,
//! instrument banks, sequence messages and the hardware lookup tables.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod bytes;
mod envelope;
mod instrument;
mod message;
mod sample;
mod song;
mod stream;
pub mod tables;

pub use bytes::SharedBytes;
pub use envelope::{attack_coefficient, decay_coefficient, sustain_level, Adsr, ENVELOPE_FLOOR, NO_OVERRIDE};
pub use instrument::{
    InstrumentBank, InstrumentRecord, InstrumentRegion, RegionError, RegionKind, RECORD_DRUMSET,
    RECORD_EMPTY, RECORD_MULTI_SAMPLE, RECORD_PSG_NOISE, RECORD_PSG_PULSE, RECORD_SINGLE_SAMPLE,
};
pub use message::{Message, MessageKind};
pub use sample::{psg_square, Sample, SampleKey, ARM7_CLOCK};
pub use song::{SongData, SongId, WaveArchive, WAVE_ARCHIVE_SLOTS};
pub use stream::Stream;
