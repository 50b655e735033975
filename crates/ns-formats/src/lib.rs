//! Format parsers for nitrosynth.
//!
//! Parses SDAT sound archives (optionally LZSS compressed) and the SSEQ,
//! SSAR, SBNK, SWAR and STRM files inside them into the IR.

extern crate alloc;

mod codec;
mod error;
pub mod lzss;
mod reader;
mod sdat;

pub use codec::{decode_adpcm, decode_adpcm_blocks, decode_pcm16, decode_pcm8, WaveType};
pub use error::{EntryKind, FormatError};
pub use reader::ByteReader;
pub use sdat::{
    decode_wave_archive, find_sound_archives, parse_bank, ArchiveEntry, ArchiveInfo, BankInfo,
    BlockRange, SdatHeader, SequenceInfo, SoundArchive, StreamInfo, SymbolTable, Symbols,
    WaveArchiveInfo, NO_WAVE_ARCHIVE, SDAT_HEADER_SIZE,
};
