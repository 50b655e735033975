//! Error type for container and codec parsing.

use core::fmt;

/// Category of an INFO-table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Sequence,
    SequenceArchive,
    ArchiveSequence,
    Bank,
    WaveArchive,
    Stream,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Sequence => "SSEQ",
            EntryKind::SequenceArchive => "SSAR",
            EntryKind::ArchiveSequence => "SSAR sub-sequence",
            EntryKind::Bank => "SBNK",
            EntryKind::WaveArchive => "SWAR",
            EntryKind::Stream => "STRM",
        };
        f.write_str(name)
    }
}

/// Error type for format parsing.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Header fields are inconsistent
    #[error("invalid header")]
    InvalidHeader,
    /// Magic, byte order or version mismatch
    #[error("bad magic")]
    BadMagic,
    /// Header size field is not 64
    #[error("header size is {0}, expected 64")]
    HeaderSize(u16),
    /// A read ran past the end of its view
    #[error("unexpected end of data reading {len} bytes at {offset:#x}")]
    UnexpectedEof { offset: usize, len: usize },
    /// Compression tag other than LZSS
    #[error("unknown compression type {0:#04x}")]
    UnknownCompression(u8),
    /// LZSS back-reference points before the start of the output
    #[error("LZSS back-reference {distance} at output {position} is out of range")]
    BadBackReference { position: usize, distance: usize },
    /// Wave type other than PCM8, PCM16 or IMA-ADPCM
    #[error("unknown wave type {0}")]
    UnknownWaveType(u8),
    /// INFO table has no record for this id
    #[error("no {kind} entry {id}")]
    MissingEntry { kind: EntryKind, id: u16 },
    /// FAT has no file for this id
    #[error("FAT has no file {0}")]
    MissingFile(u16),
    /// A fixed-layout header failed to parse
    #[error(transparent)]
    Binary(#[from] binrw::Error),
}
