//! SDAT sound archives.
//!
//! A [`SoundArchive`] owns the archive bytes and hands out views into them.
//! Instrument banks are decoded once at parse time; wave archives and
//! streams are decoded on demand.

mod bank;
mod header;
mod info;
mod sequence_file;
mod stream;
mod symbols;
mod wave_archive;

use alloc::sync::Arc;
use alloc::vec::Vec;

use ns_ir::{InstrumentBank, SharedBytes, SongData, SongId, Stream, WaveArchive, WAVE_ARCHIVE_SLOTS};

use crate::error::EntryKind;
use crate::lzss::{self, LZSS_TAG};
use crate::reader::ByteReader;
use crate::FormatError;

pub use bank::parse_bank;
pub use header::{BlockRange, SdatHeader, SDAT_HEADER_SIZE};
pub use info::{ArchiveInfo, BankInfo, SequenceInfo, StreamInfo, WaveArchiveInfo, NO_WAVE_ARCHIVE};
pub use sequence_file::ArchiveEntry;
pub use symbols::{SymbolTable, Symbols};
pub use wave_archive::decode_wave_archive;

const SDAT_MAGIC: &[u8; 4] = b"SDAT";
const FAT_COUNT: usize = 0x08;
const FAT_ENTRIES: usize = 0x0C;
const FAT_ENTRY_SIZE: usize = 0x10;

/// Distance from an LZSS header to the magic of the archive it compresses.
const LZSS_MAGIC_DISTANCE: usize = 5;

/// A parsed SDAT.
#[derive(Clone, Debug)]
pub struct SoundArchive {
    raw: SharedBytes,
    header: SdatHeader,
    symbols: Symbols,
    info: info::InfoTables,
    /// File id -> (offset, size) relative to the archive start
    fat: Vec<BlockRange>,
    /// Decoded SBNKs, indexed by bank id
    banks: Vec<Option<InstrumentBank>>,
}

impl SoundArchive {
    /// Parse an archive, logging and discarding any error.
    pub fn parse(data: impl Into<SharedBytes>) -> Option<Self> {
        match Self::try_parse(data) {
            Ok(archive) => Some(archive),
            Err(e) => {
                log::debug!("rejecting SDAT: {}", e);
                None
            }
        }
    }

    /// Parse an archive that starts at offset 0 of `data`.
    pub fn try_parse(data: impl Into<SharedBytes>) -> Result<Self, FormatError> {
        let raw: SharedBytes = data.into();
        let header = SdatHeader::parse(&raw)?;
        log::debug!(
            "SDAT: {} bytes, {} blocks, SYMB {:?}, INFO {:?}, FAT {:?}, FILE {:?}",
            raw.len(),
            header.block_count,
            header.symb,
            header.info,
            header.fat,
            header.file
        );

        let r = ByteReader::new(&raw);
        let symbols = if header.symb.is_empty() {
            Symbols::default()
        } else {
            Symbols::parse(r.sub(header.symb.offset as usize, header.symb.size as usize)?)?
        };
        let info = info::InfoTables::parse(r.sub(header.info.offset as usize, header.info.size as usize)?)?;
        let fat = parse_fat(r.sub(header.fat.offset as usize, header.fat.size as usize)?)?;

        let mut archive = SoundArchive {
            raw,
            header,
            symbols,
            info,
            fat,
            banks: Vec::new(),
        };

        let mut banks = Vec::with_capacity(archive.info.banks.len());
        for (id, bank_info) in archive.info.banks.iter().enumerate() {
            let Some(bank_info) = bank_info else {
                banks.push(None);
                continue;
            };
            let file = archive
                .file(bank_info.file_id)
                .ok_or(FormatError::MissingFile(bank_info.file_id))?;
            log::trace!("decoding bank {}", id);
            banks.push(Some(parse_bank(&file)?));
        }
        archive.banks = banks;
        Ok(archive)
    }

    pub fn header(&self) -> &SdatHeader {
        &self.header
    }

    /// The archive bytes.
    pub fn raw(&self) -> &SharedBytes {
        &self.raw
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn sequence_name(&self, id: u16) -> Option<&str> {
        self.symbols.sequences.name(id)
    }

    pub fn sequence_id(&self, name: &str) -> Option<u16> {
        self.symbols.sequences.id(name)
    }

    pub fn archive_name(&self, id: u16) -> Option<&str> {
        self.symbols.archives.name(id)
    }

    pub fn archive_id(&self, name: &str) -> Option<u16> {
        self.symbols.archives.id(name)
    }

    pub fn archive_sequence_name(&self, archive: u16, sub: u16) -> Option<&str> {
        self.archive_sequence_table(archive)?.name(sub)
    }

    pub fn archive_sequence_id(&self, archive: u16, name: &str) -> Option<u16> {
        self.archive_sequence_table(archive)?.id(name)
    }

    fn archive_sequence_table(&self, archive: u16) -> Option<&SymbolTable> {
        self.symbols.archive_sequences.get(archive as usize)?.as_ref()
    }

    pub fn bank_name(&self, id: u16) -> Option<&str> {
        self.symbols.banks.name(id)
    }

    pub fn bank_id(&self, name: &str) -> Option<u16> {
        self.symbols.banks.id(name)
    }

    pub fn stream_name(&self, id: u16) -> Option<&str> {
        self.symbols.streams.name(id)
    }

    pub fn stream_id(&self, name: &str) -> Option<u16> {
        self.symbols.streams.id(name)
    }

    pub fn sequence_info(&self, id: u16) -> Option<&SequenceInfo> {
        self.info.sequences.get(id as usize)?.as_ref()
    }

    pub fn archive_info(&self, id: u16) -> Option<&ArchiveInfo> {
        self.info.archives.get(id as usize)?.as_ref()
    }

    pub fn bank_info(&self, id: u16) -> Option<&BankInfo> {
        self.info.banks.get(id as usize)?.as_ref()
    }

    pub fn wave_archive_info(&self, id: u16) -> Option<&WaveArchiveInfo> {
        self.info.wave_archives.get(id as usize)?.as_ref()
    }

    pub fn stream_info(&self, id: u16) -> Option<&StreamInfo> {
        self.info.streams.get(id as usize)?.as_ref()
    }

    /// Ids of every present SSEQ entry.
    pub fn sequence_ids(&self) -> impl Iterator<Item = u16> + '_ {
        present_ids(&self.info.sequences)
    }

    /// Ids of every present SSAR entry.
    pub fn archive_ids(&self) -> impl Iterator<Item = u16> + '_ {
        present_ids(&self.info.archives)
    }

    /// Ids of every present STRM entry.
    pub fn stream_ids(&self) -> impl Iterator<Item = u16> + '_ {
        present_ids(&self.info.streams)
    }

    /// Bytes of FAT file `id`, or `None` if absent or out of bounds.
    pub fn file(&self, id: u16) -> Option<SharedBytes> {
        let range = self.fat.get(id as usize)?;
        let file = self.raw.slice(range.offset as usize, range.size as usize);
        if file.is_none() {
            log::warn!("FAT file {} ({:?}) lies outside the archive", id, range);
        }
        file
    }

    pub fn file_count(&self) -> usize {
        self.fat.len()
    }

    /// The decoded SBNK for bank `id`.
    pub fn instrument_bank(&self, id: u16) -> Option<&InstrumentBank> {
        self.banks.get(id as usize)?.as_ref()
    }

    /// Decode the SWAR with wave-archive id `id`.
    pub fn decode_wave_archive(&self, id: u16) -> Result<WaveArchive, FormatError> {
        let info = self
            .wave_archive_info(id)
            .ok_or(FormatError::MissingEntry { kind: EntryKind::WaveArchive, id })?;
        let file = self.file(info.file_id).ok_or(FormatError::MissingFile(info.file_id))?;
        decode_wave_archive(&file)
    }

    /// Number of sub-sequences in SSAR `archive`.
    pub fn archive_sequence_count(&self, archive: u16) -> Result<u32, FormatError> {
        let file = self.archive_file(archive)?;
        sequence_file::archive_entry_count(&file)
    }

    fn archive_file(&self, archive: u16) -> Result<SharedBytes, FormatError> {
        let info = self.archive_info(archive).ok_or(FormatError::MissingEntry {
            kind: EntryKind::SequenceArchive,
            id: archive,
        })?;
        self.file(info.file_id).ok_or(FormatError::MissingFile(info.file_id))
    }

    /// Resolve a song: its bytecode, instrument bank and wave archives.
    pub fn load_song(&self, id: SongId) -> Result<SongData, FormatError> {
        let (mut song, bank_id) = match id {
            SongId::Sequence(seq) => {
                let info = self
                    .sequence_info(seq)
                    .ok_or(FormatError::MissingEntry { kind: EntryKind::Sequence, id: seq })?;
                let file = self.file(info.file_id).ok_or(FormatError::MissingFile(info.file_id))?;
                log::debug!("loading SSEQ {} (file {}, bank {})", seq, info.file_id, info.bank);
                let song = SongData {
                    program: sequence_file::sequence_program(&file)?,
                    start_pc: 0,
                    volume: info.volume,
                    channel_priority: info.channel_priority,
                    player_priority: info.player_priority,
                    player: info.player,
                    ..Default::default()
                };
                (song, info.bank)
            }
            SongId::Archive { archive, sub } => {
                let file = self.archive_file(archive)?;
                let count = sequence_file::archive_entry_count(&file)?;
                if sub as u32 >= count {
                    return Err(FormatError::MissingEntry { kind: EntryKind::ArchiveSequence, id: sub });
                }
                let entry = sequence_file::archive_entry(&file, sub)?;
                log::debug!("loading SSAR {} sub-sequence {} (bank {})", archive, sub, entry.bank);
                let song = SongData {
                    program: sequence_file::archive_program(&file)?,
                    start_pc: entry.pc,
                    volume: entry.volume,
                    channel_priority: entry.channel_priority,
                    player_priority: entry.player_priority,
                    player: entry.player,
                    ..Default::default()
                };
                (song, entry.bank)
            }
        };

        let bank_info = *self
            .bank_info(bank_id)
            .ok_or(FormatError::MissingEntry { kind: EntryKind::Bank, id: bank_id })?;
        song.bank = self
            .instrument_bank(bank_id)
            .cloned()
            .ok_or(FormatError::MissingEntry { kind: EntryKind::Bank, id: bank_id })?;

        for (slot, &swar_id) in bank_info.wave_archives.iter().enumerate().take(WAVE_ARCHIVE_SLOTS) {
            if swar_id == NO_WAVE_ARCHIVE || self.wave_archive_info(swar_id).is_none() {
                continue;
            }
            log::debug!("bank {} slot {}: SWAR {}", bank_id, slot, swar_id);
            song.wave_archives[slot] = Some(self.decode_wave_archive(swar_id)?);
        }
        Ok(song)
    }

    /// Decode STRM `id`.
    pub fn decode_stream(&self, id: u16) -> Result<Stream, FormatError> {
        let info = self
            .stream_info(id)
            .ok_or(FormatError::MissingEntry { kind: EntryKind::Stream, id })?;
        let file = self.file(info.file_id).ok_or(FormatError::MissingFile(info.file_id))?;
        stream::decode_stream(&file)
    }
}

fn present_ids<T>(entries: &[Option<T>]) -> impl Iterator<Item = u16> + '_ {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_some())
        .map(|(i, _)| i as u16)
}

fn parse_fat(fat: ByteReader<'_>) -> Result<Vec<BlockRange>, FormatError> {
    let count = fat.u32_at(FAT_COUNT)? as usize;
    let mut files = Vec::with_capacity(count.min(4096));
    for i in 0..count {
        let at = FAT_ENTRIES + i * FAT_ENTRY_SIZE;
        files.push(BlockRange { offset: fat.u32_at(at)?, size: fat.u32_at(at + 4)? });
    }
    log::debug!("FAT: {} files", count);
    Ok(files)
}

/// Find every sound archive embedded in `rom`.
///
/// Each "SDAT" occurrence is parsed in place; if that fails, an LZSS stream
/// starting five bytes earlier is decompressed and parsed instead.
/// Uncompressed archives come first, then compressed ones, each in file
/// order.
pub fn find_sound_archives(rom: &[u8]) -> Vec<SoundArchive> {
    let rom: Arc<[u8]> = Arc::from(rom);
    let shared = SharedBytes::new(rom.clone());
    let offsets: Vec<usize> = rom
        .windows(SDAT_MAGIC.len())
        .enumerate()
        .filter(|(_, w)| *w == SDAT_MAGIC)
        .map(|(i, _)| i)
        .collect();
    log::debug!("found {} SDAT signatures", offsets.len());

    let mut plain = Vec::new();
    let mut compressed = Vec::new();
    for offset in offsets {
        let Some(view) = shared.slice_from(offset) else {
            continue;
        };
        if let Some(archive) = SoundArchive::parse(view) {
            log::debug!("SDAT at {:#010x}", offset);
            plain.push(archive);
            continue;
        }

        let Some(start) = offset.checked_sub(LZSS_MAGIC_DISTANCE) else {
            continue;
        };
        if rom[start] != LZSS_TAG {
            continue;
        }
        match lzss::decompress(&rom[start..]) {
            Ok(data) => {
                if let Some(archive) = SoundArchive::parse(data) {
                    log::debug!("LZSS-compressed SDAT at {:#010x}", start);
                    compressed.push(archive);
                }
            }
            Err(e) => log::debug!("LZSS at {:#010x}: {}", start, e),
        }
    }
    plain.extend(compressed);
    plain
}
