//! INFO block: per-category entry records.

use alloc::vec::Vec;

use binrw::BinRead;

use super::header::cursor_at;
use crate::reader::ByteReader;
use crate::FormatError;

const SEQUENCE_LIST: usize = 0x08;
const ARCHIVE_LIST: usize = 0x0C;
const BANK_LIST: usize = 0x10;
const WAVE_ARCHIVE_LIST: usize = 0x14;
const STREAM_LIST: usize = 0x24;

/// Wave-archive id meaning "slot unused".
pub const NO_WAVE_ARCHIVE: u16 = 0xFFFF;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct SequenceInfo {
    pub file_id: u16,
    #[br(pad_before = 2)]
    pub bank: u16,
    pub volume: u8,
    pub channel_priority: u8,
    pub player_priority: u8,
    pub player: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct ArchiveInfo {
    pub file_id: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct BankInfo {
    pub file_id: u16,
    #[br(pad_before = 2)]
    pub wave_archives: [u16; 4],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct WaveArchiveInfo {
    pub file_id: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct StreamInfo {
    pub file_id: u16,
}

/// All INFO records, indexed by entry id. Absent entries are `None`.
#[derive(Clone, Debug, Default)]
pub struct InfoTables {
    pub sequences: Vec<Option<SequenceInfo>>,
    pub archives: Vec<Option<ArchiveInfo>>,
    pub banks: Vec<Option<BankInfo>>,
    pub wave_archives: Vec<Option<WaveArchiveInfo>>,
    pub streams: Vec<Option<StreamInfo>>,
}

impl InfoTables {
    pub fn parse(info: ByteReader<'_>) -> Result<Self, FormatError> {
        let data = info.data();
        let tables = InfoTables {
            sequences: read_list(info, SEQUENCE_LIST, |at| Ok(SequenceInfo::read(&mut cursor_at(data, at))?))?,
            // a truncated SSAR record leaves the entry absent
            archives: read_list(info, ARCHIVE_LIST, |at| Ok(ArchiveInfo::read(&mut cursor_at(data, at)).ok()))?
                .into_iter()
                .map(Option::flatten)
                .collect(),
            banks: read_list(info, BANK_LIST, |at| Ok(BankInfo::read(&mut cursor_at(data, at))?))?,
            wave_archives: read_list(info, WAVE_ARCHIVE_LIST, |at| {
                Ok(WaveArchiveInfo::read(&mut cursor_at(data, at))?)
            })?,
            streams: if info.u32_at(STREAM_LIST)? != 0 {
                read_list(info, STREAM_LIST, |at| Ok(StreamInfo::read(&mut cursor_at(data, at))?))?
            } else {
                Vec::new()
            },
        };
        log::debug!(
            "INFO: {} SSEQ, {} SSAR, {} SBNK, {} SWAR, {} STRM entries",
            tables.sequences.len(),
            tables.archives.len(),
            tables.banks.len(),
            tables.wave_archives.len(),
            tables.streams.len()
        );
        Ok(tables)
    }
}

/// Read the list whose offset is stored at `pointer`: a count, then one
/// record offset per entry. A zero record offset is an absent entry.
fn read_list<T>(
    info: ByteReader<'_>,
    pointer: usize,
    mut read: impl FnMut(usize) -> Result<T, FormatError>,
) -> Result<Vec<Option<T>>, FormatError> {
    let list = info.u32_at(pointer)? as usize;
    let count = info.u32_at(list)? as usize;
    let mut out = Vec::new();
    for i in 0..count {
        let record = info.u32_at(list + 4 + i * 4)? as usize;
        out.push(if record == 0 { None } else { Some(read(record)?) });
    }
    Ok(out)
}
