//! Fixed-layout headers read with binrw.

use binrw::io::Cursor;
use binrw::BinRead;

use crate::FormatError;

/// Required value of the header-size field.
pub const SDAT_HEADER_SIZE: u16 = 64;

const BYTE_ORDER_MARK: u16 = 0xFEFF;
const SDAT_VERSION: u16 = 0x0100;

/// Offset and size of one top-level block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BinRead)]
#[br(little)]
pub struct BlockRange {
    pub offset: u32,
    pub size: u32,
}

impl BlockRange {
    pub fn is_empty(&self) -> bool {
        self.offset == 0 || self.size == 0
    }
}

/// The 64-byte SDAT header, up to the block table.
#[derive(Clone, Copy, Debug, BinRead)]
#[br(little, magic = b"SDAT")]
pub struct SdatHeader {
    pub byte_order: u16,
    pub version: u16,
    pub file_size: u32,
    pub header_size: u16,
    pub block_count: u16,
    pub symb: BlockRange,
    pub info: BlockRange,
    pub fat: BlockRange,
    pub file: BlockRange,
}

impl SdatHeader {
    /// Read and validate the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        let header = match SdatHeader::read(&mut Cursor::new(data)) {
            Ok(h) => h,
            Err(binrw::Error::BadMagic { .. }) => return Err(FormatError::BadMagic),
            Err(e) => return Err(e.into()),
        };
        if header.byte_order != BYTE_ORDER_MARK || header.version != SDAT_VERSION {
            return Err(FormatError::BadMagic);
        }
        if header.header_size != SDAT_HEADER_SIZE {
            if header.header_size == 0x4000 {
                log::debug!("header size 0x4000, archive is probably LZSS compressed");
            }
            return Err(FormatError::HeaderSize(header.header_size));
        }
        Ok(header)
    }
}

/// The 12-byte header in front of every SWAV sample.
#[derive(Clone, Copy, Debug, BinRead)]
#[br(little)]
pub struct SwavHeader {
    pub wave_type: u8,
    pub looping: u8,
    pub sample_rate: u16,
    pub timer: u16,
    /// Loop start in 32-bit words
    pub loop_offset: u16,
    /// Length after the loop start in 32-bit words
    pub length: u32,
}

impl SwavHeader {
    pub const SIZE: usize = 0x0C;

    pub fn parse_at(data: &[u8], offset: usize) -> Result<Self, FormatError> {
        Ok(SwavHeader::read(&mut cursor_at(data, offset))?)
    }

    /// Bytes of wave data following the header.
    pub fn data_len(&self) -> usize {
        (self.loop_offset as usize + self.length as usize) * 4
    }
}

/// STRM "HEAD" fields, starting at 0x18.
#[derive(Clone, Copy, Debug, BinRead)]
#[br(little)]
pub struct StrmHeader {
    pub wave_type: u8,
    pub looping: u8,
    pub channels: u8,
    #[br(pad_before = 1)]
    pub sample_rate: u16,
    pub time: u16,
    pub loop_point: u32,
    pub sample_count: u32,
    pub data_offset: u32,
    pub block_count: u32,
    pub block_length: u32,
    pub samples_per_block: u32,
    pub last_block_length: u32,
    pub last_block_samples: u32,
}

impl StrmHeader {
    pub const OFFSET: usize = 0x18;
    /// Wave data always starts here.
    pub const DATA_START: usize = 0x68;

    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        Ok(StrmHeader::read(&mut cursor_at(data, Self::OFFSET))?)
    }
}

/// A cursor over `data` positioned at `offset`.
pub(crate) fn cursor_at(data: &[u8], offset: usize) -> Cursor<&[u8]> {
    let mut cursor = Cursor::new(data);
    cursor.set_position(offset as u64);
    cursor
}
