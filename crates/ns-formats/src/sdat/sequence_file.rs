//! SSEQ and SSAR file layouts.

use ns_ir::SharedBytes;

use crate::reader::ByteReader;
use crate::FormatError;

/// Both file kinds store the offset of their bytecode here.
const DATA_OFFSET: usize = 0x18;
const ARCHIVE_ENTRY_COUNT: usize = 0x1C;
const ARCHIVE_ENTRIES: usize = 0x20;
const ARCHIVE_ENTRY_SIZE: usize = 12;

/// Bytecode of an SSEQ, starting at its data offset.
pub fn sequence_program(file: &SharedBytes) -> Result<SharedBytes, FormatError> {
    let data_offset = ByteReader::new(file).u32_at(DATA_OFFSET)? as usize;
    if data_offset != 0x1C {
        log::debug!("SSEQ data offset is {:#x}, expected 0x1c", data_offset);
    }
    file.slice_from(data_offset)
        .ok_or(FormatError::UnexpectedEof { offset: data_offset, len: 0 })
}

/// One sub-sequence of an SSAR.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Track 0 entry point, relative to the archive's bytecode
    pub pc: u32,
    pub bank: u16,
    pub volume: u8,
    pub channel_priority: u8,
    pub player_priority: u8,
    pub player: u8,
}

/// Number of sub-sequences in an SSAR.
pub fn archive_entry_count(file: &[u8]) -> Result<u32, FormatError> {
    ByteReader::new(file).u32_at(ARCHIVE_ENTRY_COUNT)
}

/// Sub-sequence `sub` of an SSAR.
pub fn archive_entry(file: &[u8], sub: u16) -> Result<ArchiveEntry, FormatError> {
    let r = ByteReader::new(file);
    let at = ARCHIVE_ENTRIES + sub as usize * ARCHIVE_ENTRY_SIZE;
    Ok(ArchiveEntry {
        pc: r.u32_at(at)?,
        bank: r.u16_at(at + 4)?,
        volume: r.u8_at(at + 6)?,
        channel_priority: r.u8_at(at + 7)?,
        player_priority: r.u8_at(at + 8)?,
        player: r.u8_at(at + 9)?,
    })
}

/// Bytecode shared by all sub-sequences of an SSAR.
pub fn archive_program(file: &SharedBytes) -> Result<SharedBytes, FormatError> {
    let r = ByteReader::new(file);
    let data_offset = r.u32_at(DATA_OFFSET)? as usize;
    let count = r.u32_at(ARCHIVE_ENTRY_COUNT)? as usize;
    if data_offset != ARCHIVE_ENTRIES + count * ARCHIVE_ENTRY_SIZE {
        log::debug!("SSAR data offset {:#x} does not follow its {} entries", data_offset, count);
    }
    file.slice_from(data_offset)
        .ok_or(FormatError::UnexpectedEof { offset: data_offset, len: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn sseq_program_starts_at_data_offset() {
        let mut d = vec![0u8; 0x1C];
        d[0x18..0x1C].copy_from_slice(&0x1Cu32.to_le_bytes());
        d.extend_from_slice(&[0x3C, 0x7F, 0x30, 0xFF]);
        let program = sequence_program(&SharedBytes::from(d)).unwrap();
        assert_eq!(program.as_slice(), &[0x3C, 0x7F, 0x30, 0xFF]);
    }

    #[test]
    fn ssar_entries_and_program() {
        let mut d = vec![0u8; 0x20];
        d[0x18..0x1C].copy_from_slice(&0x38u32.to_le_bytes());
        d[0x1C..0x20].copy_from_slice(&2u32.to_le_bytes());
        for (pc, bank) in [(0u32, 1u16), (3, 2)] {
            d.extend_from_slice(&pc.to_le_bytes());
            d.extend_from_slice(&bank.to_le_bytes());
            d.extend_from_slice(&[100, 64, 32, 0, 0, 0]);
        }
        d.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        let file = SharedBytes::from(d);

        assert_eq!(archive_entry_count(&file).unwrap(), 2);
        let e = archive_entry(&file, 1).unwrap();
        assert_eq!((e.pc, e.bank, e.volume), (3, 2, 100));
        assert!(archive_entry(&file, 5).is_err());
        assert_eq!(archive_program(&file).unwrap().len(), 4);
    }
}
