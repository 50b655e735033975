//! SYMB block: entry names.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::reader::ByteReader;
use crate::FormatError;

const SEQUENCE_LIST: usize = 0x08;
const ARCHIVE_LIST: usize = 0x0C;
const BANK_LIST: usize = 0x10;
const WAVE_ARCHIVE_LIST: usize = 0x14;
const STREAM_LIST: usize = 0x24;

/// Bidirectional name/id map for one entry category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolTable {
    by_id: BTreeMap<u16, String>,
    by_name: BTreeMap<String, u16>,
}

impl SymbolTable {
    pub fn insert(&mut self, id: u16, name: String) {
        self.by_name.insert(name.clone(), id);
        self.by_id.insert(id, name);
    }

    pub fn name(&self, id: u16) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn id(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Named entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.by_id.iter().map(|(&id, name)| (id, name.as_str()))
    }
}

/// All symbol tables of an archive.
#[derive(Clone, Debug, Default)]
pub struct Symbols {
    pub sequences: SymbolTable,
    pub archives: SymbolTable,
    /// Sub-sequence names per SSAR; `None` when the SSAR lists none
    pub archive_sequences: Vec<Option<SymbolTable>>,
    pub banks: SymbolTable,
    pub streams: SymbolTable,
}

impl Symbols {
    pub fn parse(symb: ByteReader<'_>) -> Result<Self, FormatError> {
        let mut symbols = Symbols {
            sequences: read_list(symb, symb.u32_at(SEQUENCE_LIST)? as usize)?,
            ..Default::default()
        };

        let archive_list = symb.u32_at(ARCHIVE_LIST)? as usize;
        if archive_list != 0 {
            let count = symb.u32_at(archive_list)?;
            log::debug!("SYMB: {} SSAR entries", count);
            for i in 0..count as usize {
                let entry = archive_list + i * 8;
                let name_offset = symb.u32_at(entry + 4)? as usize;
                if name_offset != 0 {
                    symbols.archives.insert(i as u16, symb.cstr_at(name_offset)?);
                }
                let sub_list = symb.u32_at(entry + 8)? as usize;
                symbols.archive_sequences.push(read_sub_list(symb, sub_list));
            }
        }

        symbols.banks = read_list(symb, symb.u32_at(BANK_LIST)? as usize)?;

        let wave_list = symb.u32_at(WAVE_ARCHIVE_LIST)? as usize;
        if wave_list != 0 {
            log::debug!("SYMB: {} SWAR entries", symb.u32_at(wave_list).unwrap_or(0));
        }

        symbols.streams = read_list(symb, symb.u32_at(STREAM_LIST)? as usize)?;
        Ok(symbols)
    }
}

/// A plain list: count, then one name offset per entry. Zero offsets are
/// unnamed entries.
fn read_list(symb: ByteReader<'_>, list: usize) -> Result<SymbolTable, FormatError> {
    let mut table = SymbolTable::default();
    if list == 0 {
        return Ok(table);
    }
    let count = symb.u32_at(list)?;
    for i in 0..count as usize {
        let name_offset = symb.u32_at(list + 4 + i * 4)? as usize;
        if name_offset != 0 {
            table.insert(i as u16, symb.cstr_at(name_offset)?);
        }
    }
    Ok(table)
}

/// SSAR sub-sequence names. Reading stops quietly at the first bad offset.
fn read_sub_list(symb: ByteReader<'_>, list: usize) -> Option<SymbolTable> {
    if list == 0 {
        return None;
    }
    let count = symb.u32_at(list).ok()?;
    if count == 0 {
        return None;
    }
    let mut table = SymbolTable::default();
    for i in 0..count as usize {
        let Ok(name_offset) = symb.u32_at(list + 4 + i * 4) else {
            break;
        };
        if name_offset == 0 {
            continue;
        }
        match symb.cstr_at(name_offset as usize) {
            Ok(name) => table.insert(i as u16, name),
            Err(_) => break,
        }
    }
    Some(table)
}
