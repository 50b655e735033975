//! LZSS (type 0x10) decompression as used by compressed sound archives.

use alloc::vec::Vec;

use crate::reader::ByteReader;
use crate::FormatError;

/// Compression tag for LZSS.
pub const LZSS_TAG: u8 = 0x10;

/// Decompress an LZSS stream.
///
/// Layout: tag byte 0x10, 24-bit little-endian output size, then groups of
/// one flag byte followed by eight tokens. A clear flag bit (MSB first) is
/// a literal byte; a set bit is a two-byte back-reference of length
/// `3 + (b0 >> 4)` and displacement `1 + ((b0 & 0xF) << 8 | b1)`.
/// Back-references may overlap the bytes they produce.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, FormatError> {
    let mut r = ByteReader::new(data);
    let header = r.read_u32_le()?;
    let tag = (header & 0xFF) as u8;
    if tag != LZSS_TAG {
        return Err(FormatError::UnknownCompression(tag));
    }
    let size = (header >> 8) as usize;
    log::debug!("LZSS stream, {} bytes uncompressed", size);

    let mut out = Vec::with_capacity(size);
    while out.len() < size {
        let flags = r.read_u8()?;
        for bit in (0..8).rev() {
            if out.len() >= size {
                break;
            }
            if flags & (1 << bit) == 0 {
                out.push(r.read_u8()?);
                continue;
            }

            let b0 = r.read_u8()? as usize;
            let b1 = r.read_u8()? as usize;
            let len = 3 + (b0 >> 4);
            let distance = 1 + (((b0 & 0xF) << 8) | b1);
            if distance > out.len() {
                return Err(FormatError::BadBackReference { position: out.len(), distance });
            }
            for _ in 0..len {
                if out.len() >= size {
                    break;
                }
                let byte = out[out.len() - distance];
                out.push(byte);
            }
        }
    }
    Ok(out)
}
