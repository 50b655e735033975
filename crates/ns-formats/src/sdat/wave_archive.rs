//! SWAR decoding.

use alloc::vec::Vec;

use ns_ir::{Sample, WaveArchive};

use super::header::SwavHeader;
use crate::codec::WaveType;
use crate::reader::ByteReader;
use crate::FormatError;

const SAMPLE_COUNT: usize = 0x38;
const SAMPLE_TABLE: usize = 0x3C;

/// Decode every SWAV in a SWAR file.
///
/// Entries whose offset or data fall outside the file, or whose wave type
/// is unknown, are left as `None` with a warning.
pub fn decode_wave_archive(file: &[u8]) -> Result<WaveArchive, FormatError> {
    let r = ByteReader::new(file);
    let count = r.u32_at(SAMPLE_COUNT)? as usize;
    let mut samples = Vec::with_capacity(count.min(1024));
    for j in 0..count {
        let offset = r.u32_at(SAMPLE_TABLE + j * 4)? as usize;
        samples.push(decode_swav(&r, j, offset));
    }
    log::debug!(
        "SWAR: {} of {} samples decoded",
        samples.iter().filter(|s| s.is_some()).count(),
        count
    );
    Ok(samples)
}

fn decode_swav(r: &ByteReader<'_>, index: usize, offset: usize) -> Option<Sample> {
    if offset >= r.len() {
        log::warn!("SWAR entry {} at {:#x} is out of bounds", index, offset);
        return None;
    }
    let header = match SwavHeader::parse_at(r.data(), offset) {
        Ok(h) => h,
        Err(e) => {
            log::warn!("SWAR entry {}: {}", index, e);
            return None;
        }
    };
    let wave_type = match WaveType::try_from(header.wave_type) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("SWAR entry {}: {}", index, e);
            return None;
        }
    };
    let data = match r.bytes_at(offset + SwavHeader::SIZE, header.data_len()) {
        Ok(d) => d,
        Err(e) => {
            log::warn!("SWAR entry {}: {}", index, e);
            return None;
        }
    };
    Some(Sample::new(
        wave_type.decode(data),
        header.sample_rate as u32,
        header.timer,
        header.looping != 0,
        wave_type.loop_point(header.loop_offset as u32),
    ))
}
