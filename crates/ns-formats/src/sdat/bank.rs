//! SBNK decoding into instrument records.

use alloc::vec::Vec;
use arrayvec::ArrayVec;

use ns_ir::{
    Adsr, InstrumentBank, InstrumentRecord, InstrumentRegion, RegionKind, RECORD_DRUMSET,
    RECORD_EMPTY, RECORD_MULTI_SAMPLE, RECORD_PSG_NOISE, RECORD_PSG_PULSE, RECORD_SINGLE_SAMPLE,
};

use crate::reader::ByteReader;
use crate::FormatError;

const INSTRUMENT_COUNT: usize = 0x38;
const INSTRUMENT_TABLE: usize = 0x3C;

/// Size of a region entry inside drumset and multi-sample records:
/// a 2-byte type followed by 10 bytes of region data.
const REGION_STRIDE: usize = 12;

/// Multi-sample records end their region list with this note.
const LAST_REGION_END: u8 = 0x7F;

/// Decode an SBNK file.
pub fn parse_bank(file: &[u8]) -> Result<InstrumentBank, FormatError> {
    let r = ByteReader::new(file);
    let count = r.u32_at(INSTRUMENT_COUNT)? as usize;
    let mut instruments = Vec::with_capacity(count.min(128));
    for program in 0..count {
        let entry = INSTRUMENT_TABLE + program * 4;
        let tag = r.u8_at(entry)?;
        let record = r.u16_at(entry + 1)? as usize;
        instruments.push(parse_record(&r, program, tag, record)?);
    }
    log::debug!("SBNK: {} instruments", count);
    Ok(InstrumentBank::new(instruments))
}

fn parse_record(
    r: &ByteReader<'_>,
    program: usize,
    tag: u8,
    at: usize,
) -> Result<InstrumentRecord, FormatError> {
    let record = match tag {
        RECORD_EMPTY => InstrumentRecord::Empty,
        RECORD_SINGLE_SAMPLE => InstrumentRecord::SingleSample(read_region(r, at, RegionKind::Sample)?),
        RECORD_PSG_PULSE => InstrumentRecord::PsgPulse(read_region(r, at, RegionKind::PsgPulse)?),
        RECORD_PSG_NOISE => InstrumentRecord::PsgNoise(read_region(r, at, RegionKind::PsgNoise)?),
        RECORD_DRUMSET => {
            let lower = r.u8_at(at)?;
            let upper = r.u8_at(at + 1)?;
            let count = if upper >= lower { (upper - lower) as usize + 1 } else { 0 };
            let mut regions = Vec::with_capacity(count);
            for k in 0..count {
                let kind = RegionKind::from_tag(r.u8_at(at + 2 + k * REGION_STRIDE)?);
                regions.push(read_region(r, at + 4 + k * REGION_STRIDE, kind)?);
            }
            InstrumentRecord::Drumset { lower, upper, regions }
        }
        RECORD_MULTI_SAMPLE => {
            let mut region_ends = ArrayVec::<u8, 8>::new();
            for k in 0..8 {
                let end = r.u8_at(at + k)?;
                if end == 0 {
                    break;
                }
                region_ends.push(end);
                if end == LAST_REGION_END {
                    break;
                }
            }
            let mut regions = ArrayVec::<InstrumentRegion, 8>::new();
            for k in 0..region_ends.len() {
                let kind = RegionKind::from_tag(r.u8_at(at + 8 + k * REGION_STRIDE)?);
                regions.push(read_region(r, at + 10 + k * REGION_STRIDE, kind)?);
            }
            InstrumentRecord::MultiSample { region_ends, regions }
        }
        _ => {
            log::warn!("program {}: unrecognized instrument type {:#04x}", program, tag);
            InstrumentRecord::Empty
        }
    };
    Ok(record)
}

/// The 10-byte region body shared by every record kind.
fn read_region(r: &ByteReader<'_>, at: usize, kind: RegionKind) -> Result<InstrumentRegion, FormatError> {
    Ok(InstrumentRegion {
        kind,
        sample_id: r.u16_at(at)?,
        wave_archive: r.u16_at(at + 2)?,
        base_note: r.u8_at(at + 4)?,
        adsr: Adsr::new(r.u8_at(at + 5)?, r.u8_at(at + 6)?, r.u8_at(at + 7)?, r.u8_at(at + 8)?),
        pan: r.u8_at(at + 9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn region_bytes(sample: u16, slot: u16, note: u8) -> [u8; 10] {
        let s = sample.to_le_bytes();
        let w = slot.to_le_bytes();
        [s[0], s[1], w[0], w[1], note, 127, 127, 127, 127, 64]
    }

    fn bank_with(records: &[(u8, Vec<u8>)]) -> Vec<u8> {
        let mut d = vec![0u8; INSTRUMENT_TABLE + records.len() * 4];
        d[INSTRUMENT_COUNT..INSTRUMENT_COUNT + 4].copy_from_slice(&(records.len() as u32).to_le_bytes());
        for (i, (tag, body)) in records.iter().enumerate() {
            let at = d.len() as u16;
            let entry = INSTRUMENT_TABLE + i * 4;
            d[entry] = *tag;
            d[entry + 1..entry + 3].copy_from_slice(&at.to_le_bytes());
            d.extend_from_slice(body);
        }
        d
    }

    #[test]
    fn single_and_psg_records() {
        let d = bank_with(&[
            (RECORD_EMPTY, vec![]),
            (RECORD_SINGLE_SAMPLE, region_bytes(4, 1, 60).to_vec()),
            (RECORD_PSG_PULSE, region_bytes(3, 0, 69).to_vec()),
        ]);
        let bank = parse_bank(&d).unwrap();
        assert_eq!(bank.len(), 3);
        assert!(bank.get(0).unwrap().is_empty());
        match bank.get(1).unwrap() {
            InstrumentRecord::SingleSample(r) => {
                assert_eq!((r.sample_id, r.wave_archive, r.base_note, r.pan), (4, 1, 60, 64));
                assert_eq!(r.adsr.attack_coeff, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
        let pulse = bank.get(2).unwrap().resolve_region(10).unwrap();
        assert_eq!(pulse.kind, RegionKind::PsgPulse);
    }

    #[test]
    fn drumset_reads_one_region_per_note() {
        let mut body = vec![36, 38, 0, 0];
        // each region body is followed by the next region's type
        for k in 0..3u16 {
            body.extend_from_slice(&region_bytes(k, 0, 36 + k as u8));
            body.extend_from_slice(&[if k == 0 { RECORD_PSG_NOISE } else { 1 }, 0]);
        }
        let d = bank_with(&[(RECORD_DRUMSET, body)]);
        let bank = parse_bank(&d).unwrap();
        let drums = bank.get(0).unwrap();
        assert_eq!(drums.regions().len(), 3);
        assert_eq!(drums.resolve_region(38).unwrap().sample_id, 2);
        assert_eq!(drums.resolve_region(37).unwrap().kind, RegionKind::PsgNoise);
        assert!(drums.resolve_region(39).is_err());
    }

    #[test]
    fn multi_sample_stops_at_last_region_end() {
        let mut body = vec![40, 80, 127, 50, 0, 0, 0, 0];
        for k in 0..3u16 {
            body.extend_from_slice(&[1, 0]);
            body.extend_from_slice(&region_bytes(10 + k, 0, 60));
        }
        let d = bank_with(&[(RECORD_MULTI_SAMPLE, body)]);
        let bank = parse_bank(&d).unwrap();
        match bank.get(0).unwrap() {
            InstrumentRecord::MultiSample { region_ends, regions } => {
                assert_eq!(region_ends.as_slice(), &[40, 80, 127]);
                assert_eq!(regions.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(bank.get(0).unwrap().resolve_region(81).unwrap().sample_id, 12);
    }

    #[test]
    fn unknown_tag_becomes_empty() {
        let d = bank_with(&[(0x42, vec![0; 10])]);
        assert!(parse_bank(&d).unwrap().get(0).unwrap().is_empty());
    }
}
