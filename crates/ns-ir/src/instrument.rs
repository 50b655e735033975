//! Instrument bank types.

use alloc::vec::Vec;
use arrayvec::ArrayVec;

use crate::envelope::Adsr;

/// What a region plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegionKind {
    /// A sample from one of the bank's wave archives
    #[default]
    Sample,
    /// One of the eight PSG duty-cycle square waves
    PsgPulse,
    /// PSG white noise
    PsgNoise,
}

impl RegionKind {
    /// Map a record type byte to a region kind.
    ///
    /// Only the PSG tags are distinguished; everything else plays a sample.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0x02 => RegionKind::PsgPulse,
            0x03 => RegionKind::PsgNoise,
            _ => RegionKind::Sample,
        }
    }

    pub fn is_psg(self) -> bool {
        !matches!(self, RegionKind::Sample)
    }
}

/// One playable region of an instrument.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstrumentRegion {
    pub kind: RegionKind,
    /// Sample index inside the wave archive, or the PSG duty cycle
    pub sample_id: u16,
    /// Which of the bank's four wave-archive slots to read from
    pub wave_archive: u16,
    /// MIDI note the sample plays at its recorded pitch
    pub base_note: u8,
    pub adsr: Adsr,
    /// Raw pan byte (0..=127, 64 = center)
    pub pan: u8,
}

/// Why a note could not be mapped to a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    /// The program slot holds no instrument.
    #[error("empty instrument")]
    Empty,
    /// Drumset note outside `[lower, upper]`.
    #[error("drumset note {note} out of range ({lower}-{upper} inclusive)")]
    OutOfRange { note: u8, lower: u8, upper: u8 },
    /// The record has no region covering this note.
    #[error("no region for note {note}")]
    NoRegion { note: u8 },
}

/// One program slot of an instrument bank, keyed by its fRecord tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InstrumentRecord {
    /// fRecord 0x00
    #[default]
    Empty,
    /// fRecord 0x01
    SingleSample(InstrumentRegion),
    /// fRecord 0x02
    PsgPulse(InstrumentRegion),
    /// fRecord 0x03
    PsgNoise(InstrumentRegion),
    /// fRecord 0x10: one region per note in `lower..=upper`
    Drumset {
        lower: u8,
        upper: u8,
        regions: Vec<InstrumentRegion>,
    },
    /// fRecord 0x11: region `i` covers notes up to `region_ends[i]`
    MultiSample {
        region_ends: ArrayVec<u8, 8>,
        regions: ArrayVec<InstrumentRegion, 8>,
    },
}

pub const RECORD_EMPTY: u8 = 0x00;
pub const RECORD_SINGLE_SAMPLE: u8 = 0x01;
pub const RECORD_PSG_PULSE: u8 = 0x02;
pub const RECORD_PSG_NOISE: u8 = 0x03;
pub const RECORD_DRUMSET: u8 = 0x10;
pub const RECORD_MULTI_SAMPLE: u8 = 0x11;

impl InstrumentRecord {
    /// The fRecord tag this record was decoded from.
    pub fn tag(&self) -> u8 {
        match self {
            InstrumentRecord::Empty => RECORD_EMPTY,
            InstrumentRecord::SingleSample(_) => RECORD_SINGLE_SAMPLE,
            InstrumentRecord::PsgPulse(_) => RECORD_PSG_PULSE,
            InstrumentRecord::PsgNoise(_) => RECORD_PSG_NOISE,
            InstrumentRecord::Drumset { .. } => RECORD_DRUMSET,
            InstrumentRecord::MultiSample { .. } => RECORD_MULTI_SAMPLE,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, InstrumentRecord::Empty)
    }

    /// Index of the region that plays `note`.
    pub fn region_index(&self, note: u8) -> Result<usize, RegionError> {
        match self {
            InstrumentRecord::Empty => Err(RegionError::Empty),
            InstrumentRecord::SingleSample(_)
            | InstrumentRecord::PsgPulse(_)
            | InstrumentRecord::PsgNoise(_) => Ok(0),
            InstrumentRecord::Drumset { lower, upper, .. } => {
                if note < *lower || note > *upper {
                    Err(RegionError::OutOfRange { note, lower: *lower, upper: *upper })
                } else {
                    Ok((note - lower) as usize)
                }
            }
            InstrumentRecord::MultiSample { region_ends, .. } => region_ends
                .iter()
                .position(|&end| note <= end)
                .ok_or(RegionError::NoRegion { note }),
        }
    }

    /// Resolve the region that plays `note`.
    pub fn resolve_region(&self, note: u8) -> Result<&InstrumentRegion, RegionError> {
        let index = self.region_index(note)?;
        let region = match self {
            InstrumentRecord::Empty => None,
            InstrumentRecord::SingleSample(r)
            | InstrumentRecord::PsgPulse(r)
            | InstrumentRecord::PsgNoise(r) => Some(r),
            InstrumentRecord::Drumset { regions, .. } => regions.get(index),
            InstrumentRecord::MultiSample { regions, .. } => regions.get(index),
        };
        region.ok_or(RegionError::NoRegion { note })
    }

    /// All regions this record owns.
    pub fn regions(&self) -> &[InstrumentRegion] {
        match self {
            InstrumentRecord::Empty => &[],
            InstrumentRecord::SingleSample(r)
            | InstrumentRecord::PsgPulse(r)
            | InstrumentRecord::PsgNoise(r) => core::slice::from_ref(r),
            InstrumentRecord::Drumset { regions, .. } => regions,
            InstrumentRecord::MultiSample { regions, .. } => regions,
        }
    }
}

/// A decoded SBNK: instrument records indexed by program number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstrumentBank {
    pub instruments: Vec<InstrumentRecord>,
}

impl InstrumentBank {
    pub fn new(instruments: Vec<InstrumentRecord>) -> Self {
        Self { instruments }
    }

    /// Record for a program number, if the bank has one.
    pub fn get(&self, program: u16) -> Option<&InstrumentRecord> {
        self.instruments.get(program as usize)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn region(sample_id: u16) -> InstrumentRegion {
        InstrumentRegion { sample_id, base_note: 60, ..Default::default() }
    }

    #[test]
    fn multi_sample_picks_first_region_covering_note() {
        let record = InstrumentRecord::MultiSample {
            region_ends: [40u8, 80, 127].into_iter().collect(),
            regions: [region(0), region(1), region(2)].into_iter().collect(),
        };
        assert_eq!(record.region_index(39), Ok(0));
        assert_eq!(record.region_index(40), Ok(0));
        assert_eq!(record.region_index(41), Ok(1));
        assert_eq!(record.region_index(81), Ok(2));
        assert_eq!(record.resolve_region(127).map(|r| r.sample_id), Ok(2));
    }

    #[test]
    fn multi_sample_without_covering_region_fails() {
        let record = InstrumentRecord::MultiSample {
            region_ends: [40u8, 80].into_iter().collect(),
            regions: [region(0), region(1)].into_iter().collect(),
        };
        assert_eq!(record.region_index(90), Err(RegionError::NoRegion { note: 90 }));
    }

    #[test]
    fn drumset_maps_note_relative_to_lower_bound() {
        let record = InstrumentRecord::Drumset {
            lower: 36,
            upper: 38,
            regions: vec![region(5), region(6), region(7)],
        };
        assert_eq!(record.resolve_region(37).map(|r| r.sample_id), Ok(6));
        assert_eq!(
            record.region_index(35),
            Err(RegionError::OutOfRange { note: 35, lower: 36, upper: 38 })
        );
        assert!(record.region_index(39).is_err());
    }

    #[test]
    fn single_region_kinds_always_resolve_to_zero() {
        for record in [
            InstrumentRecord::SingleSample(region(1)),
            InstrumentRecord::PsgPulse(region(2)),
            InstrumentRecord::PsgNoise(region(3)),
        ] {
            assert_eq!(record.region_index(0), Ok(0));
            assert_eq!(record.region_index(127), Ok(0));
        }
        assert_eq!(InstrumentRecord::Empty.region_index(60), Err(RegionError::Empty));
    }

    #[test]
    fn record_tags_round_trip_kind() {
        assert_eq!(InstrumentRecord::Empty.tag(), 0);
        assert_eq!(InstrumentRecord::PsgNoise(region(0)).tag(), 3);
        assert_eq!(RegionKind::from_tag(2), RegionKind::PsgPulse);
        assert_eq!(RegionKind::from_tag(1), RegionKind::Sample);
        assert_eq!(RegionKind::from_tag(0x11), RegionKind::Sample);
    }
}
