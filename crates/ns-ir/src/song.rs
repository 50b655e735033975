//! A loaded, ready-to-play sequence.

use alloc::vec::Vec;

use crate::bytes::SharedBytes;
use crate::instrument::InstrumentBank;
use crate::sample::Sample;

/// Number of wave-archive slots a bank can link.
pub const WAVE_ARCHIVE_SLOTS: usize = 4;

/// Decoded samples of one SWAR. Entries that failed to decode are `None`.
pub type WaveArchive = Vec<Option<Sample>>;

/// Which song to load from an archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SongId {
    /// A plain SSEQ by sequence id
    Sequence(u16),
    /// Sub-sequence `sub` of SSAR `archive`
    Archive { archive: u16, sub: u16 },
}

/// Everything the engine needs to play one sequence.
#[derive(Clone, Debug, Default)]
pub struct SongData {
    /// Sequence bytecode; program counters are offsets into this view
    pub program: SharedBytes,
    /// Track 0 entry point
    pub start_pc: u32,
    pub bank: InstrumentBank,
    /// The bank's four linked wave archives
    pub wave_archives: [Option<WaveArchive>; WAVE_ARCHIVE_SLOTS],
    /// Sequence volume from the INFO record
    pub volume: u8,
    pub channel_priority: u8,
    pub player_priority: u8,
    pub player: u8,
}

impl SongData {
    /// Sample `sample_id` in wave-archive slot `slot`, if decoded.
    pub fn sample(&self, slot: usize, sample_id: usize) -> Option<&Sample> {
        self.wave_archives
            .get(slot)?
            .as_ref()?
            .get(sample_id)?
            .as_ref()
    }

    /// Fill wave-archive slots this song leaves empty from `previous`.
    pub fn carry_over_wave_archives(&mut self, previous: &SongData) {
        for (slot, prev) in self.wave_archives.iter_mut().zip(previous.wave_archives.iter()) {
            if slot.is_none() {
                *slot = prev.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn carry_over_only_fills_empty_slots() {
        let mut prev = SongData::default();
        prev.wave_archives[0] = Some(vec![Some(Sample::new(vec![0.5], 8000, 0, false, 0))]);
        prev.wave_archives[1] = Some(vec![None]);

        let mut next = SongData::default();
        next.wave_archives[1] = Some(vec![]);
        next.carry_over_wave_archives(&prev);

        assert!(next.sample(0, 0).is_some());
        assert_eq!(next.wave_archives[1].as_ref().map(|a| a.len()), Some(0));
        assert!(next.wave_archives[2].is_none());
    }
}
