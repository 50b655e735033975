//! Controller: drives a sequence and turns its messages into voices.
//!
//! One engine tick advances the sequence by the tempo accumulator, then
//! steps every active note's release check, LFO, sweep and envelope, and
//! pushes the resulting volume, pan and pitch into its voice. Output
//! samples are drawn between ticks from the 16 per-track voice pools.

use alloc::boxed::Box;
use alloc::vec::Vec;
use arrayvec::ArrayVec;
use ns_ir::{
    psg_square, InstrumentBank, InstrumentRecord, Message, MessageKind, RegionKind, Sample, SampleKey,
    SongData, ARM7_CLOCK, WAVE_ARCHIVE_SLOTS,
};
use slotmap::SlotMap;

use crate::config::{EngineConfig, MixMode, Tuning};
use crate::envelope_state::Envelope;
use crate::error::EngineError;
use crate::frame::Frame;
use crate::lfo::{Lfo, LfoTarget};
use crate::note::{ActiveNote, NoteId};
use crate::sequence::{MessageHandler, Sequence, SequenceStatus, TRACK_COUNT};
use crate::telemetry::{Telemetry, PEAK_DECAY};
use crate::voice_pool::{VoicePool, VOICES_PER_TRACK};
use crate::volume::{channel_decay, channel_pan, channel_volume};

/// Upper bound on simultaneously tracked notes.
pub const MAX_NOTES: usize = TRACK_COUNT * VOICES_PER_TRACK;

/// Tempo accumulator units per sequence tick.
const BPM_TICK: u32 = 240;

/// ARM7 cycles per engine tick.
const CYCLES_PER_TICK: u64 = 64 * 2728;

/// Keys outside the 88-key piano range are logged.
const PIANO_RANGE: core::ops::RangeInclusive<u8> = 21..=108;

/// Voice-side state: pools, notes and sample storage.
///
/// Kept apart from the sequence so it can serve as the sequence's
/// [`MessageHandler`] while the sequence is borrowed.
struct Voices {
    config: EngineConfig,
    pools: [VoicePool; TRACK_COUNT],
    notes: ArrayVec<ActiveNote, MAX_NOTES>,
    /// Owns all sample data
    sample_bank: SlotMap<SampleKey, Sample>,
    square_keys: [SampleKey; 8],
    /// Bank keys of each wave-archive slot's samples
    archive_keys: [Option<Vec<Option<SampleKey>>>; WAVE_ARCHIVE_SLOTS],
    bank: InstrumentBank,
    notes_on: [u128; TRACK_COUNT],
    next_note_id: NoteId,
    jumps: u32,
    warnings: u32,
}

impl Voices {
    fn new(config: EngineConfig) -> Self {
        let mut sample_bank = SlotMap::with_key();
        let square_keys = core::array::from_fn(|duty| sample_bank.insert(psg_square(duty)));
        Self {
            config,
            pools: core::array::from_fn(|_| VoicePool::new(config.sample_rate, config.tuning)),
            notes: ArrayVec::new(),
            sample_bank,
            square_keys,
            archive_keys: Default::default(),
            bank: InstrumentBank::default(),
            notes_on: [0; TRACK_COUNT],
            next_note_id: 1,
            jumps: 0,
            warnings: 0,
        }
    }

    fn warn(&mut self) {
        self.warnings += 1;
    }

    fn reset(&mut self) {
        for pool in &mut self.pools {
            pool.cut_all();
            pool.set_finetune(0.0);
        }
        self.notes.clear();
        self.notes_on = [0; TRACK_COUNT];
    }

    fn set_note_on(&mut self, track: u8, key: u8, on: bool) {
        if let Some(bits) = self.notes_on.get_mut(track as usize) {
            let mask = 1u128 << (key & 0x7F);
            if on {
                *bits |= mask;
            } else {
                *bits &= !mask;
            }
        }
    }

    fn release_note(&mut self, index: usize) {
        let note = &mut self.notes[index];
        if note.envelope.release() {
            let (track, key) = (note.track, note.midi_note);
            self.set_note_on(track, key, false);
        }
    }

    fn release_track(&mut self, track: u8) {
        for i in 0..self.notes.len() {
            if self.notes[i].track == track {
                self.release_note(i);
            }
        }
    }

    /// Forget a note and unblock anything waiting on it.
    fn destroy_note(&mut self, sequence: &mut Sequence, index: usize) {
        let note = self.notes.remove(index);
        self.set_note_on(note.track, note.midi_note, false);
        if let Some(track) = sequence.track_mut(note.track as usize) {
            if track.last_active == Some(note.id) {
                track.last_active = None;
            }
            if track.waiting_for == Some(note.id) {
                track.waiting_for = None;
                track.resting_until_voice_ends = false;
                track.resting_forever = false;
            }
        }
    }

    fn destroy_note_id(&mut self, sequence: &mut Sequence, id: NoteId) {
        if let Some(index) = self.notes.iter().position(|n| n.id == id) {
            self.destroy_note(sequence, index);
        }
    }

    /// Push a note's sweep and pitch LFO into its voice.
    fn apply_finetune(&mut self, index: usize, target: LfoTarget) {
        let note = &self.notes[index];
        let pitch_lfo = if target == LfoTarget::Pitch { note.lfo_value } else { 0 };
        let offset = note.finetune_offset(pitch_lfo);
        if let Some(voice) = self.pools[note.track as usize].get_mut(note.voice) {
            voice.set_finetune_lfo(offset);
        }
    }

    /// Per-sequence-tick work done before the tracks run.
    fn before_sequence_tick(&mut self, sequence: &Sequence) {
        for i in 0..self.notes.len() {
            let note = &mut self.notes[i];
            if !note.auto_sweep && note.sweep_counter != 0 {
                note.sweep_counter -= 1;
            }
            let target = sequence
                .track(note.track as usize)
                .map_or(LfoTarget::Pitch, |t| t.lfo.target);
            self.apply_finetune(i, target);
        }
    }

    /// Give up on a note that could not be resolved.
    fn drop_note(&mut self, sequence: &mut Sequence, track: u8, duration: i32) {
        self.warn();
        if duration == 0 {
            if let Some(t) = sequence.track_mut(track as usize) {
                t.resting_until_voice_ends = false;
            }
        }
    }

    fn play_note(
        &mut self,
        sequence: &mut Sequence,
        track: u8,
        key: u8,
        velocity: u8,
        duration: i32,
        portamento_from: u8,
    ) {
        let Some(t) = sequence.track(track as usize) else {
            return;
        };
        let (mono, tie, program, last_active) = (t.mono, t.tie, t.program, t.last_active);
        let (volume, expression) = (t.volume, t.expression);
        let overrides = (t.attack, t.decay, t.sustain, t.release);
        let sweep_base = t.sweep_pitch as i32;
        let (portamento, portamento_time) = (t.portamento_enable, t.portamento_time);
        let waiting = t.resting_until_voice_ends;

        if mono && !tie {
            self.release_track(track);
        }

        if !PIANO_RANGE.contains(&key) {
            log::debug!("track {}: key {} outside piano range", track, key);
        }

        let Some(instrument) = self.bank.get(program) else {
            log::warn!("track {}: no instrument for program {}", track, program);
            return self.drop_note(sequence, track, duration);
        };
        if let InstrumentRecord::Empty = instrument {
            log::warn!("track {}: program {} is an empty instrument", track, program);
            return self.drop_note(sequence, track, duration);
        }
        let region = match instrument.resolve_region(key) {
            Ok(region) => region.clone(),
            Err(e) => {
                log::warn!("track {}: program {}: {}", track, program, e);
                return self.drop_note(sequence, track, duration);
            }
        };

        let sample_key = match region.kind {
            RegionKind::Sample => {
                let slot = region.wave_archive as usize;
                let Some(keys) = self.archive_keys.get(slot).and_then(Option::as_ref) else {
                    log::warn!("track {}: program {}: no wave archive in slot {}", track, program, slot);
                    return self.drop_note(sequence, track, duration);
                };
                match keys.get(region.sample_id as usize).copied().flatten() {
                    Some(key) => Some(key),
                    None => {
                        log::warn!(
                            "track {}: program {}: no sample {} in wave archive slot {}",
                            track, program, region.sample_id, slot
                        );
                        return self.drop_note(sequence, track, duration);
                    }
                }
            }
            RegionKind::PsgPulse => match self.square_keys.get(region.sample_id as usize) {
                Some(&key) => Some(key),
                None => {
                    log::warn!("track {}: square duty {} out of range", track, region.sample_id);
                    return self.drop_note(sequence, track, duration);
                }
            },
            RegionKind::PsgNoise => None,
        };
        let looping = match sample_key.and_then(|k| self.sample_bank.get(k)) {
            Some(sample) => sample.looping,
            None => true,
        };

        let midi_note = match region.kind {
            RegionKind::Sample => key as i32 - region.base_note as i32,
            _ => key as i32 + 60 - region.base_note as i32,
        };
        let adsr = region.adsr.with_overrides(overrides.0, overrides.1, overrides.2, overrides.3);
        let now = sequence.ticks_elapsed();
        let end_tick = now + duration.max(0) as u64;
        let infinite = duration == 0 || tie;

        let tied = match last_active {
            Some(id) if tie => self.notes.iter().position(|n| n.id == id),
            _ => None,
        };

        let index = if let Some(index) = tied {
            let note = &mut self.notes[index];
            let (old_key, voice) = (note.midi_note, note.voice);
            note.midi_note = key;
            note.velocity = velocity;
            note.infinite = infinite;
            note.end_tick = end_tick;
            note.envelope.set_rates(&adsr);
            if let Some(v) = self.pools[track as usize].get_mut(voice) {
                v.set_note(midi_note);
            }
            self.set_note_on(track, old_key, false);
            self.set_note_on(track, key, true);
            index
        } else {
            let decay = channel_decay(volume, expression);
            let initial = if adsr.attack_coeff == 0 {
                channel_volume(velocity, 0, decay, 0)
            } else {
                0.0
            };
            let id = self.next_note_id;
            self.next_note_id = self.next_note_id.wrapping_add(1).max(1);

            let bank = &self.sample_bank;
            let sample = sample_key.and_then(|k| bank.get(k));
            let (voice, stolen) = self.pools[track as usize].play(|v, finetune| {
                v.start(region.kind, sample_key, sample, midi_note, finetune, initial, id)
            });
            if let Some(old) = stolen {
                self.destroy_note_id(sequence, old);
            }

            let note = ActiveNote {
                id,
                track,
                voice,
                midi_note: key,
                velocity,
                start_tick: now,
                end_tick,
                infinite,
                envelope: Envelope::new(&adsr),
                decay,
                lfo: Lfo::default(),
                lfo_value: 0,
                sweep_pitch: 0,
                sweep_counter: 0,
                sweep_length: 0,
                auto_sweep: false,
                kind: region.kind,
            };
            if self.notes.try_push(note).is_err() {
                log::warn!("track {}: note table full", track);
                self.warn();
                self.pools[track as usize].cut(voice);
                return;
            }
            self.set_note_on(track, key, true);
            if let Some(t) = sequence.track_mut(track as usize) {
                t.last_active = Some(id);
            }
            self.notes.len() - 1
        };
        let id = self.notes[index].id;

        if waiting && duration == 0 && mono {
            if let Some(t) = sequence.track_mut(track as usize) {
                t.waiting_for = Some(id);
                if region.kind == RegionKind::PsgNoise || looping {
                    t.resting_forever = true;
                }
            }
            let all_forever = sequence
                .tracks()
                .iter()
                .filter(|t| t.active)
                .all(|t| t.resting_forever);
            if all_forever {
                log::debug!("all active tracks rest forever");
                sequence.set_status(SequenceStatus::AllTracksRestingForever);
            }
        }

        let mut sweep_pitch = sweep_base;
        if portamento != 0 {
            sweep_pitch += (portamento_from as i32 - key as i32) << 6;
        }
        let (sweep_length, auto_sweep) = if portamento_time != 0 {
            let time = portamento_time as i64;
            (((time * time * (sweep_pitch as i64).abs()) >> 11) as i32, true)
        } else {
            (duration, false)
        };
        let note = &mut self.notes[index];
        note.sweep_pitch = sweep_pitch;
        note.sweep_counter = sweep_length;
        note.sweep_length = sweep_length;
        note.auto_sweep = auto_sweep;
        let target = sequence
            .track(track as usize)
            .map_or(LfoTarget::Pitch, |t| t.lfo.target);
        self.apply_finetune(index, target);
    }

    /// Per-engine-tick note processing.
    fn update_notes(&mut self, sequence: &mut Sequence) {
        let now = sequence.ticks_elapsed();
        let mut i = 0;
        while i < self.notes.len() {
            let (id, track, voice) = {
                let n = &self.notes[i];
                (n.id, n.track as usize, n.voice)
            };
            let ended = match self.pools[track].get(voice) {
                Some(v) if v.playing && v.note_id == id => v.has_ended(),
                _ => {
                    self.destroy_note(sequence, i);
                    continue;
                }
            };
            if ended {
                self.pools[track].cut(voice);
                self.destroy_note(sequence, i);
                continue;
            }

            let Some(t) = sequence.track(track) else {
                i += 1;
                continue;
            };
            let lfo_params = t.lfo;
            let pan = t.pan;
            let decay = channel_decay(t.volume, t.expression);

            if !self.notes[i].infinite && now >= self.notes[i].end_tick {
                self.release_note(i);
            }

            let note = &mut self.notes[i];
            note.lfo_value = note.lfo.advance(&lfo_params);
            if note.auto_sweep && note.sweep_pitch != 0 && note.sweep_counter != 0 {
                note.sweep_counter -= 1;
            }
            self.apply_finetune(i, lfo_params.target);

            let note = &mut self.notes[i];
            let releasing = note.envelope.is_releasing();
            let alive = note.envelope.advance();
            if !releasing {
                note.decay = decay;
            }
            if !alive {
                self.pools[track].cut(voice);
                self.destroy_note(sequence, i);
                continue;
            }

            let lfo = note.lfo_value;
            let volume_lfo = if lfo_params.target == LfoTarget::Volume { lfo } else { 0 };
            let pan_lfo = if lfo_params.target == LfoTarget::Pan { lfo } else { 0 };
            let volume = channel_volume(note.velocity, note.envelope.timer, note.decay, volume_lfo);
            let pool = &mut self.pools[track];
            if let Some(v) = pool.get_mut(voice) {
                v.volume = volume;
            }
            pool.pan = channel_pan(pan as i32, pan_lfo);
            i += 1;
        }
    }
}

impl MessageHandler for Voices {
    fn handle(&mut self, sequence: &mut Sequence, message: Message) -> Result<(), EngineError> {
        let [p0, p1, p2, p3] = message.params;
        match message.kind {
            MessageKind::PlayNote => {
                self.play_note(sequence, message.track, p0 as u8, p1 as u8, p2, p3 as u8);
            }
            MessageKind::Jump => self.jumps += 1,
            MessageKind::TrackEnded => {
                self.release_track(message.track);
                if sequence.tracks().iter().all(|t| !t.active) {
                    sequence.set_status(SequenceStatus::AllTracksFinished);
                }
            }
            MessageKind::PitchBend => {
                // bend is in 1/64 semitone steps scaled by half the range
                let semitones = p0 as f64 * (p1 as f64 / 2.0) / 64.0;
                if let Some(pool) = self.pools.get_mut(message.track as usize) {
                    match self.config.mixing {
                        MixMode::Accurate => pool.target_finetune(semitones),
                        MixMode::Direct => pool.set_finetune(semitones),
                    }
                }
            }
            MessageKind::TieChange => self.release_track(message.track),
            MessageKind::InstrumentChange | MessageKind::VolumeChange | MessageKind::PanChange => {}
        }
        Ok(())
    }
}

/// Plays one song at a time.
pub struct Controller {
    config: EngineConfig,
    sequence: Option<Box<Sequence>>,
    voices: Voices,
    /// Tempo accumulator in 1/240 beat units
    bpm_timer: u32,
    /// Cycle accumulator pacing engine ticks against output samples
    frame_timer: u64,
    fault: Option<EngineError>,
    track_enabled: [bool; TRACK_COUNT],
    master_gain: f32,
    master_peak: Frame,
}

impl Controller {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sequence: None,
            voices: Voices::new(config),
            bpm_timer: 0,
            frame_timer: 0,
            fault: None,
            track_enabled: [true; TRACK_COUNT],
            master_gain: 1.0,
            master_peak: Frame::silence(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start playing `song` from its first tick.
    ///
    /// Samples of the previous song are released. Wave-archive carry-over
    /// happens on the [`SongData`] before it is loaded.
    pub fn load(&mut self, mut song: SongData) {
        self.voices.reset();
        for slot in 0..WAVE_ARCHIVE_SLOTS {
            let incoming = song.wave_archives[slot].take();
            if let Some(old) = self.voices.archive_keys[slot].take() {
                for key in old.into_iter().flatten() {
                    self.voices.sample_bank.remove(key);
                }
            }
            self.voices.archive_keys[slot] = incoming.map(|archive| {
                archive
                    .into_iter()
                    .map(|sample| sample.map(|s| self.voices.sample_bank.insert(s)))
                    .collect()
            });
        }
        self.voices.bank = core::mem::take(&mut song.bank);

        let seed = self.config.rng_seed.unwrap_or(0);
        log::debug!("loading song: start pc {:#08x}, seed {:#010x}", song.start_pc, seed);
        self.sequence = Some(Box::new(Sequence::new(song.program, song.start_pc as usize, seed)));
        self.voices.jumps = 0;
        self.voices.warnings = 0;
        self.bpm_timer = 0;
        self.frame_timer = 0;
        self.fault = None;
    }

    /// Stop the song and silence all voices.
    pub fn unload(&mut self) {
        self.sequence = None;
        self.voices.reset();
    }

    pub fn is_loaded(&self) -> bool {
        self.sequence.is_some()
    }

    fn abort(&mut self, error: EngineError) -> EngineError {
        log::error!("song aborted: {}", error);
        if let Some(sequence) = self.sequence.take() {
            self.voices.warnings += sequence.warnings();
        }
        self.voices.reset();
        self.fault = Some(error);
        error
    }

    /// Run as many sequence ticks as the tempo accumulator allows.
    pub fn update_sequence(&mut self) -> Result<(), EngineError> {
        let Some(sequence) = self.sequence.as_deref_mut() else {
            return Ok(());
        };
        self.bpm_timer += sequence.bpm() as u32;
        while self.bpm_timer >= BPM_TICK {
            self.bpm_timer -= BPM_TICK;
            self.voices.before_sequence_tick(sequence);
            if let Err(e) = sequence.tick_with(&mut self.voices) {
                return Err(self.abort(e));
            }
        }
        Ok(())
    }

    /// One engine tick: sequence, then every active note.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        self.update_sequence()?;
        if let Some(sequence) = self.sequence.as_deref_mut() {
            self.voices.update_notes(sequence);
        }
        Ok(())
    }

    /// Start a note on `track` as if the track had played it.
    pub fn play_note(&mut self, track: u8, key: u8, velocity: u8, duration: i32) {
        let Some(sequence) = self.sequence.as_deref_mut() else {
            return;
        };
        let Some(from) = sequence.track(track as usize).map(|t| t.portamento_key) else {
            return;
        };
        self.voices.play_note(sequence, track, key, velocity, duration, from);
        if let Some(t) = sequence.track_mut(track as usize) {
            t.portamento_key = key;
        }
    }

    /// Produce one output frame, running engine ticks as they fall due.
    ///
    /// After a fault every frame is silent.
    pub fn render_frame(&mut self) -> Result<Frame, EngineError> {
        if self.fault.is_some() {
            return Ok(Frame::silence());
        }
        self.frame_timer += ARM7_CLOCK as u64;
        let tick_cycles = CYCLES_PER_TICK * self.config.sample_rate.max(1) as u64;
        while self.frame_timer >= tick_cycles {
            self.frame_timer -= tick_cycles;
            self.tick()?;
        }
        Ok(self.next_mixed_sample())
    }

    /// Mix one sample from all track pools without ticking.
    pub fn next_mixed_sample(&mut self) -> Frame {
        let accurate = self.config.mixing == MixMode::Accurate;
        let bank = &self.voices.sample_bank;
        let mut mix = Frame::silence();
        for (pool, enabled) in self.voices.pools.iter_mut().zip(self.track_enabled) {
            if accurate {
                pool.update_finetune();
            }
            let out = pool.next_sample(bank);
            out.track_peak(&mut pool.peak, PEAK_DECAY);
            if enabled {
                mix.mix(out);
            }
        }
        let out = match self.config.mixing {
            MixMode::Accurate => mix.clamp(2.0).scale(0.5),
            MixMode::Direct => mix,
        }
        .scale(self.master_gain);
        out.track_peak(&mut self.master_peak, PEAK_DECAY);
        out
    }

    pub fn set_track_enabled(&mut self, track: usize, enabled: bool) {
        if let Some(slot) = self.track_enabled.get_mut(track) {
            *slot = enabled;
        }
    }

    pub fn track_enabled(&self, track: usize) -> bool {
        self.track_enabled.get(track).copied().unwrap_or(false)
    }

    pub fn set_track_gain(&mut self, track: usize, gain: f32) {
        if let Some(pool) = self.voices.pools.get_mut(track) {
            pool.gain = gain.max(0.0);
        }
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.max(0.0);
    }

    /// Freeze the tracks. Sounding notes keep running their envelopes.
    pub fn set_paused(&mut self, paused: bool) {
        if let Some(sequence) = self.sequence.as_deref_mut() {
            sequence.set_paused(paused);
        }
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.config.tuning = tuning;
        self.voices.config.tuning = tuning;
        for pool in &mut self.voices.pools {
            pool.set_tuning(tuning);
        }
    }

    /// Seed used by the next [`load`](Controller::load).
    pub fn set_seed(&mut self, seed: Option<u32>) {
        self.config.rng_seed = seed;
        self.voices.config.rng_seed = seed;
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_deref()
    }

    pub fn status(&self) -> SequenceStatus {
        self.sequence.as_ref().map_or(SequenceStatus::Normal, |s| s.status())
    }

    pub fn notes(&self) -> &[ActiveNote] {
        &self.voices.notes
    }

    pub fn pool(&self, track: usize) -> Option<&VoicePool> {
        self.voices.pools.get(track)
    }

    /// Bank key of sample `id` in wave-archive slot `slot`.
    pub fn sample_key(&self, slot: usize, id: usize) -> Option<SampleKey> {
        self.voices.archive_keys.get(slot)?.as_ref()?.get(id).copied().flatten()
    }

    pub fn jumps(&self) -> u32 {
        self.voices.jumps
    }

    /// Whether every sounding note has reached zero volume.
    pub fn is_silent(&self) -> bool {
        self.voices.notes.iter().all(|n| {
            self.voices.pools[n.track as usize]
                .get(n.voice)
                .map_or(true, |v| v.volume == 0.0)
        })
    }

    /// Non-fatal problems seen since the song was loaded.
    pub fn warnings(&self) -> u32 {
        self.voices.warnings + self.sequence.as_ref().map_or(0, |s| s.warnings())
    }

    /// The error that aborted the current song, if any.
    pub fn fault(&self) -> Option<EngineError> {
        self.fault
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            notes_on: self.voices.notes_on,
            track_peaks: core::array::from_fn(|i| self.voices.pools[i].peak),
            master_peak: self.master_peak,
            ticks: self.sequence.as_ref().map_or(0, |s| s.ticks_elapsed()),
            jumps: self.voices.jumps,
            status: self.status(),
            warnings: self.warnings(),
            fault: self.fault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope_state::AdsrState;
    use alloc::vec;
    use ns_ir::{Adsr, InstrumentRegion, SharedBytes};

    fn region(sample_id: u16, adsr: Adsr) -> InstrumentRegion {
        InstrumentRegion {
            kind: RegionKind::Sample,
            sample_id,
            wave_archive: 0,
            base_note: 60,
            adsr,
            pan: 64,
        }
    }

    fn looping_sample(level: f32) -> Option<Sample> {
        Some(Sample::new(vec![level; 256], 32768, 0, true, 0))
    }

    fn song(program: &[u8], instrument: InstrumentRecord) -> SongData {
        let mut song = SongData {
            program: SharedBytes::from(program),
            bank: InstrumentBank::new(vec![instrument]),
            ..Default::default()
        };
        song.wave_archives[0] = Some(vec![looping_sample(0.25), looping_sample(0.5), looping_sample(0.75)]);
        song
    }

    fn controller(program: &[u8], instrument: InstrumentRecord) -> Controller {
        let config = EngineConfig { rng_seed: Some(0), ..Default::default() };
        let mut c = Controller::new(config);
        c.load(song(program, instrument));
        c
    }

    fn ticks(c: &Controller) -> u64 {
        c.sequence().map_or(0, |s| s.ticks_elapsed())
    }

    /// Tick until the sequence has advanced to `tick`.
    fn run_to(c: &mut Controller, tick: u64) {
        while ticks(c) < tick {
            c.tick().unwrap();
        }
    }

    #[test]
    fn single_note_walks_through_envelope() {
        // tempo 240, note 60 vel 127 dur 48, end
        let program = [0xE1, 0xF0, 0x00, 0x3C, 0x7F, 0x30, 0xFF];
        let adsr = Adsr::new(100, 127, 127, 100);
        let mut c = controller(&program, InstrumentRecord::SingleSample(region(0, adsr)));

        run_to(&mut c, 1);
        assert_eq!(c.notes().len(), 1);
        assert!(c.telemetry().note_on(0, 60));

        let mut seen = [false; 3];
        while ticks(&c) < 48 {
            c.tick().unwrap();
            assert_eq!(c.notes().len(), 1);
            match c.notes()[0].envelope.state {
                AdsrState::Attack => seen[0] = true,
                AdsrState::Decay => seen[1] = true,
                AdsrState::Sustain => seen[2] = true,
                AdsrState::Release => panic!("released early at tick {}", ticks(&c)),
            }
        }
        assert_eq!(seen, [true, true, true]);
        assert_eq!(c.notes()[0].envelope.state, AdsrState::Sustain);

        c.tick().unwrap();
        assert_eq!(ticks(&c), 49);
        assert_eq!(c.notes()[0].envelope.state, AdsrState::Release);
        assert!(!c.telemetry().note_on(0, 60));
        assert_eq!(c.status(), SequenceStatus::AllTracksFinished);

        let mut last = c.notes()[0].envelope.timer;
        let mut guard = 0;
        while !c.notes().is_empty() {
            c.tick().unwrap();
            if let Some(note) = c.notes().first() {
                assert!(note.envelope.timer <= last);
                last = note.envelope.timer;
            }
            guard += 1;
            assert!(guard < 10_000);
        }
        assert!(last <= ns_ir::ENVELOPE_FLOOR);
        assert_eq!(c.pool(0).map(|p| p.active_count()), Some(0));
        assert_eq!(c.warnings(), 0);
    }

    #[test]
    fn drumset_note_out_of_range_warns_once() {
        let drums = InstrumentRecord::Drumset {
            lower: 50,
            upper: 60,
            regions: (0..11).map(|_| region(0, Adsr::new(127, 127, 127, 127))).collect(),
        };
        let mut c = controller(&[0x28, 0x7F, 0x01, 0xFF], drums);
        run_to(&mut c, 3);
        assert!(c.notes().is_empty());
        assert_eq!(c.pool(0).map(|p| p.active_count()), Some(0));
        assert_eq!(c.warnings(), 1);
    }

    #[test]
    fn multi_sample_selects_first_region_ending_at_or_above_note() {
        let mut region_ends = ArrayVec::new();
        let mut regions = ArrayVec::new();
        for (i, end) in [40u8, 80, 127].into_iter().enumerate() {
            region_ends.push(end);
            regions.push(region(i as u16, Adsr::new(127, 127, 127, 127)));
        }
        let multi = InstrumentRecord::MultiSample { region_ends, regions };
        // poly; notes 39, 40, 81; rest 96 so the end does not release them
        let program = [0xC7, 0x00, 0x27, 0x7F, 0x10, 0x28, 0x7F, 0x10, 0x51, 0x7F, 0x10, 0x80, 0x60, 0xFF];
        let mut c = controller(&program, multi);
        run_to(&mut c, 1);
        let keys: Vec<_> = c
            .notes()
            .iter()
            .map(|n| c.pool(0).and_then(|p| p.get(n.voice)).and_then(|v| v.sample_key))
            .collect();
        assert_eq!(keys, vec![c.sample_key(0, 0), c.sample_key(0, 0), c.sample_key(0, 2)]);
    }

    #[test]
    fn missing_instrument_drops_note_and_unblocks_track() {
        // program 5 (absent), note with duration 0, volume 10
        let program = [0x81, 0x05, 0x3C, 0x7F, 0x00, 0xC1, 0x0A, 0xFF];
        let mut c = controller(&program, InstrumentRecord::Empty);
        run_to(&mut c, 2);
        assert_eq!(c.warnings(), 1);
        let track = c.sequence().and_then(|s| s.track(0)).cloned();
        assert_eq!(track.map(|t| t.volume), Some(10));
    }

    #[test]
    fn looping_zero_duration_note_rests_forever() {
        let program = [0x3C, 0x7F, 0x00, 0xFF];
        let mut c = controller(&program, InstrumentRecord::SingleSample(region(0, Adsr::new(127, 127, 127, 127))));
        run_to(&mut c, 20);
        assert_eq!(c.status(), SequenceStatus::AllTracksRestingForever);
        assert_eq!(c.notes().len(), 1);
        assert!(c.notes()[0].infinite);
    }

    #[test]
    fn sixteen_note_polyphony_steals_oldest() {
        // poly, 17 notes with long durations on one tick
        let mut program = vec![0xC7, 0x00];
        for key in 40..57u8 {
            program.extend_from_slice(&[key, 0x7F, 0x60]);
        }
        program.extend_from_slice(&[0x80, 0x60, 0xFF]);
        let mut c = controller(&program, InstrumentRecord::SingleSample(region(0, Adsr::new(127, 127, 127, 127))));
        run_to(&mut c, 1);
        assert_eq!(c.notes().len(), VOICES_PER_TRACK);
        assert!(c.notes().iter().all(|n| n.midi_note != 40));
        assert!(!c.telemetry().note_on(0, 40));
        assert!(c.telemetry().note_on(0, 56));
    }

    #[test]
    fn renders_audio_and_mutes_tracks() {
        let program = [0x3C, 0x7F, 0x00, 0xFF];
        let mut c = controller(&program, InstrumentRecord::SingleSample(region(2, Adsr::new(127, 127, 127, 127))));
        let mut peak = 0.0f32;
        for _ in 0..2000 {
            let f = c.render_frame().unwrap();
            peak = peak.max(f.left.abs());
        }
        assert!(peak > 0.05);
        assert!(c.telemetry().master_peak.left > 0.05);

        c.set_track_enabled(0, false);
        for _ in 0..10 {
            assert_eq!(c.render_frame().unwrap(), Frame::silence());
        }
    }

    #[test]
    fn fault_aborts_song_and_silences() {
        let mut c = controller(&[0x95, 0, 0, 0], InstrumentRecord::Empty);
        let mut result = Ok(());
        for _ in 0..4 {
            result = c.tick();
            if result.is_err() {
                break;
            }
        }
        assert_eq!(result, Err(EngineError::StackOverflow { track: 0 }));
        assert_eq!(c.fault(), Some(EngineError::StackOverflow { track: 0 }));
        assert!(!c.is_loaded());
        assert_eq!(c.render_frame(), Ok(Frame::silence()));
    }

    #[test]
    fn reload_replaces_previous_samples() {
        let mut c = controller(&[0xFF], InstrumentRecord::Empty);
        let first = c.sample_key(0, 1);
        assert!(first.is_some());

        let mut next = song(&[0xFF], InstrumentRecord::Empty);
        next.wave_archives[0] = None;
        c.load(next);
        assert_eq!(c.sample_key(0, 1), None);
    }

    #[test]
    fn pitch_bend_glides_in_accurate_mode() {
        // bend range 12, bend +64 (half range up)
        let program = [0xC5, 0x0C, 0xC4, 0x40, 0x3C, 0x7F, 0x00, 0xFF];
        let mut c = controller(&program, InstrumentRecord::SingleSample(region(0, Adsr::new(127, 127, 127, 127))));
        run_to(&mut c, 1);
        let start = c.pool(0).map_or(0.0, |p| p.finetune);
        assert!(start < 1.0);
        for _ in 0..20_000 {
            c.next_mixed_sample();
        }
        let settled = c.pool(0).map_or(0.0, |p| p.finetune);
        assert!((settled - 6.0).abs() < 1e-9);
    }

    #[test]
    fn external_notes_track_gain_and_pause() {
        // rest 96 ticks, end
        let program = [0x80, 0x60, 0xFF];
        let mut c = controller(&program, InstrumentRecord::SingleSample(region(1, Adsr::new(127, 127, 127, 127))));
        // 120 bpm: every second engine tick runs the sequence
        c.update_sequence().unwrap();
        assert_eq!(ticks(&c), 0);
        c.update_sequence().unwrap();
        assert_eq!(ticks(&c), 1);

        c.play_note(0, 60, 127, 10);
        assert_eq!(c.notes().len(), 1);
        assert!(c.telemetry().note_on(0, 60));
        c.tick().unwrap();
        let loud = (0..64).map(|_| c.next_mixed_sample().left.abs()).fold(0.0f32, f32::max);
        assert!(loud > 0.05);

        c.set_track_gain(0, 0.0);
        assert_eq!(c.next_mixed_sample(), Frame::silence());

        c.set_paused(true);
        let before = c.sequence().map(|s| s.ticks_played());
        let target = ticks(&c) + 4;
        run_to(&mut c, target);
        assert_eq!(c.sequence().map(|s| s.ticks_played()), before);
    }
}
