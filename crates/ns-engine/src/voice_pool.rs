//! VoicePool: the 16 voices of one track, with round-robin allocation.

use ns_ir::{Sample, SampleKey};
use slotmap::SlotMap;

use crate::config::Tuning;
use crate::frame::Frame;
use crate::note::NoteId;
use crate::voice::Voice;

/// Identifier for a voice slot in a pool.
pub type VoiceId = usize;

/// Voices per track.
pub const VOICES_PER_TRACK: usize = 16;

/// Spring constants for gliding toward a new pitch bend.
const SPRING_CONSTANT: f64 = 0.00001;
/// Critically damped: `2 * sqrt(SPRING_CONSTANT)`
const SPRING_DAMPING: f64 = 0.006324;

/// Voices, pan, gain and pitch bend of one track.
#[derive(Clone, Debug)]
pub struct VoicePool {
    pub(crate) slots: [Voice; VOICES_PER_TRACK],
    /// Next slot handed out, stealing whatever plays there
    next: VoiceId,
    /// 0 = left, 1 = right
    pub pan: f32,
    /// User track gain
    pub gain: f32,
    /// Current pitch bend in semitones
    pub finetune: f64,
    target_finetune: f64,
    finetune_velocity: f64,
    /// Last mixed output
    pub out: Frame,
    pub peak: Frame,
}

impl VoicePool {
    pub fn new(out_rate: u32, tuning: Tuning) -> Self {
        Self {
            slots: core::array::from_fn(|_| Voice::new(out_rate, tuning)),
            next: 0,
            pan: 0.5,
            gain: 1.0,
            finetune: 0.0,
            target_finetune: 0.0,
            finetune_velocity: 0.0,
            out: Frame::silence(),
            peak: Frame::silence(),
        }
    }

    /// Start a note on the next slot.
    ///
    /// Returns the slot and the note that was playing there, if any.
    pub fn play(
        &mut self,
        voice: impl FnOnce(&mut Voice, f64),
    ) -> (VoiceId, Option<NoteId>) {
        let id = self.next;
        self.next = (self.next + 1) % VOICES_PER_TRACK;
        let slot = &mut self.slots[id];
        let stolen = slot.playing.then_some(slot.note_id);
        if stolen.is_some() {
            slot.cut();
        }
        voice(slot, self.finetune);
        (id, stolen)
    }

    pub fn get(&self, id: VoiceId) -> Option<&Voice> {
        self.slots.get(id)
    }

    pub fn get_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.slots.get_mut(id)
    }

    /// Stop a voice immediately.
    pub fn cut(&mut self, id: VoiceId) {
        if let Some(voice) = self.slots.get_mut(id) {
            voice.cut();
        }
    }

    pub fn cut_all(&mut self) {
        for voice in &mut self.slots {
            voice.cut();
        }
        self.out = Frame::silence();
    }

    /// Count of playing voices.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|v| v.playing).count()
    }

    /// Aim the pitch bend at `semitones`, gliding there via [`update_finetune`].
    ///
    /// [`update_finetune`]: VoicePool::update_finetune
    pub fn target_finetune(&mut self, semitones: f64) {
        self.target_finetune = semitones;
    }

    /// Jump the pitch bend to `semitones` on every voice.
    pub fn set_finetune(&mut self, semitones: f64) {
        self.finetune = semitones;
        self.target_finetune = semitones;
        self.finetune_velocity = 0.0;
        for voice in &mut self.slots {
            voice.set_finetune(semitones);
        }
    }

    /// Step the critically damped glide one sample toward the target.
    pub fn update_finetune(&mut self) {
        if self.finetune == self.target_finetune && self.finetune_velocity == 0.0 {
            return;
        }
        let accel = (self.target_finetune - self.finetune) * SPRING_CONSTANT
            - self.finetune_velocity * SPRING_DAMPING;
        self.finetune_velocity += accel;
        self.finetune += self.finetune_velocity;
        if libm::fabs(self.target_finetune - self.finetune) < 0.001 && libm::fabs(self.finetune_velocity) < 0.0001 {
            self.finetune = self.target_finetune;
            self.finetune_velocity = 0.0;
        }
        for voice in &mut self.slots {
            voice.set_finetune(self.finetune);
        }
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        for voice in &mut self.slots {
            voice.set_tuning(tuning);
        }
    }

    /// Advance every playing voice one sample and pan the sum.
    pub fn next_sample(&mut self, bank: &SlotMap<SampleKey, Sample>) -> Frame {
        let mut mono_l = 0.0;
        let mut mono_r = 0.0;
        for voice in &mut self.slots {
            if !voice.playing {
                continue;
            }
            let sample = voice.sample_key.and_then(|key| bank.get(key));
            let out = voice.advance(sample);
            mono_l += out * (1.0 - self.pan);
            mono_r += out * self.pan;
        }
        self.out = Frame { left: mono_l, right: mono_r }.scale(self.gain);
        self.out
    }
}
