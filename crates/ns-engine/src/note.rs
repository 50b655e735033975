//! Bookkeeping for one sounding note.

use ns_ir::RegionKind;

use crate::envelope_state::Envelope;
use crate::lfo::Lfo;

/// Engine-wide unique note identifier.
pub type NoteId = u32;

/// A note bound to a voice slot of its track's pool.
#[derive(Clone, Copy, Debug)]
pub struct ActiveNote {
    pub id: NoteId,
    pub track: u8,
    /// Slot in the track's voice pool
    pub voice: usize,
    /// Key as played, before base-note transposition
    pub midi_note: u8,
    pub velocity: u8,
    pub start_tick: u64,
    /// Tick at which the note is released
    pub end_tick: u64,
    /// Duration 0 or tied: only released explicitly
    pub infinite: bool,
    pub envelope: Envelope,
    /// Track attenuation, frozen once the note is released
    pub decay: i32,
    pub lfo: Lfo,
    pub lfo_value: i32,
    /// Portamento/sweep offset in 1/64 semitones
    pub sweep_pitch: i32,
    pub sweep_counter: i32,
    pub sweep_length: i32,
    /// Sweep runs per engine tick rather than per sequence tick
    pub auto_sweep: bool,
    pub kind: RegionKind,
}

impl ActiveNote {
    /// Pitch offset in semitones from the sweep and a pitch LFO.
    pub fn finetune_offset(&self, pitch_lfo: i32) -> f64 {
        let sweep = if self.sweep_pitch != 0 && self.sweep_counter != 0 && self.sweep_length != 0 {
            self.sweep_pitch as f64 * (self.sweep_counter as f64 / self.sweep_length as f64)
        } else {
            0.0
        };
        (sweep + pitch_lfo as f64) / 64.0
    }
}
