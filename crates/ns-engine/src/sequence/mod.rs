//! Sequence virtual machine.
//!
//! Sixteen cooperative tracks share one program, 32 variables, a random
//! generator and a bounded message queue. Each tick every active track
//! runs instructions until it has to rest; the messages it produces are
//! handed to a [`MessageHandler`] (the voice layer) as they are emitted,
//! so the handler can block the track before its next instruction.

pub mod opcode;
mod track;

use heapless::Deque;
use ns_ir::{Message, SharedBytes};

use crate::error::EngineError;

pub use opcode::{command_length, Opcode, VarOp};
pub use track::{SequenceTrack, TrackStart, STACK_DEPTH};

/// Number of sequence tracks.
pub const TRACK_COUNT: usize = 16;

/// Number of sequence variables.
pub const VAR_COUNT: usize = 32;

/// Capacity of the pending message queue.
pub const MESSAGE_CAPACITY: usize = 1024;

/// Instructions one track may run in a single tick before it is
/// considered stuck in a loop that never rests.
pub const MAX_STEPS_PER_TICK: u32 = 65_536;

/// Default tempo in beats per minute.
pub const DEFAULT_BPM: u16 = 120;

/// Playback state of a sequence as a whole.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SequenceStatus {
    #[default]
    Normal,
    AllTracksFinished,
    /// Every active track waits on a voice that never ends
    AllTracksRestingForever,
}

/// Consumer of track messages.
///
/// Called once per message, right after the instruction that produced
/// it, with the sequence available for updating track state.
pub trait MessageHandler {
    fn handle(&mut self, sequence: &mut Sequence, message: Message) -> Result<(), EngineError>;
}

/// State shared by all tracks.
#[derive(Clone, Debug)]
pub struct VmState {
    pub program: SharedBytes,
    vars: [i16; VAR_COUNT],
    rng: u32,
    pub bpm: u16,
    messages: Deque<Message, MESSAGE_CAPACITY>,
    /// Non-fatal problems seen while executing
    pub warnings: u32,
}

impl VmState {
    fn new(program: SharedBytes, seed: u32) -> Self {
        let mut vars = [0i16; VAR_COUNT];
        for (i, var) in vars.iter_mut().enumerate() {
            if i % 8 == 0 {
                *var = -1;
            }
        }
        Self {
            program,
            vars,
            rng: seed,
            bpm: DEFAULT_BPM,
            messages: Deque::new(),
            warnings: 0,
        }
    }

    /// Queue a message for the handler.
    pub fn send(&mut self, message: Message) -> Result<(), EngineError> {
        self.messages
            .push_back(message)
            .map_err(|_| EngineError::MessageBufferOverflow)
    }

    /// Read variable `id` (masked to 0..32).
    pub fn read_var(&self, id: u8) -> i16 {
        self.vars[(id & 0x1F) as usize]
    }

    /// Write variable `id` (masked to 0..32).
    pub fn write_var(&mut self, id: u8, value: i16) {
        self.vars[(id & 0x1F) as usize] = value;
    }

    /// Step the linear congruential generator and return the new state.
    pub fn next_random(&mut self) -> u32 {
        self.rng = self.rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.rng
    }
}

/// A running sequence.
#[derive(Clone, Debug)]
pub struct Sequence {
    tracks: [SequenceTrack; TRACK_COUNT],
    vm: VmState,
    ticks_elapsed: u64,
    ticks_paused: u64,
    paused: bool,
    status: SequenceStatus,
}

impl Sequence {
    /// Create a sequence with track 0 starting at `start_pc`.
    pub fn new(program: SharedBytes, start_pc: usize, seed: u32) -> Self {
        let mut tracks: [SequenceTrack; TRACK_COUNT] =
            core::array::from_fn(|i| SequenceTrack::new(i as u8));
        tracks[0].active = true;
        tracks[0].pc = start_pc;
        Self {
            tracks,
            vm: VmState::new(program, seed),
            ticks_elapsed: 0,
            ticks_paused: 0,
            paused: false,
            status: SequenceStatus::Normal,
        }
    }

    /// Advance one tick, leaving messages queued for [`drain_message`].
    ///
    /// [`drain_message`]: Sequence::drain_message
    pub fn tick(&mut self) -> Result<(), EngineError> {
        self.step_tracks(None)
    }

    /// Advance one tick, dispatching each message to `handler` as soon
    /// as it is emitted.
    pub fn tick_with(&mut self, handler: &mut dyn MessageHandler) -> Result<(), EngineError> {
        self.step_tracks(Some(handler))
    }

    fn step_tracks(&mut self, mut handler: Option<&mut dyn MessageHandler>) -> Result<(), EngineError> {
        self.ticks_elapsed += 1;
        if self.paused {
            self.ticks_paused += 1;
            return Ok(());
        }

        for i in 0..TRACK_COUNT {
            let mut steps = 0u32;
            while self.tracks[i].active
                && self.tracks[i].resting_for == 0
                && !self.tracks[i].resting_until_voice_ends
            {
                steps += 1;
                if steps > MAX_STEPS_PER_TICK {
                    log::error!("track {} executed {} instructions without resting", i, steps - 1);
                    return Err(EngineError::RunawayTrack { track: i as u8 });
                }

                if let Some(start) = self.tracks[i].execute(&mut self.vm)? {
                    self.start_track(start.track, start.pc);
                }
                if let Some(handler) = handler.as_deref_mut() {
                    while let Some(message) = self.drain_message() {
                        handler.handle(self, message)?;
                    }
                }
            }

            let track = &mut self.tracks[i];
            if track.active && !track.resting_until_voice_ends {
                track.resting_for = track.resting_for.saturating_sub(1).max(0);
            }
        }

        self.vm.next_random();
        self.vm.next_random();

        if self.status == SequenceStatus::Normal && self.tracks.iter().all(|t| !t.active) {
            log::debug!("all tracks finished after {} ticks", self.ticks_elapsed);
            self.status = SequenceStatus::AllTracksFinished;
        }
        Ok(())
    }

    /// Activate track `track` at `pc`, keeping the rest of its state.
    /// Out-of-range tracks are ignored.
    pub fn start_track(&mut self, track: u8, pc: usize) {
        let Some(slot) = self.tracks.get_mut(track as usize) else {
            log::warn!("open track {} out of range", track);
            self.vm.warnings += 1;
            return;
        };
        slot.active = true;
        slot.pc = pc;
        log::debug!("track {} opened at {:#08x}", track, pc);
    }

    /// Stop track `track` without emitting a message.
    pub fn end_track(&mut self, track: u8) {
        if let Some(slot) = self.tracks.get_mut(track as usize) {
            slot.active = false;
        }
    }

    /// Pop the oldest pending message, stamped with the current tick.
    pub fn drain_message(&mut self) -> Option<Message> {
        let mut message = self.vm.messages.pop_front()?;
        message.timestamp = self.ticks_played();
        Some(message)
    }

    pub fn read_var(&self, id: u8) -> i16 {
        self.vm.read_var(id)
    }

    pub fn write_var(&mut self, id: u8, value: i16) {
        self.vm.write_var(id, value);
    }

    pub fn next_random(&mut self) -> u32 {
        self.vm.next_random()
    }

    pub fn status(&self) -> SequenceStatus {
        self.status
    }

    pub fn set_status(&mut self, status: SequenceStatus) {
        self.status = status;
    }

    pub fn track(&self, index: usize) -> Option<&SequenceTrack> {
        self.tracks.get(index)
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut SequenceTrack> {
        self.tracks.get_mut(index)
    }

    pub fn tracks(&self) -> &[SequenceTrack] {
        &self.tracks
    }

    pub fn bpm(&self) -> u16 {
        self.vm.bpm
    }

    /// Ticks since start, paused ticks included.
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }

    /// Ticks the tracks actually ran for.
    pub fn ticks_played(&self) -> u64 {
        self.ticks_elapsed - self.ticks_paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Non-fatal problems counted so far.
    pub fn warnings(&self) -> u32 {
        self.vm.warnings
    }
}
