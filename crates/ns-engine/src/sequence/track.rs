//! One cooperative sequence thread.

use ns_ir::{Message, MessageKind, NO_OVERRIDE};

use super::opcode::{command_length, Opcode, VarOp};
use super::VmState;
use crate::error::EngineError;
use crate::lfo::{LfoParams, LfoTarget};
use crate::note::NoteId;

/// Depth of the call and loop stacks.
pub const STACK_DEPTH: usize = 64;

/// Pending replacement of the next instruction's last operand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ParamOverride {
    #[default]
    None,
    Random,
    Variable,
}

/// Request from one track to start another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackStart {
    pub track: u8,
    pub pc: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct LoopFrame {
    pc: u32,
    /// Remaining passes; 0 loops forever
    count: u8,
}

/// Execution state of one of the 16 sequence tracks.
#[derive(Clone, Debug)]
pub struct SequenceTrack {
    pub index: u8,
    pub active: bool,
    pub pc: usize,
    stack: [u32; STACK_DEPTH],
    sp: usize,
    loop_stack: [LoopFrame; STACK_DEPTH],
    loop_sp: usize,

    /// Ticks left before the next instruction
    pub resting_for: i32,
    /// Blocked until the voice in `waiting_for` ends
    pub resting_until_voice_ends: bool,
    /// Blocked on a voice that never ends on its own
    pub resting_forever: bool,
    pub waiting_for: Option<NoteId>,
    /// Most recent note, continued in place while tie is on
    pub last_active: Option<NoteId>,

    pub conditional: bool,
    param_override: ParamOverride,

    pub mono: bool,
    pub tie: bool,
    pub volume: u8,
    pub expression: u8,
    /// 0..=128, 64 is center
    pub pan: u8,
    pub priority: u8,
    pub master_volume: u8,
    pub program: u16,
    pub transpose: i8,
    pub pitch_bend: i8,
    pub bend_range: u8,
    pub lfo: LfoParams,
    pub portamento_enable: u8,
    pub portamento_key: u8,
    pub portamento_time: u8,
    pub sweep_pitch: i16,

    /// Envelope overrides; `NO_OVERRIDE` defers to the instrument
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
}

impl SequenceTrack {
    pub fn new(index: u8) -> Self {
        Self {
            index,
            active: false,
            pc: 0,
            stack: [0; STACK_DEPTH],
            sp: 0,
            loop_stack: [LoopFrame::default(); STACK_DEPTH],
            loop_sp: 0,
            resting_for: 0,
            resting_until_voice_ends: false,
            resting_forever: false,
            waiting_for: None,
            last_active: None,
            conditional: true,
            param_override: ParamOverride::None,
            mono: true,
            tie: false,
            volume: 127,
            expression: 127,
            pan: 64,
            priority: 0,
            master_volume: 127,
            program: 0,
            transpose: 0,
            pitch_bend: 0,
            bend_range: 2,
            lfo: LfoParams::default(),
            portamento_enable: 0,
            portamento_key: 60,
            portamento_time: 0,
            sweep_pitch: 0,
            attack: NO_OVERRIDE,
            decay: NO_OVERRIDE,
            sustain: NO_OVERRIDE,
            release: NO_OVERRIDE,
        }
    }

    /// Current call depth.
    pub fn call_depth(&self) -> usize {
        self.sp
    }

    /// Current loop nesting.
    pub fn loop_depth(&self) -> usize {
        self.loop_sp
    }

    fn push(&mut self, pc: usize) -> Result<(), EngineError> {
        if self.sp >= STACK_DEPTH {
            return Err(EngineError::StackOverflow { track: self.index });
        }
        self.stack[self.sp] = pc as u32;
        self.sp += 1;
        Ok(())
    }

    fn push_loop(&mut self, pc: usize, count: u8) -> Result<(), EngineError> {
        if self.loop_sp >= STACK_DEPTH {
            return Err(EngineError::LoopStackOverflow { track: self.index });
        }
        self.loop_stack[self.loop_sp] = LoopFrame { pc: pc as u32, count };
        self.loop_sp += 1;
        Ok(())
    }

    fn read_u8(&mut self, vm: &VmState) -> u8 {
        let byte = vm.program.get(self.pc).copied().unwrap_or(0);
        self.pc += 1;
        byte
    }

    /// Little-endian unsigned read of `bytes` bytes.
    fn read_le(&mut self, vm: &VmState, bytes: usize) -> u32 {
        (0..bytes).fold(0, |acc, i| acc | (self.read_u8(vm) as u32) << (i * 8))
    }

    fn read_var_len(&mut self, vm: &VmState) -> i32 {
        let mut value: u32 = 0;
        for _ in 0..4 {
            let byte = self.read_u8(vm);
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                break;
            }
        }
        value as i32
    }

    fn read_random(&mut self, vm: &mut VmState) -> i32 {
        self.param_override = ParamOverride::None;
        let min = self.read_le(vm, 2) as u16 as i16 as i64;
        let max = self.read_le(vm, 2) as u16 as i16 as i64;
        let span = max - min;
        if span == 0 {
            return min as i32;
        }
        if span == -1 {
            vm.next_random();
            return min as i32;
        }
        let draw = vm.next_random() as i64 % (span + 1);
        (min + draw.abs() * span.signum()) as i32
    }

    fn read_variable(&mut self, vm: &VmState) -> i32 {
        self.param_override = ParamOverride::None;
        let index = self.read_u8(vm);
        vm.read_var(index) as i32
    }

    /// Read a `bytes`-wide last operand, honoring a pending override.
    fn read_last(&mut self, vm: &mut VmState, bytes: usize) -> i32 {
        match self.param_override {
            ParamOverride::None => self.read_le(vm, bytes) as i32,
            ParamOverride::Random => self.read_random(vm),
            ParamOverride::Variable => self.read_variable(vm),
        }
    }

    fn read_last_var_len(&mut self, vm: &mut VmState) -> i32 {
        match self.param_override {
            ParamOverride::None => self.read_var_len(vm),
            ParamOverride::Random => self.read_random(vm),
            ParamOverride::Variable => self.read_variable(vm),
        }
    }

    /// Mark the track ended and tell the voice layer.
    fn finish(&mut self, vm: &mut VmState) -> Result<(), EngineError> {
        self.active = false;
        self.resting_for = 1;
        vm.send(Message::new(MessageKind::TrackEnded, self.index))
    }

    /// Execute exactly one instruction.
    ///
    /// Returns a request to start another track when the instruction
    /// opens one. Running past the end of the program ends the track.
    pub fn execute(&mut self, vm: &mut VmState) -> Result<Option<TrackStart>, EngineError> {
        let opcode_pc = self.pc;
        let Some(&byte) = vm.program.get(self.pc) else {
            log::warn!("track {}: ran past end of sequence data at {:#08x}", self.index, self.pc);
            vm.warnings += 1;
            self.finish(vm)?;
            return Ok(None);
        };
        self.pc += 1;
        let op = Opcode::from(byte);
        log::trace!("track {} {:#08x}: {:?}", self.index, opcode_pc, op);

        match op {
            Opcode::Note(key) => {
                let note = (key as i32 + self.transpose as i32).clamp(0, 127);
                let velocity = self.read_u8(vm);
                let duration = self.read_last_var_len(vm);
                if self.mono {
                    self.resting_for = duration;
                    if duration == 0 {
                        self.resting_until_voice_ends = true;
                    }
                }
                let previous_key = self.portamento_key;
                self.portamento_key = note as u8;
                vm.send(Message::with_params(
                    MessageKind::PlayNote,
                    self.index,
                    [note, velocity as i32, duration, previous_key as i32],
                ))?;
            }
            Opcode::Rest => {
                self.resting_for = self.read_last_var_len(vm).max(0);
            }
            Opcode::Program => {
                let value = self.read_last_var_len(vm) as u32;
                self.program = (value & 0x7FFF) as u16;
                log::debug!("track {}: program {}", self.index, self.program);
                vm.send(Message::with_params(
                    MessageKind::InstrumentChange,
                    self.index,
                    [self.program as i32, 0, 0, 0],
                ))?;
            }
            Opcode::OpenTrack => {
                let track = self.read_u8(vm);
                let pc = self.read_last(vm, 3) as u32 as usize;
                return Ok(Some(TrackStart { track, pc }));
            }
            Opcode::Jump => {
                let from = self.pc;
                let dest = self.read_last(vm, 3) as u32 as usize;
                self.pc = dest;
                log::debug!("track {}: jump {:#08x} -> {:#08x}", self.index, from, dest);
                vm.send(Message::with_params(
                    MessageKind::Jump,
                    self.index,
                    [from as i32, dest as i32, 0, 0],
                ))?;
            }
            Opcode::Call => {
                let dest = self.read_last(vm, 3) as u32 as usize;
                self.push(self.pc)?;
                self.pc = dest;
            }
            Opcode::Random => self.param_override = ParamOverride::Random,
            Opcode::Variable => self.param_override = ParamOverride::Variable,
            Opcode::If => {
                if !self.conditional {
                    self.pc += command_length(&vm.program, self.pc);
                }
            }
            Opcode::Var(var_op) => self.execute_var_op(var_op, vm),
            Opcode::Pan => {
                let value = self.read_last(vm, 1);
                self.pan = if value < 0 {
                    0
                } else if value >= 127 {
                    128
                } else {
                    value as u8
                };
                vm.send(Message::with_params(
                    MessageKind::PanChange,
                    self.index,
                    [self.pan as i32, 0, 0, 0],
                ))?;
            }
            Opcode::Volume => {
                self.volume = (self.read_last(vm, 1) as u8).min(127);
                self.send_volume(vm)?;
            }
            Opcode::Expression => {
                self.expression = (self.read_last(vm, 1) as u8).min(127);
                self.send_volume(vm)?;
            }
            Opcode::MasterVolume => {
                self.master_volume = self.read_last(vm, 1) as u8;
                log::warn!("track {}: master volume {} is not implemented", self.index, self.master_volume);
                vm.warnings += 1;
            }
            Opcode::Transpose => self.transpose = self.read_last(vm, 1) as i8,
            Opcode::PitchBend => {
                self.pitch_bend = self.read_last(vm, 1) as i8;
                self.send_pitch_bend(vm)?;
            }
            Opcode::BendRange => {
                self.bend_range = self.read_last(vm, 1) as u8;
                self.send_pitch_bend(vm)?;
            }
            Opcode::Priority => self.priority = self.read_last(vm, 1) as u8,
            Opcode::MonoPoly => self.mono = self.read_last(vm, 1) & 1 != 0,
            Opcode::Tie => {
                self.tie = self.read_last(vm, 1) & 1 != 0;
                self.last_active = None;
                vm.send(Message::with_params(
                    MessageKind::TieChange,
                    self.index,
                    [self.tie as i32, 0, 0, 0],
                ))?;
            }
            Opcode::PortamentoKey => {
                let key = self.read_last(vm, 1) + self.transpose as i32;
                self.portamento_key = key.clamp(0, 127) as u8;
                self.portamento_enable = 1;
            }
            Opcode::LfoDepth => self.lfo.depth = self.read_last(vm, 1) as u8,
            Opcode::LfoSpeed => self.lfo.speed = self.read_last(vm, 1) as u8,
            Opcode::LfoType => self.lfo.target = LfoTarget::from(self.read_last(vm, 1) as u8),
            Opcode::LfoRange => self.lfo.range = self.read_last(vm, 1) as u8,
            Opcode::Portamento => self.portamento_enable = self.read_last(vm, 1) as u8,
            Opcode::PortamentoTime => self.portamento_time = self.read_last(vm, 1) as u8,
            Opcode::Attack => self.attack = self.read_last(vm, 1) as u8,
            Opcode::Decay => self.decay = self.read_last(vm, 1) as u8,
            Opcode::Sustain => self.sustain = self.read_last(vm, 1) as u8,
            Opcode::Release => self.release = self.read_last(vm, 1) as u8,
            Opcode::LoopStart => {
                let count = self.read_last(vm, 1) as u8;
                self.push_loop(self.pc, count)?;
            }
            Opcode::LfoDelay => self.lfo.delay = self.read_last(vm, 2) as u16,
            Opcode::Tempo => {
                vm.bpm = self.read_last(vm, 2) as u16;
                log::debug!("track {}: tempo {}", self.index, vm.bpm);
            }
            Opcode::SweepPitch => self.sweep_pitch = self.read_last(vm, 2) as i16,
            Opcode::LoopEnd => {
                if self.loop_sp != 0 {
                    let top = self.loop_sp - 1;
                    let frame = &mut self.loop_stack[top];
                    let target = frame.pc as usize;
                    if frame.count != 0 {
                        frame.count -= 1;
                        if frame.count == 0 {
                            self.loop_sp -= 1;
                            return Ok(None);
                        }
                    } else {
                        vm.send(Message::with_params(
                            MessageKind::Jump,
                            self.index,
                            [self.pc as i32, target as i32, 0, 0],
                        ))?;
                    }
                    self.pc = target;
                }
            }
            Opcode::Return => {
                if self.sp != 0 {
                    self.sp -= 1;
                    self.pc = self.stack[self.sp] as usize;
                } else {
                    log::warn!("track {}: return without call at {:#08x}", self.index, opcode_pc);
                    vm.warnings += 1;
                }
            }
            Opcode::AllocateTracks => {
                let mask = self.read_le(vm, 2);
                log::trace!("track {}: allocate tracks {:#06x}", self.index, mask);
            }
            Opcode::End => {
                log::debug!("track {}: end of track", self.index);
                self.finish(vm)?;
            }
            Opcode::Unknown(byte) => {
                log::error!("track {}: unknown opcode {:#04x} at {:#08x}", self.index, byte, opcode_pc);
            }
        }
        Ok(None)
    }

    fn send_volume(&self, vm: &mut VmState) -> Result<(), EngineError> {
        vm.send(Message::with_params(
            MessageKind::VolumeChange,
            self.index,
            [self.volume as i32, self.expression as i32, 0, 0],
        ))
    }

    fn send_pitch_bend(&self, vm: &mut VmState) -> Result<(), EngineError> {
        vm.send(Message::with_params(
            MessageKind::PitchBend,
            self.index,
            [self.pitch_bend as i32, self.bend_range as i32, 0, 0],
        ))
    }

    fn execute_var_op(&mut self, op: VarOp, vm: &mut VmState) {
        let index = self.read_u8(vm);
        let operand = self.read_last(vm, 2) as i16;
        let current = vm.read_var(index);
        let (a, b) = (current as i32, operand as i32);
        let write = match op {
            VarOp::Set => Some(b),
            VarOp::Add => Some(a + b),
            VarOp::Sub => Some(a - b),
            VarOp::Mul => Some(a.wrapping_mul(b)),
            VarOp::Div => Some(if b == 0 { 0 } else { a.wrapping_div(b) }),
            VarOp::Shift => Some(if b < 0 {
                a.wrapping_shr(b.unsigned_abs())
            } else {
                a.wrapping_shl(b as u32)
            }),
            VarOp::Random => {
                let draw = vm.next_random() as i64 % (b.unsigned_abs() as i64 + 1);
                Some((draw * b.signum() as i64) as i32)
            }
            VarOp::Equal => {
                self.conditional = a == b;
                None
            }
            VarOp::GreaterEqual => {
                self.conditional = a >= b;
                None
            }
            VarOp::Greater => {
                self.conditional = a > b;
                None
            }
            VarOp::LessEqual => {
                self.conditional = a <= b;
                None
            }
            VarOp::Less => {
                self.conditional = a < b;
                None
            }
            VarOp::NotEqual => {
                self.conditional = a != b;
                None
            }
        };
        if let Some(value) = write {
            vm.write_var(index, value as i16);
        }
    }
}
