//! Sequence bytecode decoding.
//!
//! Every instruction is an opcode byte, zero or more fixed operand bytes,
//! and a final operand that the random/variable prefixes may replace.

/// Integer variable operations (0xB0-0xBD).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Shift,
    Random,
    Equal,
    GreaterEqual,
    Greater,
    LessEqual,
    Less,
    NotEqual,
}

/// A decoded opcode byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// Key number before transpose
    Note(u8),
    Rest,
    Program,
    OpenTrack,
    Jump,
    Call,
    /// Prefix: next instruction's last operand is a random value
    Random,
    /// Prefix: next instruction's last operand is a variable
    Variable,
    /// Prefix: skip next instruction when the conditional flag is clear
    If,
    Var(VarOp),
    Pan,
    Volume,
    MasterVolume,
    Transpose,
    PitchBend,
    BendRange,
    Priority,
    MonoPoly,
    Tie,
    PortamentoKey,
    LfoDepth,
    LfoSpeed,
    LfoType,
    LfoRange,
    Portamento,
    PortamentoTime,
    Attack,
    Decay,
    Sustain,
    Release,
    LoopStart,
    Expression,
    LfoDelay,
    Tempo,
    SweepPitch,
    LoopEnd,
    Return,
    AllocateTracks,
    End,
    Unknown(u8),
}

/// Encoding of an instruction's last operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    None,
    U8,
    U16,
    U24,
    /// 1-4 bytes, 7 bits each, MSB set on all but the last
    VarLen,
}

impl From<u8> for Opcode {
    fn from(byte: u8) -> Self {
        match byte {
            0x00..=0x7F => Opcode::Note(byte),
            0x80 => Opcode::Rest,
            0x81 => Opcode::Program,
            0x93 => Opcode::OpenTrack,
            0x94 => Opcode::Jump,
            0x95 => Opcode::Call,
            0xA0 => Opcode::Random,
            0xA1 => Opcode::Variable,
            0xA2 => Opcode::If,
            0xB0 => Opcode::Var(VarOp::Set),
            0xB1 => Opcode::Var(VarOp::Add),
            0xB2 => Opcode::Var(VarOp::Sub),
            0xB3 => Opcode::Var(VarOp::Mul),
            0xB4 => Opcode::Var(VarOp::Div),
            0xB5 => Opcode::Var(VarOp::Shift),
            0xB6 => Opcode::Var(VarOp::Random),
            0xB8 => Opcode::Var(VarOp::Equal),
            0xB9 => Opcode::Var(VarOp::GreaterEqual),
            0xBA => Opcode::Var(VarOp::Greater),
            0xBB => Opcode::Var(VarOp::LessEqual),
            0xBC => Opcode::Var(VarOp::Less),
            0xBD => Opcode::Var(VarOp::NotEqual),
            0xC0 => Opcode::Pan,
            0xC1 => Opcode::Volume,
            0xC2 => Opcode::MasterVolume,
            0xC3 => Opcode::Transpose,
            0xC4 => Opcode::PitchBend,
            0xC5 => Opcode::BendRange,
            0xC6 => Opcode::Priority,
            0xC7 => Opcode::MonoPoly,
            0xC8 => Opcode::Tie,
            0xC9 => Opcode::PortamentoKey,
            0xCA => Opcode::LfoDepth,
            0xCB => Opcode::LfoSpeed,
            0xCC => Opcode::LfoType,
            0xCD => Opcode::LfoRange,
            0xCE => Opcode::Portamento,
            0xCF => Opcode::PortamentoTime,
            0xD0 => Opcode::Attack,
            0xD1 => Opcode::Decay,
            0xD2 => Opcode::Sustain,
            0xD3 => Opcode::Release,
            0xD4 => Opcode::LoopStart,
            0xD5 => Opcode::Expression,
            0xE0 => Opcode::LfoDelay,
            0xE1 => Opcode::Tempo,
            0xE3 => Opcode::SweepPitch,
            0xFC => Opcode::LoopEnd,
            0xFD => Opcode::Return,
            0xFE => Opcode::AllocateTracks,
            0xFF => Opcode::End,
            other => Opcode::Unknown(other),
        }
    }
}

impl Opcode {
    /// Bytes before the last operand, opcode included.
    pub fn fixed_len(self) -> usize {
        match self {
            Opcode::Note(_) | Opcode::OpenTrack | Opcode::Var(_) => 2,
            _ => 1,
        }
    }

    /// Encoding of the last operand.
    pub fn operand(self) -> Operand {
        match self {
            Opcode::Note(_) | Opcode::Rest | Opcode::Program => Operand::VarLen,
            Opcode::OpenTrack | Opcode::Jump | Opcode::Call => Operand::U24,
            Opcode::Var(_)
            | Opcode::LfoDelay
            | Opcode::Tempo
            | Opcode::SweepPitch
            | Opcode::AllocateTracks => Operand::U16,
            Opcode::Random
            | Opcode::Variable
            | Opcode::If
            | Opcode::LoopEnd
            | Opcode::Return
            | Opcode::End => Operand::None,
            Opcode::Unknown(byte) => match byte & 0xF0 {
                0xB0 => Operand::U16,
                0xC0 | 0xD0 => Operand::U8,
                0xE0 => Operand::U16,
                _ => Operand::None,
            },
            _ => Operand::U8,
        }
    }
}

/// Encoded size of a variable-length number starting at `pc`.
pub fn var_len_size(program: &[u8], pc: usize) -> usize {
    let mut size = 0;
    for i in 0..4 {
        size += 1;
        match program.get(pc + i) {
            Some(byte) if byte & 0x80 != 0 => continue,
            _ => break,
        }
    }
    size
}

/// Encoded size of the instruction at `pc`, prefixes included.
///
/// The random prefix replaces the next instruction's last operand with a
/// 4-byte min/max pair; the variable prefix with a 1-byte variable index.
pub fn command_length(program: &[u8], pc: usize) -> usize {
    let Some(&byte) = program.get(pc) else {
        return 1;
    };
    let op = Opcode::from(byte);
    match op {
        Opcode::Random | Opcode::Variable => {
            let next = program.get(pc + 1).copied().map(Opcode::from);
            let fixed = next.map_or(1, Opcode::fixed_len);
            let operand = if op == Opcode::Random { 4 } else { 1 };
            1 + fixed + operand
        }
        Opcode::If => 1 + command_length(program, pc + 1),
        _ => {
            if let Opcode::Unknown(byte) = op {
                log::error!("length of unknown opcode {:#04x} at {:#08x}", byte, pc);
            }
            let fixed = op.fixed_len();
            fixed
                + match op.operand() {
                    Operand::None => 0,
                    Operand::U8 => 1,
                    Operand::U16 => 2,
                    Operand::U24 => 3,
                    Operand::VarLen => var_len_size(program, pc + fixed),
                }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_length_includes_var_len_duration() {
        assert_eq!(command_length(&[0x3C, 0x7F, 0x30], 0), 3);
        assert_eq!(command_length(&[0x3C, 0x7F, 0x81, 0x00], 0), 4);
        assert_eq!(command_length(&[0x3C, 0x7F, 0xFF, 0xFF, 0xFF, 0x7F], 0), 6);
    }

    #[test]
    fn fixed_width_instructions() {
        assert_eq!(command_length(&[0x93, 1, 0, 0, 0], 0), 5);
        assert_eq!(command_length(&[0x94, 0, 0, 0], 0), 4);
        assert_eq!(command_length(&[0xB0, 0, 1, 0], 0), 4);
        assert_eq!(command_length(&[0xC0, 64], 0), 2);
        assert_eq!(command_length(&[0xD4, 2], 0), 2);
        assert_eq!(command_length(&[0xE1, 0x78, 0], 0), 3);
        assert_eq!(command_length(&[0xFE, 0xFF, 0xFF], 0), 3);
        assert_eq!(command_length(&[0xFC], 0), 1);
        assert_eq!(command_length(&[0xFF], 0), 1);
    }

    #[test]
    fn prefixes_replace_last_operand() {
        // random volume: A0 C1 min(2) max(2)
        assert_eq!(command_length(&[0xA0, 0xC1, 0, 0, 0x7F, 0], 0), 6);
        // random note duration: A0 3C vel min(2) max(2)
        assert_eq!(command_length(&[0xA0, 0x3C, 0x7F, 0, 0, 0, 0], 0), 7);
        // variable jump: A1 94 var
        assert_eq!(command_length(&[0xA1, 0x94, 3], 0), 3);
        // if + note
        assert_eq!(command_length(&[0xA2, 0x3C, 0x7F, 0x10], 0), 4);
        // if + random + var op
        assert_eq!(command_length(&[0xA2, 0xA0, 0xB0, 0, 0, 0, 0, 0], 0), 8);
    }

    #[test]
    fn decode_covers_variable_ops() {
        assert_eq!(Opcode::from(0xB6), Opcode::Var(VarOp::Random));
        assert_eq!(Opcode::from(0xB7), Opcode::Unknown(0xB7));
        assert_eq!(Opcode::from(0xBD), Opcode::Var(VarOp::NotEqual));
    }
}
