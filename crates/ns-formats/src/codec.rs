//! Sample codecs: PCM8, PCM16 and IMA-ADPCM.
//!
//! All decoders produce normalized `f32` samples in [-1, 1].

use alloc::vec::Vec;

use crate::FormatError;

const ADPCM_INDEX_TABLE: [i32; 8] = [-1, -1, -1, -1, 2, 4, 6, 8];

const ADPCM_STEP_TABLE: [i32; 89] = [
    0x0007, 0x0008, 0x0009, 0x000A, 0x000B, 0x000C, 0x000D, 0x000E, 0x0010, 0x0011,
    0x0013, 0x0015, 0x0017, 0x0019, 0x001C, 0x001F, 0x0022, 0x0025, 0x0029, 0x002D,
    0x0032, 0x0037, 0x003C, 0x0042, 0x0049, 0x0050, 0x0058, 0x0061, 0x006B, 0x0076,
    0x0082, 0x008F, 0x009D, 0x00AD, 0x00BE, 0x00D1, 0x00E6, 0x00FD, 0x0117, 0x0133,
    0x0151, 0x0173, 0x0198, 0x01C1, 0x01EE, 0x0220, 0x0256, 0x0292, 0x02D4, 0x031C,
    0x036C, 0x03C3, 0x0424, 0x048E, 0x0502, 0x0583, 0x0610, 0x06AB, 0x0756, 0x0812,
    0x08E0, 0x09C3, 0x0ABD, 0x0BD0, 0x0CFF, 0x0E4C, 0x0FBA, 0x114C, 0x1307, 0x14EE,
    0x1706, 0x1954, 0x1BDC, 0x1EA5, 0x21B6, 0x2515, 0x28CA, 0x2CDF, 0x315B, 0x364B,
    0x3BB9, 0x41B2, 0x4844, 0x4F7E, 0x5771, 0x602F, 0x69CE, 0x7462, 0x7FFF,
];

/// Sample encoding declared by SWAV and STRM headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveType {
    Pcm8,
    Pcm16,
    Adpcm,
}

impl TryFrom<u8> for WaveType {
    type Error = FormatError;

    fn try_from(v: u8) -> Result<Self, FormatError> {
        match v {
            0 => Ok(WaveType::Pcm8),
            1 => Ok(WaveType::Pcm16),
            2 => Ok(WaveType::Adpcm),
            _ => Err(FormatError::UnknownWaveType(v)),
        }
    }
}

impl WaveType {
    /// Convert a loop offset in 32-bit words to a sample index.
    ///
    /// ADPCM offsets include the 4-byte block header.
    pub fn loop_point(self, loop_offset_words: u32) -> usize {
        let words = loop_offset_words as usize;
        match self {
            WaveType::Pcm8 => words * 4,
            WaveType::Pcm16 => words * 2,
            WaveType::Adpcm => (words * 8).saturating_sub(8),
        }
    }

    /// Number of samples encoded by `bytes` bytes of single-stream data.
    pub fn sample_count(self, bytes: usize) -> usize {
        match self {
            WaveType::Pcm8 => bytes,
            WaveType::Pcm16 => bytes / 2,
            WaveType::Adpcm => bytes.saturating_sub(4) * 2,
        }
    }

    /// Decode a single contiguous stream.
    pub fn decode(self, data: &[u8]) -> Vec<f32> {
        match self {
            WaveType::Pcm8 => decode_pcm8(data),
            WaveType::Pcm16 => decode_pcm16(data),
            WaveType::Adpcm => decode_adpcm(data),
        }
    }
}

pub fn decode_pcm8(data: &[u8]) -> Vec<f32> {
    data.iter().map(|&b| b as i8 as f32 / 128.0).collect()
}

/// Trailing odd bytes are ignored.
pub fn decode_pcm16(data: &[u8]) -> Vec<f32> {
    data.chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / 32768.0)
        .collect()
}

/// IMA-ADPCM predictor state.
#[derive(Clone, Copy, Debug)]
struct AdpcmState {
    value: i32,
    index: i32,
}

impl AdpcmState {
    /// State from a 4-byte block header: i16 seed, u16 step index.
    fn from_header(header: &[u8]) -> Self {
        let value = i16::from_le_bytes([header[0], header[1]]) as i32;
        let index = u16::from_le_bytes([header[2], header[3]]) as i32;
        Self { value, index: index.clamp(0, 88) }
    }

    fn step(&mut self, nibble: u8) -> f32 {
        let step = ADPCM_STEP_TABLE[self.index as usize];
        let mut diff = step >> 3;
        if nibble & 1 != 0 {
            diff += step >> 2;
        }
        if nibble & 2 != 0 {
            diff += step >> 1;
        }
        if nibble & 4 != 0 {
            diff += step;
        }
        if nibble & 8 != 0 {
            self.value = (self.value - diff).max(-0x7FFF);
        } else {
            self.value = (self.value + diff).min(0x7FFF);
        }
        self.index = (self.index + ADPCM_INDEX_TABLE[(nibble & 7) as usize]).clamp(0, 88);
        self.value as f32 / 32768.0
    }

    /// Decode packed nibbles, low nibble first.
    fn decode_into(&mut self, data: &[u8], out: &mut Vec<f32>) {
        for &byte in data {
            out.push(self.step(byte & 0xF));
            out.push(self.step(byte >> 4));
        }
    }
}

/// Decode one IMA-ADPCM stream: a 4-byte header then packed nibbles.
///
/// Data shorter than the header decodes to nothing.
pub fn decode_adpcm(data: &[u8]) -> Vec<f32> {
    if data.len() < 4 {
        return Vec::new();
    }
    let mut state = AdpcmState::from_header(&data[..4]);
    let mut out = Vec::with_capacity((data.len() - 4) * 2);
    state.decode_into(&data[4..], &mut out);
    out
}

/// Decode one channel of block-interleaved IMA-ADPCM.
///
/// Block `i` of channel `c` sits at `(i * channels + c) * block_len` and
/// starts with its own 4-byte header. The predictor value is seeded from
/// the channel's first block only; every block reloads the step index.
/// Decoding stops at the first block that runs past the end of `data`.
pub fn decode_adpcm_blocks(
    data: &[u8],
    blocks: usize,
    block_len: usize,
    channels: usize,
    channel: usize,
) -> Vec<f32> {
    if block_len <= 4 || channels == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(blocks * (block_len - 4) * 2);
    let mut state: Option<AdpcmState> = None;
    for i in 0..blocks {
        let start = (i * channels + channel) * block_len;
        let Some(block) = data.get(start..start + block_len) else {
            log::warn!("ADPCM block {} of channel {} is out of bounds", i, channel);
            break;
        };
        let header = AdpcmState::from_header(&block[..4]);
        let st = state.get_or_insert(header);
        st.index = header.index;
        st.decode_into(&block[4..], &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn pcm8_is_signed_over_128() {
        let out = decode_pcm8(&[0x00, 0x7F, 0x80, 0xFF]);
        assert_eq!(out, vec![0.0, 127.0 / 128.0, -1.0, -1.0 / 128.0]);
    }

    #[test]
    fn pcm16_is_little_endian_over_32768() {
        let out = decode_pcm16(&[0x00, 0x80, 0xFF, 0x7F, 0x01]);
        assert_eq!(out, vec![-1.0, 32767.0 / 32768.0]);
    }

    #[test]
    fn adpcm_zero_nibbles_drift_up_by_eighth_step() {
        // seed 0, index 0: each zero nibble adds 7 >> 3 = 0
        let out = decode_adpcm(&[0, 0, 0, 0, 0x00]);
        assert_eq!(out, vec![0.0, 0.0]);

        // nibble 7: diff = 0 + 1 + 3 + 7 = 11, index += 8
        let out = decode_adpcm(&[0, 0, 0, 0, 0x07]);
        assert_eq!(out[0], 11.0 / 32768.0);
        // second nibble 0 at index 8 (step 16): diff = 2
        assert_eq!(out[1], 13.0 / 32768.0);
    }

    #[test]
    fn adpcm_seed_is_signed() {
        // seed -100, nibble 8 subtracts 7 >> 3 = 0
        let seed = (-100i16).to_le_bytes();
        let out = decode_adpcm(&[seed[0], seed[1], 0, 0, 0x88]);
        assert_eq!(out, vec![-100.0 / 32768.0, -100.0 / 32768.0]);
    }

    #[test]
    fn adpcm_clamps_value_and_index() {
        // start near full scale at the top of the table; 0x77 keeps adding
        let seed = 0x7FF0i16.to_le_bytes();
        let out = decode_adpcm(&[seed[0], seed[1], 200, 0, 0x77, 0x77]);
        assert!(out.iter().all(|&v| v <= 32767.0 / 32768.0));
        assert_eq!(*out.last().unwrap(), 32767.0 / 32768.0);

        let seed = (-0x7FF0i16).to_le_bytes();
        let out = decode_adpcm(&[seed[0], seed[1], 88, 0, 0xFF]);
        assert_eq!(out[1], -32767.0 / 32768.0);
    }

    #[test]
    fn adpcm_length_matches_header_math() {
        let data = vec![0u8; 4 + 10];
        assert_eq!(decode_adpcm(&data).len(), WaveType::Adpcm.sample_count(data.len()));
        assert!(decode_adpcm(&[1, 2]).is_empty());
    }

    #[test]
    fn adpcm_blocks_deinterleave_channels() {
        // two channels, two blocks of 5 bytes each; left nibbles 7, right 0
        let block_l = [0u8, 0, 0, 0, 0x77];
        let block_r = [0u8, 0, 0, 0, 0x00];
        let mut data = Vec::new();
        for _ in 0..2 {
            data.extend_from_slice(&block_l);
            data.extend_from_slice(&block_r);
        }
        let left = decode_adpcm_blocks(&data, 2, 5, 2, 0);
        let right = decode_adpcm_blocks(&data, 2, 5, 2, 1);
        assert_eq!(left.len(), 4);
        assert_eq!(right, vec![0.0; 4]);
        // the predictor value carries across blocks
        assert!(left[2] > left[1]);
    }

    #[test]
    fn adpcm_blocks_reload_step_index() {
        // block 0 pushes the index up; block 1 header resets it to 0
        let data = [0u8, 0, 0, 0, 0x77, 0, 0, 0, 0, 0x10];
        let out = decode_adpcm_blocks(&data, 2, 5, 1, 0);
        let before = out[1];
        // nibble 0 at index 0 adds 0, nibble 1 adds 0 + 1
        assert_eq!(out[2], before);
        assert_eq!(out[3], before + 1.0 / 32768.0);
    }

    #[test]
    fn loop_point_units() {
        assert_eq!(WaveType::Pcm8.loop_point(3), 12);
        assert_eq!(WaveType::Pcm16.loop_point(3), 6);
        assert_eq!(WaveType::Adpcm.loop_point(3), 16);
        assert_eq!(WaveType::Adpcm.loop_point(0), 0);
        assert!(matches!(WaveType::try_from(3), Err(FormatError::UnknownWaveType(3))));
    }
}
