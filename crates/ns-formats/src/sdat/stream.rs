//! STRM decoding.

use alloc::vec::Vec;

use ns_ir::Stream;

use super::header::StrmHeader;
use crate::codec::{decode_adpcm_blocks, WaveType};
use crate::FormatError;

/// Decode a STRM file into a stereo [`Stream`].
pub fn decode_stream(file: &[u8]) -> Result<Stream, FormatError> {
    let header = StrmHeader::parse(file)?;
    let wave_type = WaveType::try_from(header.wave_type)?;
    log::debug!(
        "STRM: {:?}, {} channels, {} Hz, {} blocks of {} bytes, loop {} at {}",
        wave_type,
        header.channels,
        header.sample_rate,
        header.block_count,
        header.block_length,
        header.looping != 0,
        header.loop_point
    );
    if header.channels > 2 {
        log::warn!("STRM declares {} channels, only the first two play", header.channels);
    }

    let data = file.get(StrmHeader::DATA_START..).unwrap_or(&[]);
    let channels = header.channels.max(1) as usize;
    let decode_channel = |channel: usize| match wave_type {
        WaveType::Adpcm => {
            let blocks = header.block_count as usize;
            let blocks = if blocks > 1 { blocks - 1 } else { blocks };
            decode_adpcm_blocks(data, blocks, header.block_length as usize, channels, channel)
        }
        WaveType::Pcm8 | WaveType::Pcm16 => decode_pcm_blocks(data, &header, wave_type, channels, channel),
    };

    let left = decode_channel(0);
    let right = if channels < 2 { left.clone() } else { decode_channel(1) };
    Ok(Stream {
        left,
        right,
        sample_rate: header.sample_rate as u32,
        channels: header.channels,
        looping: header.looping != 0,
        loop_point: header.loop_point as usize,
    })
}

/// De-interleave one channel of block-interleaved PCM. The final block
/// uses the header's last-block length.
fn decode_pcm_blocks(
    data: &[u8],
    header: &StrmHeader,
    wave_type: WaveType,
    channels: usize,
    channel: usize,
) -> Vec<f32> {
    let blocks = header.block_count as usize;
    let block_len = header.block_length as usize;
    let mut out = Vec::with_capacity(blocks * block_len);
    for i in 0..blocks {
        let start = (i * channels + channel) * block_len;
        let len = if i + 1 == blocks { header.last_block_length as usize } else { block_len };
        let Some(block) = data.get(start..start + len) else {
            log::warn!("STRM block {} of channel {} is out of bounds", i, channel);
            break;
        };
        out.extend(wave_type.decode(block));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn strm(wave_type: u8, channels: u8, blocks: u32, block_len: u32, last_len: u32, data: &[u8]) -> Vec<u8> {
        let mut d = vec![0u8; StrmHeader::DATA_START];
        d[0x18] = wave_type;
        d[0x19] = 1;
        d[0x1A] = channels;
        d[0x1C..0x1E].copy_from_slice(&22050u16.to_le_bytes());
        d[0x20..0x24].copy_from_slice(&2u32.to_le_bytes());
        d[0x2C..0x30].copy_from_slice(&blocks.to_le_bytes());
        d[0x30..0x34].copy_from_slice(&block_len.to_le_bytes());
        d[0x38..0x3C].copy_from_slice(&last_len.to_le_bytes());
        d.extend_from_slice(data);
        d
    }

    #[test]
    fn stereo_pcm8_is_deinterleaved_per_block() {
        // blocks: L0 R0 L1 R1, the last block holding 2 of 4 bytes
        let data = [
            1, 2, 3, 4, 101, 102, 103, 104, //
            5, 6, 0, 0, 105, 106, 0, 0,
        ];
        let s = decode_stream(&strm(0, 2, 2, 4, 2, &data)).unwrap();
        let scale = |v: &[i8]| v.iter().map(|&b| b as f32 / 128.0).collect::<Vec<_>>();
        assert_eq!(s.left, scale(&[1, 2, 3, 4, 5, 6]));
        assert_eq!(s.right, scale(&[101, 102, 103, 104, 105, 106]));
        assert_eq!(s.sample_rate, 22050);
        assert!(s.looping);
        assert_eq!(s.loop_point, 2);
    }

    #[test]
    fn mono_duplicates_left() {
        let s = decode_stream(&strm(1, 1, 1, 4, 4, &[0, 0x40, 0, 0xC0])).unwrap();
        assert_eq!(s.left, vec![0.5, -0.5]);
        assert_eq!(s.right, s.left);
    }

    #[test]
    fn adpcm_drops_trailing_block() {
        let data = vec![0u8; 3 * 8];
        let s = decode_stream(&strm(2, 1, 3, 8, 8, &data)).unwrap();
        assert_eq!(s.len(), 2 * (8 - 4) * 2);
    }

    #[test]
    fn unknown_wave_type_is_an_error() {
        assert!(matches!(
            decode_stream(&strm(9, 1, 1, 4, 4, &[0; 4])),
            Err(FormatError::UnknownWaveType(9))
        ));
    }
}
