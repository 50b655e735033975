//! ByteReader: bounds-checked little-endian cursor over a byte slice.

use alloc::string::String;

use crate::FormatError;

/// Cursor over a borrowed byte range.
///
/// Sequential reads advance the cursor; the `*_at` variants read at an
/// absolute offset inside the view and leave the cursor alone.
#[derive(Clone, Copy, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reader positioned at `pos`.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// A new reader over `len` bytes starting at `offset` inside this view.
    pub fn sub(&self, offset: usize, len: usize) -> Result<ByteReader<'a>, FormatError> {
        Ok(ByteReader::new(self.bytes_at(offset, len)?))
    }

    /// A new reader from `offset` to the end of this view.
    pub fn sub_from(&self, offset: usize) -> Result<ByteReader<'a>, FormatError> {
        let len = self
            .data
            .len()
            .checked_sub(offset)
            .ok_or(FormatError::UnexpectedEof { offset, len: 0 })?;
        self.sub(offset, len)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Borrow `len` bytes at `offset`.
    pub fn bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8], FormatError> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(FormatError::UnexpectedEof { offset, len })
    }

    fn array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes_at(offset, N)?);
        Ok(out)
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8, FormatError> {
        Ok(self.array_at::<1>(offset)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.array_at(offset)?))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.array_at(offset)?))
    }

    /// Null-terminated string at `offset`. A missing terminator ends the
    /// string at the end of the view.
    pub fn cstr_at(&self, offset: usize) -> Result<String, FormatError> {
        let tail = self
            .data
            .get(offset..)
            .ok_or(FormatError::UnexpectedEof { offset, len: 1 })?;
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(tail[..end].iter().map(|&b| b as char).collect())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let bytes = self.bytes_at(self.pos, n)?;
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        let v = self.u8_at(self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8, FormatError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, FormatError> {
        let v = self.u16_at(self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn read_i16_le(&mut self) -> Result<i16, FormatError> {
        Ok(self.read_u16_le()? as i16)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, FormatError> {
        let v = self.u32_at(self.pos)?;
        self.pos += 4;
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_reads_are_little_endian() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xFF];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 0x01);
        assert_eq!(r.read_u16_le().unwrap(), 0x1234);
        assert_eq!(r.read_u32_le().unwrap(), 0x1234_5678);
        assert_eq!(r.read_i8().unwrap(), -1);
        assert_eq!(r.remaining(), 0);
        assert!(r.read_u8().is_err());
    }

    #[test]
    fn sub_views_are_relative_and_bounded() {
        let data = [0u8, 0, 0xAA, 0xBB, 0xCC];
        let r = ByteReader::new(&data);
        let sub = r.sub(2, 2).unwrap();
        assert_eq!(sub.u16_at(0).unwrap(), 0xBBAA);
        assert!(sub.u8_at(2).is_err());
        assert!(r.sub(4, 2).is_err());
        assert_eq!(r.sub_from(3).unwrap().len(), 2);
    }

    #[test]
    fn cstr_stops_at_null_or_end() {
        let data = b"SEQ_A\0SEQ_B";
        let r = ByteReader::new(data);
        assert_eq!(r.cstr_at(0).unwrap(), "SEQ_A");
        assert_eq!(r.cstr_at(6).unwrap(), "SEQ_B");
        assert!(r.cstr_at(20).is_err());
    }

    #[test]
    fn eof_error_reports_offset() {
        let r = ByteReader::new(&[0u8; 3]);
        match r.u32_at(1) {
            Err(FormatError::UnexpectedEof { offset, len }) => {
                assert_eq!(offset, 1);
                assert_eq!(len, 4);
            }
            other => panic!("expected EOF, got {:?}", other),
        }
    }
}
