//! Shared, cheaply cloneable byte views.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Deref;

/// A window into a reference-counted byte buffer.
///
/// Sub-views share the parent buffer; nothing is copied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedBytes {
    buf: Arc<[u8]>,
    start: usize,
    len: usize,
}

impl SharedBytes {
    /// View over the whole buffer.
    pub fn new(buf: Arc<[u8]>) -> Self {
        let len = buf.len();
        Self { buf, start: 0, len }
    }

    /// Sub-view of `len` bytes starting at `offset`, or `None` if it
    /// would extend past this view.
    pub fn slice(&self, offset: usize, len: usize) -> Option<SharedBytes> {
        let end = offset.checked_add(len)?;
        if end > self.len {
            return None;
        }
        Some(Self {
            buf: self.buf.clone(),
            start: self.start + offset,
            len,
        })
    }

    /// Sub-view from `offset` to the end of this view.
    pub fn slice_from(&self, offset: usize) -> Option<SharedBytes> {
        let len = self.len.checked_sub(offset)?;
        self.slice(offset, len)
    }

    /// Offset of this view inside the root buffer.
    pub fn offset(&self) -> usize {
        self.start
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.start..self.start + self.len]
    }
}

impl Deref for SharedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Default for SharedBytes {
    fn default() -> Self {
        SharedBytes::from(Vec::new())
    }
}

impl From<Vec<u8>> for SharedBytes {
    fn from(v: Vec<u8>) -> Self {
        Self::new(Arc::from(v))
    }
}

impl From<&[u8]> for SharedBytes {
    fn from(v: &[u8]) -> Self {
        Self::new(Arc::from(v))
    }
}
