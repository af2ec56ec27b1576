//! Sequential little-endian reader over a byte buffer.
//!
//! The fixed-size parts of the NRO container are covered by the zerocopy
//! structures in [`crate::raw`]. The cursor handles everything those cannot
//! express: the MOD0 magic scan and the variable-length homebrew marker
//! chain that follows the fixed MOD0 fields.

/// Sequential reader with an explicit position.
///
/// All multi-byte reads are little-endian. Every read is bounds-checked
/// against the buffer length and advances the position by the number of
/// bytes consumed.
#[derive(Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at position 0.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Move to an absolute offset.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
    }

    /// Advance the position by `count` bytes without reading them.
    pub fn skip(&mut self, count: usize) {
        self.pos = self.pos.saturating_add(count);
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read an unsigned 8-bit value.
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(u8::from_le_bytes(self.take_array()?))
    }

    /// Read an unsigned little-endian 16-bit value.
    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    /// Read an unsigned little-endian 32-bit value.
    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Read an unsigned little-endian 64-bit value.
    pub fn read_u64(&mut self) -> Result<u64, CursorError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Read `len` bytes into an owned copy.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, CursorError> {
        Ok(self.take(len)?.to_vec())
    }

    /// Read a fixed-width, NUL-padded string field of `len` bytes.
    ///
    /// The decoded text is truncated at the first zero byte.
    pub fn read_string(&mut self, len: usize) -> Result<String, CursorError> {
        let bytes = self.take(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CursorError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(CursorError::OutOfBounds {
                offset: self.pos,
                len,
                available: self.bytes.len(),
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}

/// Errors that can occur while reading through a [`Cursor`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// A read would run past the end of the buffer.
    #[error("read of {len} bytes at offset {offset:#x} out of bounds: buffer is {available:#x} bytes")]
    OutOfBounds {
        /// Position the read started at
        offset: usize,
        /// Number of bytes requested
        len: usize,
        /// Total buffer length
        available: usize,
    },
}
