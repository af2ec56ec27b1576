use zerocopy::FromBytes;

use crate::{
    cursor::Cursor,
    raw::{
        mod0::{MOD0_MAGIC, MOD0_SCAN_WINDOW},
        nro::{NRO_HEADER_OFFSET, NRO_MAGIC, NroHeader, NroSegment},
    },
    read::mod0::{Mod0, ParseError as Mod0ParseError},
};

/// Parsed NRO image with segment and MOD0 access.
///
/// Owns the underlying buffer so the text segment can be rewritten in
/// place; the header itself stays immutable after parsing.
#[derive(Debug)]
pub struct Nro {
    bytes: Vec<u8>,
    header: NroHeader,
    mod0: Option<Mod0>,
}

impl Nro {
    /// Parse an NRO image, validating magic and segment bounds.
    ///
    /// A missing MOD0 header is not an error: the image is simply treated
    /// as carrying no homebrew metadata.
    pub fn parse(bytes: Vec<u8>) -> Result<Self, ParseError> {
        let min_size = NRO_HEADER_OFFSET + size_of::<NroHeader>();
        if bytes.len() < min_size {
            return Err(ParseError::BufferTooSmall {
                required: min_size,
                available: bytes.len(),
            });
        }

        let header = NroHeader::read_from_prefix(&bytes[NRO_HEADER_OFFSET..])
            .map_err(|_| ParseError::BufferTooSmall {
                required: min_size,
                available: bytes.len(),
            })?
            .0;

        if header.magic.get() != NRO_MAGIC {
            return Err(ParseError::InvalidMagic {
                found: header.magic.get(),
            });
        }

        check_segment("text", &header.text, bytes.len())?;
        check_segment("rodata", &header.rodata, bytes.len())?;
        check_segment("data", &header.data, bytes.len())?;

        let mod0 = scan_mod0(&bytes, &header)?;

        Ok(Self {
            bytes,
            header,
            mod0,
        })
    }

    /// Get the NRO header.
    pub fn header(&self) -> &NroHeader {
        &self.header
    }

    /// Get the parsed MOD0 block, if the image carries one.
    pub fn mod0(&self) -> Option<&Mod0> {
        self.mod0.as_ref()
    }

    /// Get the 32-byte module identifier.
    pub fn module_id(&self) -> &[u8; 0x20] {
        &self.header.module_id
    }

    /// Get the text (code) segment bytes.
    pub fn text(&self) -> &[u8] {
        self.segment(&self.header.text)
    }

    /// Get mutable access to the text segment, for in-place patching.
    pub fn text_mut(&mut self) -> &mut [u8] {
        let seg = self.header.text;
        let off = seg.offset.get() as usize;
        let size = seg.size.get() as usize;
        &mut self.bytes[off..off + size]
    }

    /// Get the read-only data segment bytes.
    pub fn rodata(&self) -> &[u8] {
        self.segment(&self.header.rodata)
    }

    /// Get the read-write data segment bytes.
    pub fn data(&self) -> &[u8] {
        self.segment(&self.header.data)
    }

    /// Get the whole underlying buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the image and return the underlying buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn segment(&self, seg: &NroSegment) -> &[u8] {
        // Bounds were validated at parse time.
        let off = seg.offset.get() as usize;
        let size = seg.size.get() as usize;
        &self.bytes[off..off + size]
    }
}

fn check_segment(name: &'static str, seg: &NroSegment, len: usize) -> Result<(), ParseError> {
    let offset = seg.offset.get() as usize;
    let size = seg.size.get() as usize;
    match offset.checked_add(size) {
        Some(end) if end <= len => Ok(()),
        _ => Err(ParseError::SegmentOutOfBounds {
            segment: name,
            offset,
            size,
            available: len,
        }),
    }
}

/// Scan the first [`MOD0_SCAN_WINDOW`] bytes of the text segment for the
/// MOD0 magic, 4 bytes at a time. Standard crt0 places it at text + 4.
fn scan_mod0(bytes: &[u8], header: &NroHeader) -> Result<Option<Mod0>, Mod0ParseError> {
    let text_offset = header.text.offset.get() as usize;
    let mut cur = Cursor::new(bytes);

    for step in (0..MOD0_SCAN_WINDOW).step_by(4) {
        cur.seek(text_offset + step);
        match cur.read_u32() {
            Ok(tag) if tag == MOD0_MAGIC => {
                return Mod0::parse(bytes, text_offset + step).map(Some);
            }
            Ok(_) => {}
            Err(_) => break, // image ends inside the scan window
        }
    }

    Ok(None)
}

/// Errors that can occur when parsing an NRO image.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Buffer is too small to contain the start block and header.
    #[error("buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        available: usize,
    },
    /// Magic number does not match NRO0 (0x304f524e).
    #[error("invalid magic: expected 0x304f524e (NRO0), found {found:#010x}")]
    InvalidMagic {
        /// Found magic number
        found: u32,
    },
    /// A segment descriptor points outside the buffer.
    #[error(
        "{segment} segment out of bounds: offset {offset:#x} + size {size:#x} exceeds {available:#x}-byte buffer"
    )]
    SegmentOutOfBounds {
        /// Segment name
        segment: &'static str,
        /// Declared file offset
        offset: usize,
        /// Declared size
        size: usize,
        /// Total buffer length
        available: usize,
    },
    /// The located MOD0 block could not be parsed.
    #[error(transparent)]
    Mod0(#[from] Mod0ParseError),
}
