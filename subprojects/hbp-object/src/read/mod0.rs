use zerocopy::FromBytes;

use crate::{
    cursor::Cursor,
    raw::mod0::{HBP_APPLIED_MAGIC, LNY0_MAGIC, LNY1_MAGIC, LNY2_MAGIC, Mod0Header},
};

/// Parsed MOD0 header plus the homebrew extension marker chain.
///
/// The chain is order-dependent and short-circuiting: each marker is only
/// looked for when every earlier one was found, so `lny2_offset.is_some()`
/// implies LNY0 and LNY1 were present, and `hbp_applied_offset.is_some()`
/// implies the full chain. Its depth is a coarse fingerprint of the
/// toolchain that produced the image.
#[derive(Debug, Clone)]
pub struct Mod0 {
    /// Fixed MOD0 fields.
    pub header: Mod0Header,
    /// Absolute file offset of the MOD0 magic.
    pub offset: usize,
    /// Offset of the LNY0 marker, relative to the MOD0 start.
    pub lny0_offset: Option<u32>,
    /// Offset of the LNY1 marker, relative to the MOD0 start.
    pub lny1_offset: Option<u32>,
    /// Offset of the LNY2 marker, relative to the MOD0 start.
    pub lny2_offset: Option<u32>,
    /// ABI version field following the LNY2 marker.
    pub lny2_version: Option<u32>,
    /// Offset of the "hbpA" patched marker, relative to the MOD0 start.
    pub hbp_applied_offset: Option<u32>,
}

impl Mod0 {
    /// Parse the MOD0 block at `offset` within `bytes`.
    ///
    /// The caller has already located (and therefore validated) the magic.
    /// A truncated fixed part is an error; a marker chain that runs past the
    /// end of the buffer simply terminates the chain.
    pub(crate) fn parse(bytes: &[u8], offset: usize) -> Result<Self, ParseError> {
        let tail = bytes.get(offset..).unwrap_or_default();
        let header = Mod0Header::read_from_prefix(tail)
            .map_err(|_| ParseError::BufferTooSmall {
                required: size_of::<Mod0Header>(),
                available: tail.len(),
            })?
            .0;

        let mut mod0 = Self {
            header,
            offset,
            lny0_offset: None,
            lny1_offset: None,
            lny2_offset: None,
            lny2_version: None,
            hbp_applied_offset: None,
        };

        let mut cur = Cursor::new(bytes);
        cur.seek(offset + size_of::<Mod0Header>());

        if cur.read_u32().ok() != Some(LNY0_MAGIC) {
            return Ok(mod0);
        }
        mod0.lny0_offset = Some((cur.position() - 4 - offset) as u32);
        cur.skip(8); // got_start, got_end

        if cur.read_u32().ok() != Some(LNY1_MAGIC) {
            return Ok(mod0);
        }
        mod0.lny1_offset = Some((cur.position() - 4 - offset) as u32);
        cur.skip(8); // relro_start, data_start

        if cur.read_u32().ok() != Some(LNY2_MAGIC) {
            return Ok(mod0);
        }
        mod0.lny2_offset = Some((cur.position() - 4 - offset) as u32);
        mod0.lny2_version = cur.read_u32().ok();
        cur.skip(4); // reserved

        if cur.read_u32().ok() != Some(HBP_APPLIED_MAGIC) {
            return Ok(mod0);
        }
        mod0.hbp_applied_offset = Some((cur.position() - 4 - offset) as u32);

        Ok(mod0)
    }

    /// Get offset to the .dynamic section.
    pub fn dynamic_offset(&self) -> i32 {
        self.header.dynamic_offset.get()
    }

    /// Get offset to BSS start.
    pub fn bss_start_offset(&self) -> i32 {
        self.header.bss_start_offset.get()
    }

    /// Get offset to BSS end.
    pub fn bss_end_offset(&self) -> i32 {
        self.header.bss_end_offset.get()
    }

    /// Get offset to .eh_frame_hdr start.
    pub fn eh_frame_hdr_start(&self) -> i32 {
        self.header.eh_frame_hdr_start.get()
    }

    /// Get offset to .eh_frame_hdr end.
    pub fn eh_frame_hdr_end(&self) -> i32 {
        self.header.eh_frame_hdr_end.get()
    }

    /// Get offset to the runtime module object.
    pub fn module_object_offset(&self) -> i32 {
        self.header.module_object_offset.get()
    }

    /// Whether the image carries a versioned thread-vars layout (LNY2).
    pub fn has_versioned_abi(&self) -> bool {
        self.lny2_offset.is_some()
    }

    /// Whether the image carries the "hbpA" patched marker.
    pub fn is_patch_applied(&self) -> bool {
        self.hbp_applied_offset.is_some()
    }
}

/// Errors that can occur when parsing a located MOD0 block.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Buffer ends before the fixed MOD0 fields do.
    #[error("MOD0 truncated: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        available: usize,
    },
}
