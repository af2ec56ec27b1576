//! NRO (Nintendo Relocatable Object) builder.

use zerocopy::{FromZeros, IntoBytes};

use crate::raw::{
    mod0::{HBP_APPLIED_MAGIC, LNY0_MAGIC, LNY1_MAGIC, LNY2_MAGIC, MOD0_MAGIC, Mod0Header},
    nro::{NRO_MAGIC, NroHeader, NroSegment, NroStart},
};

/// Depth of the homebrew marker chain written after the fixed MOD0 fields.
///
/// Each level implies all earlier markers, matching the order-dependent way
/// the chain is parsed. Marker payload fields (GOT/relro offsets) are left
/// zero; images that need real linking metadata come out of a full
/// toolchain, not this builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerChain {
    /// Fixed MOD0 fields only, no markers.
    None,
    /// LNY0 marker plus its two payload fields.
    Lny0,
    /// LNY0 and LNY1 markers.
    Lny1,
    /// LNY0, LNY1, and LNY2 with the given ABI version.
    Lny2 {
        /// ABI version written after the LNY2 marker
        version: u32,
    },
    /// Full chain terminated by the "hbpA" patched marker.
    Applied {
        /// ABI version written after the LNY2 marker
        version: u32,
    },
}

/// Builder for constructing NRO images.
pub struct NroBuilder {
    text: Option<Vec<u8>>,
    rodata: Option<Vec<u8>>,
    data: Option<Vec<u8>>,
    bss_size: u32,
    module_id: Option<[u8; 0x20]>,
    mod0: Option<MarkerChain>,
}

impl NroBuilder {
    /// Create a new NRO builder.
    pub fn new() -> Self {
        Self {
            text: None,
            rodata: None,
            data: None,
            bss_size: 0,
            module_id: None,
            mod0: None,
        }
    }

    /// Set the text (code) segment.
    pub fn text(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.text = Some(data.into());
        self
    }

    /// Set the rodata (read-only data) segment.
    pub fn rodata(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.rodata = Some(data.into());
        self
    }

    /// Set the data (read-write data) segment.
    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the BSS section size in bytes.
    pub fn bss_size(mut self, size: u32) -> Self {
        self.bss_size = size;
        self
    }

    /// Set the 32-byte module identifier.
    ///
    /// If not provided, will default to all zeros.
    pub fn module_id(mut self, id: [u8; 0x20]) -> Self {
        self.module_id = Some(id);
        self
    }

    /// Embed a MOD0 block with the given marker-chain depth.
    ///
    /// The block is placed at text + 4, after a crt0-style entry
    /// instruction slot, which is where the parser's scan expects it.
    pub fn mod0(mut self, chain: MarkerChain) -> Self {
        self.mod0 = Some(chain);
        self
    }

    /// Build the complete NRO image.
    pub fn build(self) -> Result<Vec<u8>, BuildError> {
        // Validate required fields
        let user_text = self.text.ok_or(BuildError::MissingText)?;
        let rodata = self.rodata.ok_or(BuildError::MissingRodata)?;
        let data = self.data.ok_or(BuildError::MissingData)?;

        // Assemble the text segment, with the MOD0 block at text + 4 when
        // one was requested.
        let text = match self.mod0 {
            Some(chain) => {
                let mut text = Vec::new();
                text.extend_from_slice(&0u32.to_le_bytes()); // entry instruction slot
                text.extend_from_slice(&emit_mod0(chain));
                text.extend_from_slice(&user_text);
                text
            }
            None => user_text,
        };

        // Pad segments to 0x1000 alignment
        let text_padded = pad_to_alignment(&text, 0x1000);
        let rodata_padded = pad_to_alignment(&rodata, 0x1000);
        let data_padded = pad_to_alignment(&data, 0x1000);

        // Segments start after NroStart (0x10) + NroHeader (0x70) = 0x80
        let text_offset = (size_of::<NroStart>() + size_of::<NroHeader>()) as u32;
        let rodata_offset = text_offset + text_padded.len() as u32;
        let data_offset = rodata_offset + rodata_padded.len() as u32;
        let nro_size = data_offset + data_padded.len() as u32;

        let mut buf = Vec::with_capacity(nro_size as usize);

        // Write NroStart (0x10 bytes)
        let mut start = NroStart::new_zeroed();
        if self.mod0.is_some() {
            start.mod0_hint = (text_offset + 4).into();
        }
        buf.extend_from_slice(start.as_bytes());

        // Write NroHeader (0x70 bytes)
        let mut header = NroHeader::new_zeroed();
        header.magic = NRO_MAGIC.into();
        header.version = 0.into();
        header.size = nro_size.into();
        header.flags = 0.into();
        header.text = NroSegment {
            offset: text_offset.into(),
            size: (text.len() as u32).into(),
        };
        header.rodata = NroSegment {
            offset: rodata_offset.into(),
            size: (rodata.len() as u32).into(),
        };
        header.data = NroSegment {
            offset: data_offset.into(),
            size: (data.len() as u32).into(),
        };
        header.bss_size = self.bss_size.into();
        header.module_id = self.module_id.unwrap_or([0u8; 0x20]);
        buf.extend_from_slice(header.as_bytes());

        // Write padded segments
        buf.extend_from_slice(&text_padded);
        buf.extend_from_slice(&rodata_padded);
        buf.extend_from_slice(&data_padded);

        Ok(buf)
    }
}

impl Default for NroBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned by [`NroBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Text segment was not provided.
    #[error("missing text segment")]
    MissingText,
    /// Rodata segment was not provided.
    #[error("missing rodata segment")]
    MissingRodata,
    /// Data segment was not provided.
    #[error("missing data segment")]
    MissingData,
}

/// Emit a MOD0 block with the requested marker-chain depth.
fn emit_mod0(chain: MarkerChain) -> Vec<u8> {
    let mut header = Mod0Header::new_zeroed();
    header.magic = MOD0_MAGIC.into();

    let mut block = Vec::from(header.as_bytes());
    if chain == MarkerChain::None {
        return block;
    }

    block.extend_from_slice(&LNY0_MAGIC.to_le_bytes());
    block.extend_from_slice(&[0u8; 8]); // got_start, got_end
    if chain == MarkerChain::Lny0 {
        return block;
    }

    block.extend_from_slice(&LNY1_MAGIC.to_le_bytes());
    block.extend_from_slice(&[0u8; 8]); // relro_start, data_start
    if chain == MarkerChain::Lny1 {
        return block;
    }

    let (version, applied) = match chain {
        MarkerChain::Lny2 { version } => (version, false),
        MarkerChain::Applied { version } => (version, true),
        // Shallower depths returned above.
        MarkerChain::None | MarkerChain::Lny0 | MarkerChain::Lny1 => (0, false),
    };

    block.extend_from_slice(&LNY2_MAGIC.to_le_bytes());
    block.extend_from_slice(&version.to_le_bytes());
    block.extend_from_slice(&[0u8; 4]); // reserved
    if applied {
        block.extend_from_slice(&HBP_APPLIED_MAGIC.to_le_bytes());
    }

    block
}

/// Pad a byte slice to the specified alignment.
fn pad_to_alignment(data: &[u8], alignment: usize) -> Vec<u8> {
    let len = data.len();
    let padded_len = len.div_ceil(alignment) * alignment;
    let mut padded = Vec::with_capacity(padded_len);
    padded.extend_from_slice(data);
    padded.resize(padded_len, 0);
    padded
}
