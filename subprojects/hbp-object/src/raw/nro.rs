use static_assertions::const_assert_eq;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, little_endian::*};

/// NRO magic number: "NRO0" in ASCII (0x304f524e).
pub const NRO_MAGIC: u32 = 0x304f524e;

/// File offset of [`NroHeader`] (immediately after [`NroStart`]).
pub const NRO_HEADER_OFFSET: usize = size_of::<NroStart>();

/// NRO start block (first 0x10 bytes of the file).
///
/// Holds the entrypoint branch instruction and a MOD0 offset hint filled in
/// by crt0. The hint is advisory only; [`crate::read::Nro`] locates MOD0 by
/// scanning the start of the text segment, which also covers images whose
/// startup code never wrote it.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct NroStart {
    /// Entrypoint branch instruction (unused by loaders)
    pub entry_insn: U32,
    /// Offset to the MOD0 header, relative to the NRO start
    pub mod0_hint: U32,
    /// Padding
    _padding: [u8; 8],
}

// Verify struct size - https://switchbrew.org/wiki/NRO#Start
const_assert_eq!(size_of::<NroStart>(), 0x10);

/// NRO segment descriptor (text, rodata, or data).
///
/// Describes the location and size of a loaded segment within the NRO file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct NroSegment {
    /// File offset to segment data
    pub offset: U32,
    /// Size of segment in bytes
    pub size: U32,
}

// Verify struct size - https://switchbrew.org/wiki/NRO#Segments
const_assert_eq!(size_of::<NroSegment>(), 0x8);

/// NRO header (0x70 bytes, follows [`NroStart`] at offset 0x10).
///
/// Contains the segment descriptors, module ID, and metadata about the
/// NRO file.
///
/// See: <https://switchbrew.org/wiki/NRO>
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct NroHeader {
    /// Magic number (must be [`NRO_MAGIC`])
    pub magic: U32,
    /// Format version (usually 0)
    pub version: U32,
    /// Total size of the NRO file (excluding appended assets)
    pub size: U32,
    /// Flag bits (reserved, usually 0)
    pub flags: U32,
    /// Text (code) segment descriptor
    pub text: NroSegment,
    /// Read-only data segment descriptor
    pub rodata: NroSegment,
    /// Read-write data segment descriptor
    pub data: NroSegment,
    /// BSS section size in bytes
    pub bss_size: U32,
    /// Reserved
    _reserved: U32,
    /// 32-byte module identifier (build ID)
    pub module_id: [u8; 0x20],
    /// Reserved
    _reserved2: [u8; 0x20],
}

// Verify struct size - https://switchbrew.org/wiki/NRO#Header
const_assert_eq!(size_of::<NroHeader>(), 0x70);
