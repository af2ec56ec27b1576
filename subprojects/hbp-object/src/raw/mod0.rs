use static_assertions::const_assert_eq;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, little_endian::*};

/// MOD0 magic number: "MOD0" in ASCII (0x30444f4d).
pub const MOD0_MAGIC: u32 = 0x30444f4d;

/// First homebrew extension marker: "LNY0" in ASCII (0x30594e4c).
///
/// Followed by two u32 fields (`got_start`, `got_end`).
pub const LNY0_MAGIC: u32 = 0x30594e4c;

/// Second homebrew extension marker: "LNY1" in ASCII (0x31594e4c).
///
/// Followed by two u32 fields (`relro_start`, `data_start`).
pub const LNY1_MAGIC: u32 = 0x31594e4c;

/// Third homebrew extension marker: "LNY2" in ASCII (0x32594e4c).
///
/// Followed by a u32 ABI version and a reserved u32. Its presence means the
/// image was produced by a toolchain that already versions the thread-vars
/// layout.
pub const LNY2_MAGIC: u32 = 0x32594e4c;

/// Patched marker: "hbpA" in ASCII (0x41706268).
///
/// Appended after the LNY2 fields by patching tools once a legacy image has
/// been rewritten to the corrected thread-vars offset.
pub const HBP_APPLIED_MAGIC: u32 = 0x41706268;

/// Number of bytes at the start of the text segment scanned for
/// [`MOD0_MAGIC`], in 4-byte steps. Standard crt0 places MOD0 at text + 4,
/// right after the entry branch instruction.
pub const MOD0_SCAN_WINDOW: usize = 0x20;

/// MOD0 header structure embedded in the text segment.
///
/// The MOD0 header provides metadata about the module's dynamic linking
/// information, BSS section, and exception handling tables. Homebrew
/// toolchains append the optional marker chain directly after these fixed
/// fields; see [`crate::read::Mod0`].
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Mod0Header {
    /// Magic number (must be [`MOD0_MAGIC`])
    pub magic: U32,
    /// Offset to .dynamic section (relative to MOD0 base)
    pub dynamic_offset: I32,
    /// Offset to BSS start (relative to MOD0 base)
    pub bss_start_offset: I32,
    /// Offset to BSS end (relative to MOD0 base)
    pub bss_end_offset: I32,
    /// Offset to .eh_frame_hdr start (relative to MOD0 base)
    pub eh_frame_hdr_start: I32,
    /// Offset to .eh_frame_hdr end (relative to MOD0 base)
    pub eh_frame_hdr_end: I32,
    /// Offset to the runtime module object (relative to MOD0 base)
    pub module_object_offset: I32,
}

// Verify struct size - https://switchbrew.org/wiki/NRO#MOD
const_assert_eq!(size_of::<Mod0Header>(), 0x1c);
