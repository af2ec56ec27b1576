//! # hbp-object
//! Parsing and generation of the NRO homebrew executable container.
//!
//! This crate provides four layers:
//! - `cursor`: Sequential little-endian reader for variable-length records
//! - `raw`: Low-level binary structure definitions using `zerocopy`
//! - `read`: High-level parsing wrappers with error handling
//! - `write`: Builder pattern for constructing NRO images
//!
//! Supported structures:
//! - **NRO** (Nintendo Relocatable Object) - Homebrew executable format
//! - **MOD0** - Module header embedded in the text segment, including the
//!   homebrew extension marker chain (`LNY0`/`LNY1`/`LNY2`/`hbpA`)
//!
//! # References
//! - [switchbrew NRO](https://switchbrew.org/wiki/NRO)
//! - [libnx MOD0 extensions](https://github.com/switchbrew/libnx)

pub mod cursor;
pub mod raw;
pub mod read;
pub mod write;
