//! Raw binary structure definitions for the NRO container format.
//!
//! This module contains zero-copy struct definitions using the `zerocopy` crate.
//! All structures are defined with `#[repr(C)]` and match the official format
//! specification on switchbrew.
//!
//! Use these types when you need direct access to binary fields without parsing
//! overhead. For higher-level parsing with error handling, see the `read` module.

pub mod mod0;
pub mod nro;
