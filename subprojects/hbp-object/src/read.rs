//! High-level parsing wrappers for the NRO container format.
//!
//! This module provides safe, validated parsing interfaces over the raw
//! binary structures. The parsers validate magic numbers, sizes, and segment
//! bounds, and expose convenient accessor methods.

mod mod0;
mod nro;

pub use self::{
    mod0::{Mod0, ParseError as Mod0ParseError},
    nro::{Nro, ParseError as NroParseError},
};
