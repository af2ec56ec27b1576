//! Builder pattern for constructing NRO images.
//!
//! The builder follows a consistent pattern:
//!
//! 1. Create a new builder with `NroBuilder::new()`
//! 2. Configure it with chainable setter methods
//! 3. Call `.build()` to generate the final byte buffer
//!
//! # Example
//!
//! ```no_run
//! use hbp_object::write::{MarkerChain, NroBuilder};
//!
//! let nro = NroBuilder::new()
//!     .text(vec![0u8; 0x40])
//!     .rodata(vec![0u8; 0x10])
//!     .data(vec![0u8; 0x10])
//!     .mod0(MarkerChain::Lny2 { version: 1 })
//!     .build()
//!     .expect("failed to build NRO");
//! ```

pub mod nro;

pub use nro::{BuildError, MarkerChain, NroBuilder};
