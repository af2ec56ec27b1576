//! # hbp-patch
//! Signature-based detection and in-place patching of NRO homebrew images
//! that still address the legacy thread-vars block at TLS+0x108 instead of
//! the corrected TLS+0x180.
//!
//! This crate provides four layers:
//! - `pattern`: Hex-with-wildcards byte signatures and matching
//! - `catalog`: The fixed table of known legacy code shapes and replacements
//! - `context`: Per-run log and applied-unit bookkeeping
//! - `patcher`: The analyze/patch entry points consumed by front ends
//!
//! The core is pure: bytes in, classification or rewritten bytes plus an
//! ordered log out. All user-facing text stays outside this crate; reports
//! carry machine-stable message keys only.

pub mod catalog;
pub mod context;
pub mod pattern;
pub mod patcher;

pub use self::{
    catalog::{PatchUnit, SignaturePair, catalog},
    context::PatchContext,
    patcher::{
        Analysis, Classification, PatchError, PatchOutcome, analyze, analyze_path, patch,
        patch_path,
    },
    pattern::{Pattern, PatternError},
};
