//! Catalog-driven analysis and in-place patching of NRO images.
//!
//! Both entry points share one algorithm: walk the catalog in order and
//! search the text segment for each unit's original shapes. [`analyze`]
//! stops at a verdict; [`patch`] rewrites every match in place. Reports
//! carry machine-stable keys so front ends can phrase the outcome however
//! they like, plus the ordered trace log even on failure.

use std::{io, path::Path};

use hbp_object::read::Nro;

use crate::{
    catalog::{PatchUnit, catalog},
    context::PatchContext,
};

/// Verdict of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The buffer is not a parseable NRO image.
    Invalid,
    /// A legacy-ABI signature is present; the image needs patching.
    NeedsPatching,
    /// No signature matched and the image carries the patched marker.
    Patched,
    /// No signature matched; the image was built against a corrected
    /// toolchain, or carries no recognizable versioned metadata at all.
    NewAbi,
}

/// Result of [`analyze`].
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The verdict.
    pub classification: Classification,
    /// File name as supplied by the caller, surfaced for display only.
    pub file_name: String,
    /// Machine-stable message key for the front end.
    pub message_key: &'static str,
    /// Ordered trace lines from the run.
    pub log: Vec<String>,
}

/// Result of [`patch`]: the rewritten buffer or a failure, plus the trace
/// log either way.
#[derive(Debug)]
pub struct PatchOutcome {
    /// The rewritten image on success.
    pub result: Result<Vec<u8>, PatchError>,
    /// Identifiers of the units that rewrote at least one match.
    pub applied: Vec<&'static str>,
    /// Ordered trace lines from the run.
    pub log: Vec<String>,
}

impl PatchOutcome {
    /// Whether the run rewrote at least one match.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Failure modes of a patch run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Parsing succeeded but none of the known signatures matched. The
    /// image is valid; there was simply nothing the catalog recognizes.
    #[error("none of the known legacy-ABI signatures matched")]
    PatternNotFound,
    /// The run failed before scanning could complete (unparseable image,
    /// I/O error from a path helper).
    #[error("{message}")]
    Unknown {
        /// Underlying failure, interpolated for display.
        message: String,
    },
}

impl PatchError {
    /// Machine-stable error key for the front end.
    pub fn error_key(&self) -> &'static str {
        match self {
            PatchError::PatternNotFound => "error_pattern_not_found",
            PatchError::Unknown { .. } => "error_unknown",
        }
    }

    /// Interpolation parameters accompanying [`Self::error_key`].
    pub fn error_params(&self) -> Option<(&'static str, &str)> {
        match self {
            PatchError::PatternNotFound => None,
            PatchError::Unknown { message } => Some(("message", message)),
        }
    }
}

/// Analyze an NRO image without modifying it.
///
/// Classification policy, in order: unparseable buffers are `Invalid`; any
/// signature match means `NeedsPatching`; otherwise the MOD0 marker chain
/// decides between `Patched` (the "hbpA" marker is present) and `NewAbi`
/// (either a versioned LNY2 toolchain, or no recognizable metadata at all —
/// the message key tells the two apart).
pub fn analyze(bytes: &[u8], file_name: &str) -> Analysis {
    let nro = match Nro::parse(bytes.to_vec()) {
        Ok(nro) => nro,
        Err(_) => {
            return Analysis {
                classification: Classification::Invalid,
                file_name: file_name.to_owned(),
                message_key: "status_invalid_nro",
                log: Vec::new(),
            };
        }
    };

    let ctx = PatchContext::new();
    let needs_patching = catalog()
        .iter()
        .any(|unit| unit_matches(unit, nro.text()));

    let (classification, message_key) = if needs_patching {
        (Classification::NeedsPatching, "status_needs_patching")
    } else if nro.mod0().is_some_and(|mod0| mod0.is_patch_applied()) {
        (Classification::Patched, "status_already_patched")
    } else if nro.mod0().is_some_and(|mod0| mod0.has_versioned_abi()) {
        (Classification::NewAbi, "status_new_abi")
    } else {
        // No marker chain deep enough to fingerprint the toolchain.
        (Classification::NewAbi, "status_no_pattern")
    };

    Analysis {
        classification,
        file_name: file_name.to_owned(),
        message_key,
        log: ctx.into_log(),
    }
}

/// Patch an NRO image in place.
///
/// Walks the catalog in order, rewriting every matching shape. Succeeds
/// only if at least one unit applied; a valid image with no matches is the
/// distinct [`PatchError::PatternNotFound`] failure. Per-unit misses never
/// abort the remaining catalog.
pub fn patch(bytes: Vec<u8>) -> PatchOutcome {
    let mut ctx = PatchContext::new();

    let mut nro = match Nro::parse(bytes) {
        Ok(nro) => nro,
        Err(err) => {
            return PatchOutcome {
                result: Err(PatchError::Unknown {
                    message: err.to_string(),
                }),
                applied: Vec::new(),
                log: ctx.into_log(),
            };
        }
    };

    for unit in catalog() {
        if unit_matches(unit, nro.text()) {
            apply_unit(unit, &mut nro, &mut ctx);
        }
    }

    let applied: Vec<&'static str> = ctx.applied().collect();
    if applied.is_empty() {
        return PatchOutcome {
            result: Err(PatchError::PatternNotFound),
            applied,
            log: ctx.into_log(),
        };
    }

    PatchOutcome {
        result: Ok(nro.into_bytes()),
        applied,
        log: ctx.into_log(),
    }
}

/// Analyze the NRO file at `path`.
pub fn analyze_path(path: impl AsRef<Path>) -> io::Result<Analysis> {
    let path = path.as_ref();
    let bytes = fs_err::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(analyze(&bytes, &file_name))
}

/// Patch the NRO file at `path`, returning the outcome without writing
/// anything back to disk.
pub fn patch_path(path: impl AsRef<Path>) -> io::Result<PatchOutcome> {
    Ok(patch(fs_err::read(path)?))
}

/// Detection step shared by both modes: does any of the unit's original
/// shapes occur in the text segment?
fn unit_matches(unit: &PatchUnit, text: &[u8]) -> bool {
    unit.signatures
        .iter()
        .any(|sig| sig.original.find(text).is_some())
}

/// Rewrite every shape of `unit` that matches, independently. More than
/// one shape may be present in a single binary; each match is logged and
/// patched on its own.
fn apply_unit(unit: &PatchUnit, nro: &mut Nro, ctx: &mut PatchContext) -> bool {
    let mut any_applied = false;
    for sig in &unit.signatures {
        let text = nro.text_mut();
        if let Some(offset) = sig.original.find(text) {
            ctx.log(
                Some(unit.id),
                format!("found pattern {} at offset {offset:#010x}", sig.label),
            );
            sig.replacement.apply_at(text, offset);
            ctx.mark_applied(unit.id);
            any_applied = true;
        }
    }
    any_applied
}
