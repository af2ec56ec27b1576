//! The fixed table of known legacy-ABI code shapes and their replacements.
//!
//! One logical fix can surface as several byte shapes depending on the
//! compiler and optimization level that produced the binary, so the single
//! patch unit carries one (original, replacement, label) triple per shape.
//! Every pair rewrites the immediate that addresses the thread-vars block
//! at TLS+0x108 so it addresses TLS+0x180 instead. The second LibNX shape
//! also shifts the base register of a run of field stores, so its
//! replacement compensates every subsequent base-relative immediate by the
//! same -0x78 delta.

use std::sync::LazyLock;

use crate::pattern::Pattern;

/// One (original, replacement) signature shape plus a display label.
#[derive(Debug, Clone)]
pub struct SignaturePair {
    /// Signature of the legacy code shape.
    pub original: Pattern,
    /// Bytes to write over a match; wildcard positions are preserved.
    pub replacement: Pattern,
    /// Human-readable shape label for trace lines.
    pub label: &'static str,
}

/// One logical fix: a stable identifier and its alternate byte shapes.
#[derive(Debug, Clone)]
pub struct PatchUnit {
    /// Stable unit identifier, used for log attribution and reports.
    pub id: &'static str,
    /// Alternate shapes; more than one may match a single binary.
    pub signatures: Vec<SignaturePair>,
}

/// Stable identifier of the legacy thread-vars ABI unit.
pub const LEGACY_ABI_ID: &str = "pattern_legacy_abi";

const THREAD_TLS_GET_ORIG: &str = concat!(
    "61 D0 3B D5 ", // mrs  x1, tpidrro_el0
    "20 CC 20 8B ", // add  x0, x1, w0, sxtw #3
    "00 84 40 F9 ", // ldr  x0, [x0, #0x108]
    "C0 03 5F D6",  // ret
);
const THREAD_TLS_GET_PATCH: &str = concat!(
    "61 D0 3B D5 ", // mrs  x1, tpidrro_el0
    "20 CC 20 8B ", // add  x0, x1, w0, sxtw #3
    "00 C0 40 F9 ", // ldr  x0, [x0, #0x180]
    "C0 03 5F D6",  // ret
);

const THREAD_TLS_SET_ORIG: &str = concat!(
    "62 D0 3B D5 ", // mrs  x2, tpidrro_el0
    "40 CC 20 8B ", // add  x0, x2, w0, sxtw #3
    "01 84 00 F9 ", // str  x1, [x0, #0x108]
    "C0 03 5F D6",  // ret
);
const THREAD_TLS_SET_PATCH: &str = concat!(
    "62 D0 3B D5 ", // mrs  x2, tpidrro_el0
    "40 CC 20 8B ", // add  x0, x2, w0, sxtw #3
    "01 C0 00 F9 ", // str  x1, [x0, #0x180]
    "C0 03 5F D6",  // ret
);

// The threadEntry() shapes would need real disassembly to patch with full
// generality; matching the literal sequences each toolchain emits covers
// the binaries seen in practice.
const THREAD_ENTRY_ORIG_GCC15_O2: &str = concat!(
    "01 0C 40 F9 ", // ldr  x1, [x0, #24]
    "A1 FA 00 F9 ", // str  x1, [x21, #496]
    "01 00 00 90 ", // adrp x1, 0
    "A3 F6 00 F9 ", // str  x3, [x21, #488]
    "B5 22 04 91 ", // add  x21, x21, #0x108
    "21 00 40 F9",  // ldr  x1, [x1]
);
const THREAD_ENTRY_PATCH_GCC15_O2: &str = concat!(
    "01 0C 40 F9 ", // ldr  x1, [x0, #24]
    "A1 FA 00 F9 ", // str  x1, [x21, #496]
    "01 00 00 90 ", // adrp x1, 0
    "A3 F6 00 F9 ", // str  x3, [x21, #488]
    "B5 02 06 91 ", // add  x21, x21, #0x180
    "21 00 40 F9",  // ldr  x1, [x1]
);

const THREAD_ENTRY_ORIG_GCC14_O2: &str = concat!(
    "75 D0 3B D5 ", // mrs  x21, tpidrro_el0
    "64 8A 41 A9 ", // ldp  x4, x2, [x19, #24]
    "A1 82 07 91 ", // add  x1, x21, #0x1e0
    "A5 E6 01 B9 ", // str  w5, [x21, #484]
    "B5 22 04 91",  // add  x21, x21, #0x108
);
const THREAD_ENTRY_PATCH_GCC14_O2: &str = concat!(
    "75 D0 3B D5 ", // mrs  x21, tpidrro_el0
    "64 8A 41 A9 ", // ldp  x4, x2, [x19, #24]
    "A1 82 07 91 ", // add  x1, x21, #0x1e0
    "A5 E6 01 B9 ", // str  w5, [x21, #484]
    "B5 02 06 91",  // add  x21, x21, #0x180
);

// This shape has been stable since around GCC 9.
const THREAD_ENTRY_ORIG_GCC13: &str = concat!(
    "75 D0 3B D5 ", // mrs  x21, tpidrro_el0
    "A2 E2 01 B9 ", // str  w2, [x21, #480]
    "A5 E6 01 B9 ", // str  w5, [x21, #484]
    "A3 92 1E A9 ", // stp  x3, x4, [x21, #488]
    "B5 22 04 91",  // add  x21, x21, #0x108
);
const THREAD_ENTRY_PATCH_GCC13: &str = concat!(
    "75 D0 3B D5 ", // mrs  x21, tpidrro_el0
    "A2 E2 01 B9 ", // str  w2, [x21, #480]
    "A5 E6 01 B9 ", // str  w5, [x21, #484]
    "A3 92 1E A9 ", // stp  x3, x4, [x21, #488]
    "B5 02 06 91",  // add  x21, x21, #0x180
);

// Consistent at -O1 and below.
const THREAD_ENTRY_ORIG_GCC15_O1: &str = concat!(
    "60 02 40 F9 ", // ldr  x0, [x19]
    "B5 22 04 91 ", // add  x21, x21, #0x108
    "15 10 00 F9 ", // str  x21, [x0, #32]
    "60 02 40 F9 ", // ldr  x0, [x19]
    "81 22 00 91 ", // add  x1, x20, #0x8
    "01 18 00 F9 ", // str  x1, [x0, #48]
    "61 02 40 F9 ", // ldr  x1, [x19]
    "80 06 40 F9 ", // ldr  x0, [x20, #8]
    "20 14 00 F9",  // str  x0, [x1, #40]
);
const THREAD_ENTRY_PATCH_GCC15_O1: &str = concat!(
    "60 02 40 F9 ", // ldr  x0, [x19]
    "B5 02 06 91 ", // add  x21, x21, #0x180
    "15 10 00 F9 ", // str  x21, [x0, #32]
    "60 02 40 F9 ", // ldr  x0, [x19]
    "81 22 00 91 ", // add  x1, x20, #0x8
    "01 18 00 F9 ", // str  x1, [x0, #48]
    "61 02 40 F9 ", // ldr  x1, [x19]
    "80 06 40 F9 ", // ldr  x0, [x20, #8]
    "20 14 00 F9",  // str  x0, [x1, #40]
);

const THREAD_ENTRY_ORIG_LIBNX_1: &str = concat!(
    "84 E2 01 B9 ", // str  w4, [x20, #0x1e0]
    "64 0E 40 F9 ", // ldr  x4, [x19, #0x18]
    "83 F6 00 F9 ", // str  x3, [x20, #0x1e8]
    "63 00 40 B9 ", // ldr  w3, [x3]
    "42 40 00 D1 ", // sub  x2, x2, #0x10
    "84 0A 1F A9 ", // stp  x4, x2, [x20, #0x1f0]
    "94 22 04 91 ", // add  x20, x20, #0x108
    "83 DE 00 B9",  // str  w3, [x20, #0xdc]
);
const THREAD_ENTRY_PATCH_LIBNX_1: &str = concat!(
    "84 E2 01 B9 ", // str  w4, [x20, #0x1e0]
    "64 0E 40 F9 ", // ldr  x4, [x19, #0x18]
    "83 F6 00 F9 ", // str  x3, [x20, #0x1e8]
    "63 00 40 B9 ", // ldr  w3, [x3]
    "42 40 00 D1 ", // sub  x2, x2, #0x10
    "84 0A 1F A9 ", // stp  x4, x2, [x20, #0x1f0]
    "94 02 06 91 ", // add  x20, x20, #0x180
    "83 DE 00 B9",  // str  w3, [x20, #0xdc]
);

// Wildcard slots cover two build-dependent instructions; the stores after
// the base shift are all re-encoded with the -0x78 field delta.
const THREAD_ENTRY_ORIG_LIBNX_2: &str = concat!(
    "02 02 80 D2 ", // movz x2, #0x10
    "F3 53 01 A9 ", // stp  x19, x20, [sp, #0x10]
    "F3 03 00 AA ", // mov  x19, x0
    "74 D0 3B D5 ", // mrs  x20, tpidrro_el0
    "94 22 04 91 ", // add  x20, x20, #0x108
    "03 00 40 F9 ", // ldr  x3, [x0]
    "F5 13 00 F9 ", // str  x21, [sp, #0x20]
    "81 DA 00 B9 ", // str  w1, [x20, #0xd8]
    "01 0C 40 F9 ", // ldr  x1, [x0, #0x18]
    "83 72 00 F9 ", // str  x3, [x20, #0xe0]
    "81 76 00 F9 ", // str  x1, [x20, #0xe8]
    "?? ?? ?? ?? ",
    "?? ?? ?? ?? ",
    "21 00 40 F9 ", // ldr  x1, [x1]
    "3F 40 00 F1 ", // cmp  x1, #0x10
    "21 20 82 9A ", // csel x1, x1, x2, hs
    "02 10 40 F9 ", // ldr  x2, [x0, #0x20]
    "?? ?? ?? ?? ",
    "?? ?? ?? ?? ",
    "41 00 01 CB ", // sub  x1, x2, x1
    "81 7A 00 F9 ", // str  x1, [x20, #0xf0]
    "61 00 40 B9 ", // ldr  w1, [x3]
    "81 DE 00 B9",  // str  w1, [x20, #0xdc]
);
const THREAD_ENTRY_PATCH_LIBNX_2: &str = concat!(
    "02 02 80 D2 ", // movz x2, #0x10
    "F3 53 01 A9 ", // stp  x19, x20, [sp, #0x10]
    "F3 03 00 AA ", // mov  x19, x0
    "74 D0 3B D5 ", // mrs  x20, tpidrro_el0
    "94 02 06 91 ", // add  x20, x20, #0x180
    "03 00 40 F9 ", // ldr  x3, [x0]
    "F5 13 00 F9 ", // str  x21, [sp, #0x20]
    "81 62 00 B9 ", // str  w1, [x20, #0xd8-0x78]
    "01 0C 40 F9 ", // ldr  x1, [x0, #0x18]
    "83 36 00 F9 ", // str  x3, [x20, #0xe0-0x78]
    "81 3A 00 F9 ", // str  x1, [x20, #0xe8-0x78]
    "?? ?? ?? ?? ",
    "?? ?? ?? ?? ",
    "21 00 40 F9 ", // ldr  x1, [x1]
    "3F 40 00 F1 ", // cmp  x1, #0x10
    "21 20 82 9A ", // csel x1, x1, x2, hs
    "02 10 40 F9 ", // ldr  x2, [x0, #0x20]
    "?? ?? ?? ?? ",
    "?? ?? ?? ?? ",
    "41 00 01 CB ", // sub  x1, x2, x1
    "81 3E 00 F9 ", // str  x1, [x20, #0xf0-0x78]
    "61 00 40 B9 ", // ldr  w1, [x3]
    "81 66 00 B9",  // str  w1, [x20, #0xdc-0x78]
);

/// (original, replacement, label) rows of the legacy-ABI unit.
const LEGACY_ABI_TABLE: &[(&str, &str, &str)] = &[
    (THREAD_TLS_GET_ORIG, THREAD_TLS_GET_PATCH, "threadTlsGet()"),
    (THREAD_TLS_SET_ORIG, THREAD_TLS_SET_PATCH, "threadTlsSet()"),
    (
        THREAD_ENTRY_ORIG_GCC15_O2,
        THREAD_ENTRY_PATCH_GCC15_O2,
        "threadEntry() GCC 15 -O2",
    ),
    (
        THREAD_ENTRY_ORIG_GCC14_O2,
        THREAD_ENTRY_PATCH_GCC14_O2,
        "threadEntry() GCC 14 -O2",
    ),
    (
        THREAD_ENTRY_ORIG_GCC13,
        THREAD_ENTRY_PATCH_GCC13,
        "threadEntry() GCC 13 and below -O2",
    ),
    (
        THREAD_ENTRY_ORIG_GCC15_O1,
        THREAD_ENTRY_PATCH_GCC15_O1,
        "threadEntry() GCC 15 and below -O1",
    ),
    (
        THREAD_ENTRY_ORIG_LIBNX_1,
        THREAD_ENTRY_PATCH_LIBNX_1,
        "threadEntry() LibNX patch 1",
    ),
    (
        THREAD_ENTRY_ORIG_LIBNX_2,
        THREAD_ENTRY_PATCH_LIBNX_2,
        "threadEntry() LibNX patch 2",
    ),
];

static CATALOG: LazyLock<Vec<PatchUnit>> = LazyLock::new(|| {
    vec![PatchUnit {
        id: LEGACY_ABI_ID,
        signatures: LEGACY_ABI_TABLE
            .iter()
            .map(|&(original, replacement, label)| SignaturePair {
                original: compiled(original),
                replacement: compiled(replacement),
                label,
            })
            .collect(),
    }]
});

/// The ordered, immutable patch catalog.
///
/// Compiled once and safely shared across concurrent runs.
pub fn catalog() -> &'static [PatchUnit] {
    &CATALOG
}

fn compiled(text: &str) -> Pattern {
    Pattern::parse(text).expect("built-in signature tables are well-formed")
}
