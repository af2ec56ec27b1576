//! End-to-end analyze/patch runs over synthetic NRO images.

use hbp_object::write::{MarkerChain, NroBuilder};
use hbp_patch::{
    Classification, PatchError, Pattern, analyze, analyze_path, catalog::LEGACY_ABI_ID, catalog,
    patch,
};

/// threadTlsGet(): ldr x0, [x0, #0x108] between the TLS read and the ret.
const TLS_GET_LEGACY: &str = "61 D0 3B D5 20 CC 20 8B 00 84 40 F9 C0 03 5F D6";
/// The same shape after patching: ldr x0, [x0, #0x180].
const TLS_GET_CORRECTED: &str = "61 D0 3B D5 20 CC 20 8B 00 C0 40 F9 C0 03 5F D6";
/// threadTlsSet(): str x1, [x0, #0x108].
const TLS_SET_LEGACY: &str = "62 D0 3B D5 40 CC 20 8B 01 84 00 F9 C0 03 5F D6";

fn bytes_of(hex: &str) -> Vec<u8> {
    Pattern::parse(hex).unwrap().bytes().to_vec()
}

fn nro_with(chain: Option<MarkerChain>, code: &[u8]) -> Vec<u8> {
    let mut builder = NroBuilder::new()
        .text(code.to_vec())
        .rodata(vec![0u8; 0x10])
        .data(vec![0u8; 0x10]);
    if let Some(chain) = chain {
        builder = builder.mod0(chain);
    }
    builder.build().unwrap()
}

/// Filler that matches no catalog signature.
fn filler(len: usize) -> Vec<u8> {
    std::iter::repeat([0x1f, 0x20, 0x03, 0xd5]) // nop
        .flatten()
        .take(len)
        .collect()
}

#[test]
fn garbage_is_invalid_with_an_empty_log() {
    for bytes in [vec![0u8; 0x200], vec![0u8; 0x20], Vec::new()] {
        let analysis = analyze(&bytes, "garbage.nro");
        assert_eq!(analysis.classification, Classification::Invalid);
        assert_eq!(analysis.message_key, "status_invalid_nro");
        assert_eq!(analysis.file_name, "garbage.nro");
        assert!(analysis.log.is_empty());
    }
}

#[test]
fn legacy_signature_means_needs_patching() {
    let mut code = filler(0x20);
    code.extend(bytes_of(TLS_GET_LEGACY));
    let image = nro_with(Some(MarkerChain::Lny0), &code);

    let analysis = analyze(&image, "legacy.nro");
    assert_eq!(analysis.classification, Classification::NeedsPatching);
    assert_eq!(analysis.message_key, "status_needs_patching");
}

#[test]
fn patch_rewrites_the_offset_encoding_in_place() {
    let mut code = filler(0x20);
    code.extend(bytes_of(TLS_GET_LEGACY));
    code.extend(filler(0x10));
    let image = nro_with(Some(MarkerChain::Lny0), &code);

    let legacy = Pattern::parse(TLS_GET_LEGACY).unwrap();
    let corrected = Pattern::parse(TLS_GET_CORRECTED).unwrap();
    let site = legacy.find(&image).unwrap();

    let outcome = patch(image.clone());
    let patched = outcome.result.expect("patch should succeed");
    assert_eq!(outcome.applied, [LEGACY_ABI_ID]);
    assert!(
        outcome
            .log
            .iter()
            .any(|line| line.starts_with(LEGACY_ABI_ID) && line.contains("threadTlsGet()"))
    );

    // Only the offset-encoding bytes inside the matched window changed.
    assert_eq!(patched.len(), image.len());
    assert_eq!(corrected.find(&patched), Some(site));
    assert_eq!(patched[..site], image[..site]);
    assert_eq!(patched[site + 16..], image[site + 16..]);
}

#[test]
fn patching_is_idempotent() {
    let mut code = filler(0x10);
    code.extend(bytes_of(TLS_GET_LEGACY));
    let image = nro_with(Some(MarkerChain::Lny0), &code);

    let once = patch(image).result.expect("first pass should succeed");

    // The second pass sees only corrected signatures and applies nothing,
    // so the bytes stay exactly as after the first pass.
    let again = patch(once.clone());
    assert_eq!(again.result, Err(PatchError::PatternNotFound));
    assert!(again.applied.is_empty());
}

#[test]
fn multiple_shapes_patch_independently_in_one_run() {
    let mut code = bytes_of(TLS_GET_LEGACY);
    code.extend(filler(0x20));
    code.extend(bytes_of(TLS_SET_LEGACY));
    let image = nro_with(Some(MarkerChain::Lny0), &code);

    let outcome = patch(image);
    assert!(outcome.succeeded());
    assert_eq!(outcome.applied, ["pattern_legacy_abi"]);
    assert_eq!(outcome.log.len(), 2);
    assert!(outcome.log[0].contains("threadTlsGet()"));
    assert!(outcome.log[1].contains("threadTlsSet()"));
}

#[test]
fn wildcard_slots_survive_patching() {
    // The LibNX patch 2 shape carries wildcard instruction slots. Fill them
    // with sentinels and verify the replacement leaves them untouched.
    let libnx2 = catalog()[0]
        .signatures
        .iter()
        .find(|sig| sig.label == "threadEntry() LibNX patch 2")
        .unwrap();

    let mut shape = libnx2.original.bytes().to_vec();
    let wildcard_positions: Vec<usize> = libnx2
        .original
        .mask()
        .iter()
        .enumerate()
        .filter(|&(_, &mask)| mask == 0)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(wildcard_positions.len(), 16);
    for (sentinel, &pos) in (0x80u8..).zip(&wildcard_positions) {
        shape[pos] = sentinel;
    }

    let mut code = filler(0x10);
    code.extend(&shape);
    let image = nro_with(Some(MarkerChain::Lny0), &code);
    let site = libnx2.original.find(&image).unwrap();

    let patched = patch(image).result.expect("patch should succeed");
    for (sentinel, &pos) in (0x80u8..).zip(&wildcard_positions) {
        assert_eq!(patched[site + pos], sentinel);
    }
    assert_eq!(libnx2.replacement.find(&patched), Some(site));
}

#[test]
fn unmatched_but_valid_image_reports_pattern_not_found() {
    let image = nro_with(Some(MarkerChain::Lny0), &filler(0x40));
    let outcome = patch(image);
    match &outcome.result {
        Err(err @ PatchError::PatternNotFound) => {
            assert_eq!(err.error_key(), "error_pattern_not_found");
            assert_eq!(err.error_params(), None);
        }
        other => panic!("expected PatternNotFound, got {other:?}"),
    }
    assert!(outcome.log.is_empty());
}

#[test]
fn unparseable_image_reports_unknown_error() {
    let outcome = patch(vec![0u8; 0x40]);
    match &outcome.result {
        Err(err @ PatchError::Unknown { .. }) => {
            assert_eq!(err.error_key(), "error_unknown");
            let (key, message) = err.error_params().unwrap();
            assert_eq!(key, "message");
            assert!(!message.is_empty());
        }
        other => panic!("expected Unknown, got {other:?}"),
    }
}

#[test]
fn marker_chain_depth_classifies_unmatched_images() {
    let clean = filler(0x40);

    // Chain stops after LNY0: no versioned metadata to go on.
    let analysis = analyze(&nro_with(Some(MarkerChain::Lny0), &clean), "a.nro");
    assert_eq!(analysis.classification, Classification::NewAbi);
    assert_eq!(analysis.message_key, "status_no_pattern");

    // No MOD0 at all: same fallback.
    let analysis = analyze(&nro_with(None, &clean), "b.nro");
    assert_eq!(analysis.classification, Classification::NewAbi);
    assert_eq!(analysis.message_key, "status_no_pattern");

    // LNY2 present: built against a corrected toolchain.
    let analysis = analyze(
        &nro_with(Some(MarkerChain::Lny2 { version: 1 }), &clean),
        "c.nro",
    );
    assert_eq!(analysis.classification, Classification::NewAbi);
    assert_eq!(analysis.message_key, "status_new_abi");

    // Full chain with the patched marker.
    let analysis = analyze(
        &nro_with(Some(MarkerChain::Applied { version: 1 }), &clean),
        "d.nro",
    );
    assert_eq!(analysis.classification, Classification::Patched);
    assert_eq!(analysis.message_key, "status_already_patched");
}

#[test]
fn analyze_path_surfaces_the_file_name() {
    let mut code = filler(0x10);
    code.extend(bytes_of(TLS_GET_LEGACY));
    let image = nro_with(Some(MarkerChain::Lny0), &code);

    let path = std::env::temp_dir().join(format!("hbp-patch-{}.nro", std::process::id()));
    fs_err::write(&path, &image).unwrap();
    let analysis = analyze_path(&path).unwrap();
    fs_err::remove_file(&path).unwrap();

    assert_eq!(analysis.classification, Classification::NeedsPatching);
    assert!(analysis.file_name.starts_with("hbp-patch-"));
}
