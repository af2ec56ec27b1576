//! Build NRO images with `NroBuilder` and parse them back with `read::Nro`.

use hbp_object::{
    raw::nro::NRO_MAGIC,
    read::{Nro, NroParseError},
    write::{MarkerChain, NroBuilder},
};

fn build(chain: Option<MarkerChain>) -> Vec<u8> {
    let mut builder = NroBuilder::new()
        .text(vec![0xaau8; 0x40])
        .rodata(vec![0xbbu8; 0x10])
        .data(vec![0xccu8; 0x10])
        .bss_size(0x2000)
        .module_id([0x5a; 0x20]);
    if let Some(chain) = chain {
        builder = builder.mod0(chain);
    }
    builder.build().unwrap()
}

#[test]
fn header_fields_round_trip() {
    let bytes = build(None);
    let nro = Nro::parse(bytes.clone()).unwrap();

    let header = nro.header();
    assert_eq!(header.magic.get(), NRO_MAGIC);
    assert_eq!(header.size.get() as usize, bytes.len());
    assert_eq!(header.bss_size.get(), 0x2000);
    assert_eq!(nro.module_id(), &[0x5a; 0x20]);

    assert_eq!(nro.text(), &[0xaau8; 0x40][..]);
    assert_eq!(nro.rodata(), &[0xbbu8; 0x10][..]);
    assert_eq!(nro.data(), &[0xccu8; 0x10][..]);
    assert_eq!(nro.as_bytes(), &bytes[..]);
}

#[test]
fn image_without_mod0_parses_with_no_metadata() {
    let nro = Nro::parse(build(None)).unwrap();
    assert!(nro.mod0().is_none());
}

#[test]
fn mod0_is_found_at_text_plus_four() {
    let nro = Nro::parse(build(Some(MarkerChain::None))).unwrap();
    let mod0 = nro.mod0().unwrap();
    assert_eq!(mod0.offset, 0x80 + 4);
    assert_eq!(mod0.lny0_offset, None);
    assert_eq!(mod0.lny1_offset, None);
    assert_eq!(mod0.lny2_offset, None);
    assert_eq!(mod0.hbp_applied_offset, None);
}

#[test]
fn marker_chain_short_circuits_in_order() {
    let nro = Nro::parse(build(Some(MarkerChain::Lny0))).unwrap();
    let mod0 = nro.mod0().unwrap();
    assert_eq!(mod0.lny0_offset, Some(0x1c));
    assert_eq!(mod0.lny1_offset, None);
    assert_eq!(mod0.lny2_offset, None);

    let nro = Nro::parse(build(Some(MarkerChain::Lny1))).unwrap();
    let mod0 = nro.mod0().unwrap();
    assert_eq!(mod0.lny0_offset, Some(0x1c));
    assert_eq!(mod0.lny1_offset, Some(0x28));
    assert_eq!(mod0.lny2_offset, None);

    let nro = Nro::parse(build(Some(MarkerChain::Lny2 { version: 3 }))).unwrap();
    let mod0 = nro.mod0().unwrap();
    assert_eq!(mod0.lny2_offset, Some(0x34));
    assert_eq!(mod0.lny2_version, Some(3));
    assert!(mod0.has_versioned_abi());
    assert!(!mod0.is_patch_applied());

    let nro = Nro::parse(build(Some(MarkerChain::Applied { version: 1 }))).unwrap();
    let mod0 = nro.mod0().unwrap();
    assert_eq!(mod0.hbp_applied_offset, Some(0x40));
    assert!(mod0.is_patch_applied());
}

#[test]
fn text_mut_aliases_the_underlying_buffer() {
    let mut nro = Nro::parse(build(None)).unwrap();
    nro.text_mut()[0] = 0x11;
    assert_eq!(nro.text()[0], 0x11);
    assert_eq!(nro.as_bytes()[0x80], 0x11);
    assert_eq!(nro.into_bytes()[0x80], 0x11);
}

#[test]
fn wrong_magic_is_rejected() {
    let mut bytes = build(None);
    bytes[0x10] = b'X';
    match Nro::parse(bytes) {
        Err(NroParseError::InvalidMagic { .. }) => {}
        other => panic!("expected InvalidMagic, got {other:?}"),
    }
}

#[test]
fn truncated_header_is_rejected() {
    match Nro::parse(vec![0u8; 0x40]) {
        Err(NroParseError::BufferTooSmall { required, .. }) => assert_eq!(required, 0x80),
        other => panic!("expected BufferTooSmall, got {other:?}"),
    }
}

#[test]
fn segment_past_the_buffer_is_rejected() {
    let mut bytes = build(None);
    // Inflate the text segment size (header offset 0x10 + 0x14).
    bytes[0x24..0x28].copy_from_slice(&u32::MAX.to_le_bytes());
    match Nro::parse(bytes) {
        Err(NroParseError::SegmentOutOfBounds { segment, .. }) => assert_eq!(segment, "text"),
        other => panic!("expected SegmentOutOfBounds, got {other:?}"),
    }
}
