//! Public id derivation tests.

use game_catalogue::ident::{derive_id, fnv1a_32};

fn is_public_id(id: &str) -> bool {
    id.len() == 6
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

// ---------------------------------------------------------------------------
// fnv1a_32
// ---------------------------------------------------------------------------

#[test]
fn fnv1a_32_of_empty_string_is_offset_basis() {
    assert_eq!(fnv1a_32(""), 0x811c_9dc5);
}

#[test]
fn fnv1a_32_matches_reference_values() {
    assert_eq!(fnv1a_32("a"), 0xe40c_292c);
    assert_eq!(fnv1a_32("10001"), 0x69f4_7faf);
}

// ---------------------------------------------------------------------------
// derive_id
// ---------------------------------------------------------------------------

#[test]
fn derive_id_pinned_values() {
    assert_eq!(derive_id("10001"), "tecsz3");
    assert_eq!(derive_id("228748"), "fe81b0");
    assert_eq!(derive_id(""), "ztntfp");
}

#[test]
fn derive_id_pads_short_encodings() {
    // Hash 0x02a35324 encodes to five base-36 digits.
    assert_eq!(derive_id("658"), "0qclr8");
}

#[test]
fn derive_id_keeps_last_six_of_long_encodings() {
    // Hash 0xb2a3ca9b encodes to "1dkdspn".
    assert_eq!(derive_id("PPSA01234"), "dkdspn");
}

#[test]
fn derive_id_is_deterministic() {
    for input in ["10001", "abc", "", "ünïcödé", "10000381"] {
        assert_eq!(derive_id(input), derive_id(input));
    }
}

#[test]
fn derive_id_always_six_lowercase_alphanumerics() {
    for n in 0..5000 {
        let id = derive_id(&n.to_string());
        assert!(is_public_id(&id), "bad id {:?} for {}", id, n);
    }
    assert!(is_public_id(&derive_id("Grand Theft Auto V")));
    assert!(is_public_id(&derive_id("ünïcödé")));
}
