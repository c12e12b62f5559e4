//! Short public identifiers derived from upstream concept ids.
//!
//! Ids are cached by API consumers, so the derivation must stay bit-for-bit
//! stable: 32-bit FNV-1a over the UTF-8 bytes, rendered in lowercase base-36,
//! zero-padded and cut to the last six characters.

const FNV1A32_OFFSET: u32 = 0x811c_9dc5;
const FNV1A32_PRIME: u32 = 16_777_619;
const ID_LEN: usize = 6;
const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 32-bit FNV-1a hash of `input`.
pub fn fnv1a_32(input: &str) -> u32 {
    let mut hash = FNV1A32_OFFSET;
    for byte in input.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV1A32_PRIME);
    }
    hash
}

fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    // Only ASCII digits were pushed.
    String::from_utf8(digits).unwrap_or_default()
}

/// Derive the six-character public id for a source identifier.
///
/// # Examples
///
/// ```
/// use game_catalogue::ident::derive_id;
///
/// assert_eq!(derive_id("10001"), "tecsz3");
/// ```
pub fn derive_id(source_id: &str) -> String {
    let encoded = format!("{:0>width$}", to_base36(fnv1a_32(source_id)), width = ID_LEN);
    encoded[encoded.len() - ID_LEN..].to_string()
}
