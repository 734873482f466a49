//! SHA-512 hex digests

use sha2::{Digest, Sha512};

/// Lower-case hex encoding of `bytes`
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decode lower- or upper-case hex; `None` on odd length or a non-hex digit
pub fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

/// Lower-case hex SHA-512 of `input` (128 characters)
///
/// Deterministic across platforms; used both as the inverted-index key and
/// to name per-document files, so it must never change.
pub fn sha512_hex(input: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(input);
    to_hex(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha512_hex_known_vector() {
        assert_eq!(
            sha512_hex(b"abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(to_hex(&[0x00, 0xab, 0xff]), "00abff");
        assert_eq!(from_hex("00abFF"), Some(vec![0x00, 0xab, 0xff]));
        assert_eq!(from_hex("abc"), None);
        assert_eq!(from_hex("zz"), None);
        assert_eq!(from_hex(""), Some(vec![]));
    }

    #[test]
    fn test_sha512_hex_width_and_determinism() {
        let a = sha512_hex(b"document-1");
        assert_eq!(a.len(), 128);
        assert_eq!(a, sha512_hex(b"document-1"));
        assert_ne!(a, sha512_hex(b"document-2"));
    }
}
